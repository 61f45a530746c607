use crate::{
    accounts::AccountDirectory,
    config::CoordinatorConfig,
    holder::ResultHolder,
    queue::{BatchId, QueueEvent, QueuePolicy, TransactionQueue},
    shape::BatchShape,
    SignError,
};
use algosign_core::types::{
    Address, AuthorizationType, LedgerDetail, LedgerDevice, Signature, SignedTransaction,
    SignedTransactionData, TxIndex, UnsignedTransactionData,
};
use algosign_signers::{Keyring, LedgerOperationManager, LedgerSignRequest};
use futures_channel::{mpsc::UnboundedReceiver, oneshot};
use futures_util::{lock::Mutex as AsyncMutex, select_biased, FutureExt, StreamExt};
use parking_lot::Mutex;
use std::{
    collections::{HashMap, HashSet, VecDeque},
    time::Duration,
};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// The single terminal outcome of a signing batch
#[derive(Debug)]
pub enum SignResult<T> {
    /// Every transaction has a result
    Success(T),
    /// The batch failed as a whole
    Failure(SignError),
    /// The batch was cancelled by the caller
    Cancelled,
}

impl<T> SignResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, SignResult::Success(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SignResult::Cancelled)
    }

    /// Converts into a `Result`, reporting a cancellation as [`SignError::Cancelled`]
    pub fn into_result(self) -> Result<T, SignError> {
        match self {
            SignResult::Success(value) => Ok(value),
            SignResult::Failure(err) => Err(err),
            SignResult::Cancelled => Err(SignError::Cancelled),
        }
    }
}

/// Lifecycle of the batch last started on a coordinator. A terminal state can start a
/// new batch at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoordinatorState {
    Idle,
    AwaitingResults,
    Completed,
    Failed,
    Cancelled,
}

impl CoordinatorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Progress of a batch, for showing the Ledger approval prompt and the like
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorEvent {
    BatchStarted { batch: BatchId, transactions: usize },
    /// The device shows the transaction and waits for the user
    AwaitingLedgerApproval { batch: BatchId, index: TxIndex, device: LedgerDevice },
    TransactionSigned { batch: BatchId, index: TxIndex },
    BatchFinished { batch: BatchId, state: CoordinatorState },
}

#[derive(Debug)]
enum Route {
    /// Signed by another party, the slot stays empty
    Skip,
    Local { signer: Address, auth_address: Option<Address> },
    Ledger { detail: LedgerDetail, auth_address: Option<Address> },
}

#[derive(Debug)]
struct Session {
    state: CoordinatorState,
    batch: BatchId,
    cancel: Option<oneshot::Sender<()>>,
}

/// Signs batches of transactions with whichever signer each transaction needs.
///
/// Transactions of standard accounts are signed with the app's [`Keyring`] first. Those
/// of Ledger accounts then go through a [`TransactionQueue`], one at a time and in their
/// original order. A batch either succeeds with a result for every transaction, fails
/// with a single [`SignError`], or is cancelled.
///
/// One batch runs at a time: calling [`sign`](Self::sign) while a batch is waiting for
/// results fails with [`SignError::BatchInProgress`].
///
/// ```no_run
/// use algosign_coordinator::{AccountCache, FlatShape, SigningCoordinator};
/// use algosign_core::types::{Account, UnsignedTransactionData};
/// use algosign_signers::{ledger::mock::MockLedger, Keyring, LocalWallet};
///
/// # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
/// let wallet = LocalWallet::from_seed([1; 32]);
/// let address = wallet.address();
///
/// let accounts: AccountCache = vec![Account::standard(address, "main")].into_iter().collect();
/// let keyring: Keyring = vec![wallet].into_iter().collect();
/// let coordinator = SigningCoordinator::new(FlatShape, keyring, accounts, MockLedger::new());
///
/// let tx = UnsignedTransactionData::new(0, 0, vec![0x81]).signer(address);
/// let signed = coordinator.sign(vec![tx]).await.into_result()?;
/// assert_eq!(signed.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SigningCoordinator<S, L, A> {
    shape: S,
    keyring: Keyring,
    accounts: A,
    queue: TransactionQueue<L>,
    queue_events: AsyncMutex<UnboundedReceiver<QueueEvent>>,
    session: Mutex<Session>,
    events: broadcast::Sender<CoordinatorEvent>,
    config: CoordinatorConfig,
}

impl<S, L, A> SigningCoordinator<S, L, A>
where
    S: BatchShape,
    L: LedgerOperationManager + 'static,
    A: AccountDirectory,
{
    pub fn new(shape: S, keyring: Keyring, accounts: A, ledger: L) -> Self {
        Self::with_config(shape, keyring, accounts, ledger, CoordinatorConfig::default())
    }

    pub fn with_config(
        shape: S,
        keyring: Keyring,
        accounts: A,
        ledger: L,
        config: CoordinatorConfig,
    ) -> Self {
        let (queue, queue_events) = TransactionQueue::new(ledger);
        queue.set_policy(config.queue_policy);
        queue.set_timeout(config.ledger_timeout);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            shape,
            keyring,
            accounts,
            queue,
            queue_events: AsyncMutex::new(queue_events),
            session: Mutex::new(Session {
                state: CoordinatorState::Idle,
                batch: BatchId::default(),
                cancel: None,
            }),
            events,
            config,
        }
    }

    /// Sets how long the user has to answer each Ledger prompt
    #[must_use]
    pub fn ledger_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.queue.set_timeout(timeout);
        self.config.ledger_timeout = timeout;
        self
    }

    /// Sets what the queue does with pending Ledger requests after a failure.
    ///
    /// With [`QueuePolicy::Continue`] the next request of a failed batch may already be on
    /// the device by the time the batch is cancelled.
    #[must_use]
    pub fn queue_policy(mut self, policy: QueuePolicy) -> Self {
        self.queue.set_policy(policy);
        self.config.queue_policy = policy;
        self
    }

    /// Sets the capacity of the progress event channel. Existing subscribers are dropped.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.events = broadcast::channel(capacity.max(1)).0;
        self.config.event_capacity = capacity;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn shape(&self) -> &S {
        &self.shape
    }

    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    pub fn accounts(&self) -> &A {
        &self.accounts
    }

    pub fn queue(&self) -> &TransactionQueue<L> {
        &self.queue
    }

    pub fn state(&self) -> CoordinatorState {
        self.session.lock().state
    }

    /// Subscribes to progress events of the batches started from now on
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    /// Signs every transaction of `input` and writes the results back through the shape.
    ///
    /// Dropping the returned future before it completes cancels the batch.
    pub async fn sign(&self, mut input: S::Input) -> SignResult<S::Output> {
        if let Err(err) = self.shape.validate(&input) {
            return SignResult::Failure(err)
        }
        let transactions = self.shape.flatten(&input);
        if let Err(err) = validate(&transactions) {
            return SignResult::Failure(err)
        }

        let (batch, cancelled) = match self.begin(transactions.len()) {
            Ok(started) => started,
            Err(err) => return SignResult::Failure(err),
        };

        let mut guard = BatchGuard { coordinator: self, batch, armed: true };
        let outcome = self.run(batch, &mut input, transactions, cancelled).await;
        guard.armed = false;

        self.finish(batch, input, outcome)
    }

    /// Cancels the batch waiting for results, dismissing the Ledger prompt if one is
    /// shown. Before the first batch this moves an idle coordinator to
    /// [`CoordinatorState::Cancelled`]. Returns false if the last batch already finished.
    pub fn cancel(&self) -> bool {
        self.cancel_batch(None)
    }

    fn begin(&self, transactions: usize) -> Result<(BatchId, oneshot::Receiver<()>), SignError> {
        let mut session = self.session.lock();
        if session.state == CoordinatorState::AwaitingResults {
            return Err(SignError::BatchInProgress)
        }

        let batch = session.batch.next();
        let (cancel, cancelled) = oneshot::channel();
        *session = Session { state: CoordinatorState::AwaitingResults, batch, cancel: Some(cancel) };
        drop(session);

        debug!(%batch, transactions, "signing batch started");
        self.emit(CoordinatorEvent::BatchStarted { batch, transactions });
        Ok((batch, cancelled))
    }

    async fn run(
        &self,
        batch: BatchId,
        input: &mut S::Input,
        transactions: Vec<UnsignedTransactionData>,
        cancelled: oneshot::Receiver<()>,
    ) -> SignResult<Vec<SignedTransactionData>> {
        let mut holder = ResultHolder::new(transactions.iter().map(UnsignedTransactionData::index));

        let mut skipped = Vec::new();
        let mut local = Vec::new();
        let mut hardware = Vec::new();
        for tx in transactions {
            match self.route(&tx) {
                Ok(Route::Skip) => skipped.push(tx.index()),
                Ok(Route::Local { signer, auth_address }) => local.push((tx, signer, auth_address)),
                Ok(Route::Ledger { detail, auth_address }) => {
                    hardware.push((LedgerSignRequest::new(detail, tx), auth_address))
                }
                Err(err) => return SignResult::Failure(err),
            }
        }

        for index in skipped {
            if let Err(err) = self.fill(&mut holder, input, SignedTransactionData::skipped(index)) {
                return SignResult::Failure(err)
            }
        }

        // local keys sign before anything is shown on the device
        for (tx, signer, auth_address) in local {
            if !self.is_active(batch) {
                return SignResult::Cancelled
            }
            let signed = match self.keyring.sign(&signer, &tx).await {
                Ok(signature) => {
                    self.on_transaction_signed(batch, &mut holder, input, &tx, signature, auth_address)
                }
                Err(err) => Err(err.into()),
            };
            if let Err(err) = signed {
                return SignResult::Failure(err)
            }
        }

        if !hardware.is_empty() {
            let mut events = self.queue_events.lock().await;
            let mut awaiting: VecDeque<_> =
                hardware.iter().map(|(request, _)| (request.index(), request.device.clone())).collect();
            let mut pending: HashMap<_, _> = hardware
                .iter()
                .map(|(request, auth_address)| {
                    (request.index(), (request.transaction.clone(), *auth_address))
                })
                .collect();

            {
                // a cancel either lands before this check or clears the queue after it
                let session = self.session.lock();
                if session.batch != batch || session.state != CoordinatorState::AwaitingResults {
                    return SignResult::Cancelled
                }
                self.queue.enqueue(batch, hardware.into_iter().map(|(request, _)| request));
            }
            self.prompt(batch, awaiting.front());

            let mut cancelled = cancelled.fuse();
            while !holder.is_complete() {
                let event = select_biased! {
                    _ = cancelled => return SignResult::Cancelled,
                    event = events.next() => event,
                };
                let Some(QueueEvent { batch: event_batch, index, result }) = event else {
                    return SignResult::Cancelled
                };
                if event_batch != batch {
                    trace!(batch = %event_batch, %index, "dropping result of an earlier batch");
                    continue
                }
                let Some((tx, auth_address)) = pending.remove(&index) else {
                    trace!(%batch, %index, "dropping duplicate ledger result");
                    continue
                };
                awaiting.retain(|(awaited, _)| *awaited != index);

                let signature = match result {
                    Ok(signature) => signature,
                    Err(err) => {
                        warn!(%batch, %index, %err, "ledger signing failed");
                        self.queue.cancel();
                        return SignResult::Failure(SignError::from_ledger(index, err))
                    }
                };
                if let Err(err) =
                    self.on_transaction_signed(batch, &mut holder, input, &tx, signature, auth_address)
                {
                    return SignResult::Failure(err)
                }
                self.prompt(batch, awaiting.front());
            }
        }

        match holder.into_results() {
            Some(results) => SignResult::Success(results),
            None => SignResult::Failure(SignError::InvalidBatch(
                "batch finished with unsigned transactions".to_string(),
            )),
        }
    }

    fn finish(
        &self,
        batch: BatchId,
        input: S::Input,
        outcome: SignResult<Vec<SignedTransactionData>>,
    ) -> SignResult<S::Output> {
        let state = match &outcome {
            SignResult::Success(_) => CoordinatorState::Completed,
            SignResult::Failure(_) => CoordinatorState::Failed,
            SignResult::Cancelled => CoordinatorState::Cancelled,
        };

        {
            let mut session = self.session.lock();
            // cancelled in the meantime, which already emitted the terminal event
            if session.batch != batch || session.state != CoordinatorState::AwaitingResults {
                if session.batch == batch {
                    self.queue.cancel();
                }
                return SignResult::Cancelled
            }
            session.state = state;
            session.cancel = None;
        }

        if state != CoordinatorState::Completed {
            self.queue.cancel();
        }
        match &outcome {
            SignResult::Failure(err) => debug!(%batch, code = err.code(), %err, "signing batch failed"),
            _ => debug!(%batch, ?state, "signing batch finished"),
        }
        self.emit(CoordinatorEvent::BatchFinished { batch, state });

        match outcome {
            SignResult::Success(results) => SignResult::Success(self.shape.finish(input, results)),
            SignResult::Failure(err) => SignResult::Failure(err),
            SignResult::Cancelled => SignResult::Cancelled,
        }
    }

    // `None` cancels whichever batch is current
    fn cancel_batch(&self, batch: Option<BatchId>) -> bool {
        let mut session = self.session.lock();
        if batch.map_or(false, |batch| batch != session.batch) {
            return false
        }
        match session.state {
            CoordinatorState::Idle => {
                session.state = CoordinatorState::Cancelled;
                return true
            }
            CoordinatorState::AwaitingResults => {}
            _ => return false,
        }

        let batch = session.batch;
        session.state = CoordinatorState::Cancelled;
        let cancel = session.cancel.take();
        drop(session);

        if let Some(cancel) = cancel {
            cancel.send(()).ok();
        }
        self.queue.cancel();
        debug!(%batch, "signing batch cancelled");
        self.emit(CoordinatorEvent::BatchFinished { batch, state: CoordinatorState::Cancelled });
        true
    }

    fn is_active(&self, batch: BatchId) -> bool {
        let session = self.session.lock();
        session.batch == batch && session.state == CoordinatorState::AwaitingResults
    }

    fn route(&self, tx: &UnsignedTransactionData) -> Result<Route, SignError> {
        let Some(signer) = tx.signer else { return Ok(Route::Skip) };
        let account = self.accounts.account(&signer).ok_or(SignError::SignerUnavailable(signer))?;

        let route = match account.authorization {
            AuthorizationType::Standard => Route::Local { signer, auth_address: None },
            AuthorizationType::Ledger(detail) => Route::Ledger { detail, auth_address: None },
            // one level only, the auth account must be able to sign on its own
            AuthorizationType::Rekeyed { auth_address } => {
                match self.accounts.account(&auth_address).map(|auth| auth.authorization) {
                    Some(AuthorizationType::Standard) => {
                        Route::Local { signer: auth_address, auth_address: Some(auth_address) }
                    }
                    Some(AuthorizationType::Ledger(detail)) => {
                        Route::Ledger { detail, auth_address: Some(auth_address) }
                    }
                    _ => return Err(SignError::SignerUnavailable(auth_address)),
                }
            }
            AuthorizationType::Watch => return Err(SignError::SignerUnavailable(signer)),
        };
        trace!(index = %tx.index(), %signer, ?route, "routed transaction");
        Ok(route)
    }

    fn on_transaction_signed(
        &self,
        batch: BatchId,
        holder: &mut ResultHolder,
        input: &mut S::Input,
        tx: &UnsignedTransactionData,
        signature: Signature,
        auth_address: Option<Address>,
    ) -> Result<(), SignError> {
        let envelope = SignedTransaction::new(tx, signature).auth_address(auth_address).encode()?;
        self.fill(holder, input, SignedTransactionData::new(tx.index(), envelope))?;
        trace!(%batch, index = %tx.index(), remaining = holder.remaining(), "transaction signed");
        self.emit(CoordinatorEvent::TransactionSigned { batch, index: tx.index() });
        Ok(())
    }

    fn fill(
        &self,
        holder: &mut ResultHolder,
        input: &mut S::Input,
        signed: SignedTransactionData,
    ) -> Result<(), SignError> {
        let index = signed.index();
        if !holder.insert(signed.clone()) {
            return Err(SignError::InvalidBatch(format!("no open slot for transaction {index}")))
        }
        self.shape.insert(input, signed)
    }

    fn prompt(&self, batch: BatchId, next: Option<&(TxIndex, LedgerDevice)>) {
        if let Some((index, device)) = next {
            self.emit(CoordinatorEvent::AwaitingLedgerApproval {
                batch,
                index: *index,
                device: device.clone(),
            });
        }
    }

    fn emit(&self, event: CoordinatorEvent) {
        // no subscribers is fine
        self.events.send(event).ok();
    }
}

/// Cancels its batch when the `sign` future is dropped before the batch finished
struct BatchGuard<'a, S, L, A>
where
    S: BatchShape,
    L: LedgerOperationManager + 'static,
    A: AccountDirectory,
{
    coordinator: &'a SigningCoordinator<S, L, A>,
    batch: BatchId,
    armed: bool,
}

impl<'a, S, L, A> Drop for BatchGuard<'a, S, L, A>
where
    S: BatchShape,
    L: LedgerOperationManager + 'static,
    A: AccountDirectory,
{
    fn drop(&mut self) {
        if self.armed && self.coordinator.cancel_batch(Some(self.batch)) {
            debug!(batch = %self.batch, "sign future dropped, batch cancelled");
        }
    }
}

fn validate(transactions: &[UnsignedTransactionData]) -> Result<(), SignError> {
    if transactions.is_empty() {
        return Err(SignError::InvalidBatch("no transactions to sign".to_string()))
    }
    let mut seen = HashSet::with_capacity(transactions.len());
    for tx in transactions {
        if !seen.insert(tx.index()) {
            return Err(SignError::InvalidBatch(format!("duplicate transaction index {}", tx.index())))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccountCache, FlatShape};
    use algosign_core::types::Account;
    use algosign_signers::ledger::mock::MockLedger;

    fn coordinator() -> SigningCoordinator<FlatShape, MockLedger, AccountCache> {
        SigningCoordinator::new(FlatShape, Keyring::new(), AccountCache::new(), MockLedger::new())
    }

    #[test]
    fn rejects_empty_and_duplicate_batches() {
        assert!(matches!(validate(&[]), Err(SignError::InvalidBatch(_))));
        let tx = UnsignedTransactionData::new(0, 0, vec![1]);
        assert!(validate(&[tx.clone()]).is_ok());
        assert!(matches!(validate(&[tx.clone(), tx]), Err(SignError::InvalidBatch(_))));
    }

    #[test]
    fn routes_by_authorization() {
        let standard = Address::new([1; 32]);
        let ledger = Address::new([2; 32]);
        let rekeyed = Address::new([3; 32]);
        let watch = Address::new([4; 32]);
        let detail =
            LedgerDetail { device: LedgerDevice::new("Nano X", "AA:BB"), account_index: 7 };
        let accounts: AccountCache = vec![
            Account::standard(standard, "a"),
            Account::ledger(ledger, "b", detail.clone()),
            Account::rekeyed(rekeyed, "c", ledger),
            Account::watch(watch, "d"),
        ]
        .into_iter()
        .collect();
        let coordinator =
            SigningCoordinator::new(FlatShape, Keyring::new(), accounts, MockLedger::new());
        let tx = |signer: Address| UnsignedTransactionData::new(0, 0, vec![1]).signer(signer);

        assert!(matches!(coordinator.route(&UnsignedTransactionData::new(0, 0, vec![1])), Ok(Route::Skip)));
        assert!(matches!(
            coordinator.route(&tx(standard)),
            Ok(Route::Local { signer, auth_address: None }) if signer == standard
        ));
        assert!(matches!(
            coordinator.route(&tx(rekeyed)),
            Ok(Route::Ledger { detail: d, auth_address: Some(auth) }) if d == detail && auth == ledger
        ));
        assert!(matches!(
            coordinator.route(&tx(watch)),
            Err(SignError::SignerUnavailable(a)) if a == watch
        ));
        let unknown = Address::new([9; 32]);
        assert!(matches!(
            coordinator.route(&tx(unknown)),
            Err(SignError::SignerUnavailable(a)) if a == unknown
        ));
    }

    #[test]
    fn cancel_outside_a_batch() {
        let coordinator = coordinator();
        assert_eq!(coordinator.state(), CoordinatorState::Idle);
        assert!(coordinator.cancel());
        assert_eq!(coordinator.state(), CoordinatorState::Cancelled);
        assert!(!coordinator.cancel());
    }

    #[test]
    fn sign_result_conversions() {
        assert_eq!(SignResult::Success(1).into_result().unwrap(), 1);
        assert!(matches!(SignResult::<()>::Cancelled.into_result(), Err(SignError::Cancelled)));
        assert!(SignResult::<()>::Cancelled.is_cancelled());
        assert!(!SignResult::<()>::Failure(SignError::BatchInProgress).is_success());
    }
}
