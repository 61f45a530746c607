//! FIFO of Ledger sign requests. The device handles one request at a time, so at most one
//! operation is ever in flight.
use algosign_core::types::{Signature, TxIndex};
use algosign_signers::{LedgerError, LedgerOperationManager, LedgerSignRequest};
use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use parking_lot::Mutex;
use serde::Deserialize;
use std::{collections::VecDeque, fmt, sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Identifies one signing batch. Stamped on every queued operation so that results of an
/// earlier batch can be told apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(pub u64);

impl BatchId {
    pub fn next(self) -> Self {
        BatchId(self.0 + 1)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happens to pending requests when a Ledger operation fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePolicy {
    /// Keep going with the next request
    #[default]
    Continue,
    /// Drop the pending requests of the failed batch
    HaltOnFailure,
}

/// The outcome of one Ledger operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueEvent {
    pub batch: BatchId,
    pub index: TxIndex,
    pub result: Result<Signature, LedgerError>,
}

/// Handed to a dispatched operation, and checked again when it completes. A ticket
/// issued before the last [`TransactionQueue::cancel`] no longer matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperationTicket {
    batch: BatchId,
    generation: u64,
    index: TxIndex,
}

impl OperationTicket {
    pub fn batch(&self) -> BatchId {
        self.batch
    }

    pub fn index(&self) -> TxIndex {
        self.index
    }
}

#[derive(Debug)]
struct QueueEntry {
    batch: BatchId,
    request: LedgerSignRequest,
}

#[derive(Debug)]
struct InFlight {
    ticket: OperationTicket,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<QueueEntry>,
    in_flight: Option<InFlight>,
    generation: u64,
    policy: QueuePolicy,
    timeout: Option<Duration>,
}

#[derive(Debug)]
struct QueueInner<L> {
    ledger: L,
    state: Mutex<QueueState>,
    events: UnboundedSender<QueueEvent>,
}

/// Submits Ledger sign requests one at a time, in the order they were enqueued.
///
/// Every finished operation is reported as a [`QueueEvent`] on the receiver returned by
/// [`TransactionQueue::new`]. Dispatch happens on spawned tokio tasks, so the queue must
/// be used from within a tokio runtime.
#[derive(Debug)]
pub struct TransactionQueue<L> {
    inner: Arc<QueueInner<L>>,
}

impl<L> Clone for TransactionQueue<L> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<L> TransactionQueue<L>
where
    L: LedgerOperationManager + 'static,
{
    pub fn new(ledger: L) -> (Self, UnboundedReceiver<QueueEvent>) {
        let (events, receiver) = unbounded();
        let inner = QueueInner { ledger, state: Mutex::new(QueueState::default()), events };
        (Self { inner: Arc::new(inner) }, receiver)
    }

    /// Sets the failure policy for requests dispatched from now on
    pub fn set_policy(&self, policy: QueuePolicy) {
        self.inner.state.lock().policy = policy;
    }

    /// Sets the time limit of every Ledger operation dispatched from now on
    pub fn set_timeout(&self, timeout: Option<Duration>) {
        self.inner.state.lock().timeout = timeout;
    }

    pub fn ledger(&self) -> &L {
        &self.inner.ledger
    }

    /// Appends the requests of `batch` in order. If the device is idle, the first one is
    /// dispatched right away.
    pub fn enqueue(&self, batch: BatchId, requests: impl IntoIterator<Item = LedgerSignRequest>) {
        let mut state = self.inner.state.lock();
        let before = state.pending.len();
        state.pending.extend(requests.into_iter().map(|request| QueueEntry { batch, request }));
        debug!(%batch, added = state.pending.len() - before, "enqueued ledger requests");
        self.dispatch_next(&mut state);
    }

    /// Records the result of the operation holding `ticket` and moves on to the next
    /// request. Results of operations which are no longer in flight are dropped.
    pub fn on_operation_complete(
        &self,
        ticket: OperationTicket,
        result: Result<Signature, LedgerError>,
    ) {
        let mut state = self.inner.state.lock();
        let current = state.in_flight.as_ref().map(|in_flight| in_flight.ticket);
        if ticket.generation != state.generation || current != Some(ticket) {
            trace!(batch = %ticket.batch, index = %ticket.index, "dropping stale ledger result");
            return
        }
        state.in_flight = None;

        if let Err(err) = &result {
            warn!(batch = %ticket.batch, index = %ticket.index, %err, "ledger operation failed");
            if state.policy == QueuePolicy::HaltOnFailure {
                let before = state.pending.len();
                state.pending.retain(|entry| entry.batch != ticket.batch);
                debug!(dropped = before - state.pending.len(), "halting batch after failure");
            }
        }

        let event = QueueEvent { batch: ticket.batch, index: ticket.index, result };
        if self.inner.events.unbounded_send(event).is_err() {
            trace!("queue event receiver dropped");
        }
        self.dispatch_next(&mut state);
    }

    /// Aborts the operation in flight, asks the device to dismiss its prompt and drops
    /// every pending request. A result still on its way is discarded.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        state.generation += 1;
        let dropped = state.pending.len();
        state.pending.clear();
        if let Some(in_flight) = state.in_flight.take() {
            in_flight.handle.abort();
            self.inner.ledger.cancel();
            debug!(index = %in_flight.ticket.index, dropped, "cancelled ledger operation");
        } else if dropped > 0 {
            debug!(dropped, "cleared ledger queue");
        }
    }

    /// Number of requests waiting behind the one in flight
    pub fn len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when nothing is in flight or pending
    pub fn is_idle(&self) -> bool {
        let state = self.inner.state.lock();
        state.in_flight.is_none() && state.pending.is_empty()
    }

    /// The transaction currently shown on the device
    pub fn in_flight(&self) -> Option<TxIndex> {
        self.inner.state.lock().in_flight.as_ref().map(|in_flight| in_flight.ticket.index)
    }

    // Must be called with the state locked. The spawned task reports back through
    // `on_operation_complete`, which blocks on the same lock until `in_flight` is set.
    fn dispatch_next(&self, state: &mut QueueState) {
        if state.in_flight.is_some() {
            return
        }
        let Some(QueueEntry { batch, request }) = state.pending.pop_front() else { return };

        let ticket = OperationTicket { batch, generation: state.generation, index: request.index() };
        let timeout = state.timeout;
        trace!(%batch, index = %ticket.index, device = %request.device.name, "dispatching to ledger");

        let queue = self.clone();
        let handle = tokio::spawn(async move {
            let operation = queue.inner.ledger.sign(request);
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, operation)
                    .await
                    .unwrap_or(Err(LedgerError::Timeout(limit))),
                None => operation.await,
            };
            queue.on_operation_complete(ticket, result);
        });
        state.in_flight = Some(InFlight { ticket, handle });
    }
}
