//! A scripted [`LedgerOperationManager`] for tests and demos, which never touches a device.
use super::{
    types::{LedgerError, LedgerSignRequest},
    LedgerOperationManager,
};
use crate::LocalWallet;
use algosign_core::types::{Address, Signature, TxIndex};
use async_trait::async_trait;
use futures_channel::oneshot;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

/// How the mock device answers the next request
#[derive(Debug)]
pub enum MockLedgerResponse {
    /// The user approves, the device signs with the key of the requested account
    Approve,
    /// The user rejects on the device
    Reject,
    /// The link or the device fails
    Error(LedgerError),
    /// The answer is delivered later through a [`MockReply`]
    Held(oneshot::Receiver<Option<LedgerError>>),
}

/// Releases a [`MockLedgerResponse::Held`] answer
#[derive(Debug)]
pub struct MockReply {
    sender: oneshot::Sender<Option<LedgerError>>,
}

impl MockReply {
    /// Approves the held request. Returns false if nobody is waiting for the answer anymore.
    pub fn approve(self) -> bool {
        self.sender.send(None).is_ok()
    }

    /// Rejects the held request. Returns false if nobody is waiting for the answer anymore.
    pub fn reject(self) -> bool {
        self.fail(LedgerError::UserRejected)
    }

    /// Fails the held request with `err`
    pub fn fail(self, err: LedgerError) -> bool {
        self.sender.send(Some(err)).is_ok()
    }
}

#[derive(Clone, Debug, Default)]
/// Mock Ledger used in test environments.
///
/// Requests are recorded in the order the device received them. Responses are consumed
/// front to back; when none is scripted the request is approved.
pub struct MockLedger {
    requests: Arc<Mutex<Vec<LedgerSignRequest>>>,
    responses: Arc<Mutex<VecDeque<MockLedgerResponse>>>,
    cancellations: Arc<AtomicUsize>,
}

impl MockLedger {
    /// Instantiates a mock device
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes the answer for a future request
    pub fn push_response(&self, response: MockLedgerResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Scripts an answer which stays pending until the returned reply is used
    pub fn hold(&self) -> MockReply {
        let (sender, receiver) = oneshot::channel();
        self.push_response(MockLedgerResponse::Held(receiver));
        MockReply { sender }
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<LedgerSignRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Positions of the transactions received so far, in the order the device saw them
    pub fn request_indices(&self) -> Vec<TxIndex> {
        self.requests.lock().unwrap().iter().map(LedgerSignRequest::index).collect()
    }

    /// How many times the app asked the device to abort
    pub fn cancellations(&self) -> usize {
        self.cancellations.load(Ordering::SeqCst)
    }

    /// The key the mock device holds for `account_index`
    pub fn wallet_for(account_index: u32) -> LocalWallet {
        let mut seed = [0x4c; 32];
        seed[..4].copy_from_slice(&account_index.to_be_bytes());
        LocalWallet::from_seed(seed)
    }

    /// The address of the account at `account_index` on the mock device
    pub fn address_for(account_index: u32) -> Address {
        Self::wallet_for(account_index).address()
    }

    fn approve(request: &LedgerSignRequest) -> Signature {
        Self::wallet_for(request.account_index).sign_bytes(&request.transaction.bytes_to_sign())
    }
}

#[async_trait]
impl LedgerOperationManager for MockLedger {
    async fn sign(&self, request: LedgerSignRequest) -> Result<Signature, LedgerError> {
        self.requests.lock().unwrap().push(request.clone());
        let response =
            self.responses.lock().unwrap().pop_front().unwrap_or(MockLedgerResponse::Approve);

        match response {
            MockLedgerResponse::Approve => Ok(Self::approve(&request)),
            MockLedgerResponse::Reject => Err(LedgerError::UserRejected),
            MockLedgerResponse::Error(err) => Err(err),
            MockLedgerResponse::Held(receiver) => match receiver.await {
                Ok(None) => Ok(Self::approve(&request)),
                Ok(Some(err)) => Err(err),
                Err(_) => Err(LedgerError::Cancelled),
            },
        }
    }

    fn cancel(&self) {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use algosign_core::types::{LedgerDetail, LedgerDevice, UnsignedTransactionData};

    fn request(parent: usize, account_index: u32) -> LedgerSignRequest {
        LedgerSignRequest::new(
            LedgerDetail { device: LedgerDevice::new("Nano X", "AA:BB"), account_index },
            UnsignedTransactionData::new(parent, 0, vec![1, 2]),
        )
    }

    #[tokio::test]
    async fn approves_by_default() {
        let ledger = MockLedger::new();
        let req = request(0, 2);
        let signature = ledger.sign(req.clone()).await.unwrap();
        signature.verify(req.transaction.bytes_to_sign(), &MockLedger::address_for(2)).unwrap();
        assert_eq!(ledger.requests(), vec![req]);
    }

    #[tokio::test]
    async fn replays_scripted_responses() {
        let ledger = MockLedger::new();
        ledger.push_response(MockLedgerResponse::Reject);
        ledger.push_response(MockLedgerResponse::Error(LedgerError::Transport("gatt".into())));

        assert_eq!(ledger.sign(request(0, 0)).await.unwrap_err(), LedgerError::UserRejected);
        assert!(matches!(ledger.sign(request(1, 0)).await, Err(LedgerError::Transport(_))));
        assert!(ledger.sign(request(2, 0)).await.is_ok());
        assert_eq!(
            ledger.request_indices(),
            vec![TxIndex::new(0, 0), TxIndex::new(1, 0), TxIndex::new(2, 0)]
        );
    }

    #[tokio::test]
    async fn held_reply() {
        let ledger = MockLedger::new();
        let reply = ledger.hold();
        let pending = {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.sign(request(0, 0)).await })
        };
        tokio::task::yield_now().await;
        assert!(reply.reject());
        assert_eq!(pending.await.unwrap().unwrap_err(), LedgerError::UserRejected);
    }

    #[tokio::test]
    async fn dropped_reply_cancels() {
        let ledger = MockLedger::new();
        drop(ledger.hold());
        assert_eq!(ledger.sign(request(0, 0)).await.unwrap_err(), LedgerError::Cancelled);
        ledger.cancel();
        assert_eq!(ledger.cancellations(), 1);
    }
}
