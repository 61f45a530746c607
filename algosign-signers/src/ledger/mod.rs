pub mod app;
pub mod mock;
pub mod types;

use algosign_core::types::Signature;
use app::{LedgerAlgorand, LedgerTransport};
use async_trait::async_trait;
use auto_impl::auto_impl;
use types::{LedgerError, LedgerSignRequest};

/// A BLE connection to a Ledger device which can run one signing operation at a time.
///
/// The device shows the transaction and waits for the user to approve or reject it, so
/// `sign` can stay pending for as long as the user takes to decide.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait LedgerOperationManager: std::fmt::Debug + Send + Sync {
    /// Asks the device to sign a single transaction
    async fn sign(&self, request: LedgerSignRequest) -> Result<Signature, LedgerError>;

    /// Aborts the operation currently shown on the device, if any
    fn cancel(&self);
}

#[async_trait]
impl<T: LedgerTransport> LedgerOperationManager for LedgerAlgorand<T> {
    async fn sign(&self, request: LedgerSignRequest) -> Result<Signature, LedgerError> {
        self.sign_tx(&request).await
    }

    fn cancel(&self) {
        self.abort()
    }
}
