use algosign_core::types::{Address, TxIndex};
use algosign_signers::{LedgerError, WalletError};
use thiserror::Error;

#[derive(Error, Debug)]
/// Error thrown when a signing batch fails. A batch fails as a whole with exactly one
/// of these, there is no partial success.
pub enum SignError {
    /// A key stored in the app could not sign
    #[error(transparent)]
    LocalSigning(#[from] WalletError),
    /// The signer is not known to the app or cannot sign, e.g. a watch account
    #[error("no signer available for {0}")]
    SignerUnavailable(Address),
    /// The user declined a transaction on the Ledger
    #[error("transaction {index} was rejected on the device")]
    HardwareRejected { index: TxIndex },
    /// The Ledger or the BLE link failed, or the device timed out
    #[error("device error while signing transaction {index}: {source}")]
    HardwareDevice {
        index: TxIndex,
        #[source]
        source: LedgerError,
    },
    /// Reported by hosts which broadcast the batch after signing it
    #[error("network error: {0}")]
    Network(String),
    /// The signed envelope could not be encoded
    #[error(transparent)]
    Encoding(#[from] serde_json::Error),
    /// The batch itself is malformed: empty, duplicated indices, or a result which does
    /// not fit its group
    #[error("invalid batch: {0}")]
    InvalidBatch(String),
    /// Another batch is already waiting for results
    #[error("a signing batch is already in progress")]
    BatchInProgress,
    /// The batch was cancelled before it completed
    #[error("the signing batch was cancelled")]
    Cancelled,
}

impl SignError {
    /// Maps a failed Ledger operation of the transaction at `index`
    pub fn from_ledger(index: TxIndex, err: LedgerError) -> Self {
        if err.is_user_rejection() {
            SignError::HardwareRejected { index }
        } else {
            SignError::HardwareDevice { index, source: err }
        }
    }

    /// Stable reason code, suitable for analytics and for picking a localized message
    pub fn code(&self) -> &'static str {
        match self {
            SignError::LocalSigning(_) | SignError::SignerUnavailable(_) => "local-signing-error",
            SignError::HardwareRejected { .. } => "user-rejected",
            SignError::HardwareDevice { .. } => "device-error",
            SignError::Network(_) => "network-error",
            SignError::Encoding(_) => "encoding-error",
            SignError::InvalidBatch(_) => "invalid-batch",
            SignError::BatchInProgress => "batch-in-progress",
            SignError::Cancelled => "cancelled",
        }
    }

    /// True when the user refused to sign, as opposed to something going wrong
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, SignError::HardwareRejected { .. })
    }
}
