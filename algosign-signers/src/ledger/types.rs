#![allow(clippy::upper_case_acronyms)]
//! Helpers for interacting with the Algorand Ledger App
//! [Official Docs](https://github.com/LedgerHQ/app-algorand/blob/develop/docs/APDUSPEC.md)
use algosign_core::types::{LedgerDetail, LedgerDevice, TxIndex, UnsignedTransactionData};
use std::{fmt, time::Duration};
use thiserror::Error;

/// A single transaction to be shown and signed on a Ledger device
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSignRequest {
    pub device: LedgerDevice,
    pub account_index: u32,
    pub transaction: UnsignedTransactionData,
}

impl LedgerSignRequest {
    pub fn new(detail: LedgerDetail, transaction: UnsignedTransactionData) -> Self {
        Self { device: detail.device, account_index: detail.account_index, transaction }
    }

    pub fn index(&self) -> TxIndex {
        self.transaction.index()
    }

    /// BIP-44 path of the signing key
    pub fn derivation_path(&self) -> String {
        format!("m/44'/283'/{}'/0/0", self.account_index)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error when using the Ledger transport
pub enum LedgerError {
    /// The user declined the transaction on the device
    #[error("the transaction was rejected on the device")]
    UserRejected,
    /// Underlying BLE transport error
    #[error("transport error: {0}")]
    Transport(String),
    /// The device answered with a status word other than success or rejection
    #[error("unexpected status word from device: {0:#06x}")]
    UnexpectedStatus(u16),
    /// Device response was unexpectedly none
    #[error("Received unexpected response from device. Expected data in response, found none.")]
    UnexpectedNullResponse,
    /// Got a response, but it didn't contain as much data as expected
    #[error("Cannot deserialize ledger response, insufficient bytes. Got {got} expected at least {at_least}")]
    ShortResponse { got: usize, at_least: usize },
    /// Payload is empty
    #[error("Payload must not be empty")]
    EmptyPayload,
    /// A single frame cannot carry more than [`CHUNK_SIZE`] data bytes
    #[error("APDU data of {0} bytes does not fit in one frame")]
    FrameTooLong(usize),
    /// No answer within the configured time
    #[error("the device did not answer within {0:?}")]
    Timeout(Duration),
    /// The operation was aborted from the app side
    #[error("the operation was cancelled")]
    Cancelled,
}

impl LedgerError {
    /// True when the user, not the device or the link, refused to sign
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, LedgerError::UserRejected)
    }
}

pub const CLA: u8 = 0x80;

/// Max data bytes per APDU frame
pub const CHUNK_SIZE: usize = 0xff;

pub const SW_OK: u16 = 0x9000;
/// "Conditions of use not satisfied", returned when the user rejects on the device
pub const SW_USER_REJECTED: u16 = 0x6985;

#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[allow(non_camel_case_types)]
pub enum INS {
    GET_PUBLIC_KEY = 0x03,
    SIGN_MSGPACK = 0x08,
}

impl fmt::Display for INS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            INS::GET_PUBLIC_KEY => write!(f, "GET_PUBLIC_KEY"),
            INS::SIGN_MSGPACK => write!(f, "SIGN_MSGPACK"),
        }
    }
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[allow(non_camel_case_types)]
pub enum P1 {
    FIRST = 0x00,
    /// First chunk, prefixed with the 4-byte account index
    FIRST_ACCOUNT_ID = 0x01,
    MORE = 0x80,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[allow(non_camel_case_types)]
pub enum P2 {
    LAST = 0x00,
    MORE = 0x80,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_derivation_path() {
        let request = LedgerSignRequest::new(
            LedgerDetail { device: LedgerDevice::new("Nano X", "AA:BB"), account_index: 3 },
            UnsignedTransactionData::new(0, 0, vec![1]),
        );
        assert_eq!(request.derivation_path(), "m/44'/283'/3'/0/0");
    }

    #[test]
    fn status_word_display() {
        assert_eq!(
            LedgerError::UnexpectedStatus(0x6e00).to_string(),
            "unexpected status word from device: 0x6e00"
        );
        assert!(LedgerError::UserRejected.is_user_rejection());
        assert!(!LedgerError::Timeout(Duration::from_secs(1)).is_user_rejection());
    }
}
