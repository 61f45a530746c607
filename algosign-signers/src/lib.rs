#![cfg_attr(docsrs, feature(doc_cfg))]
//! Provides a unified interface for signing Algorand transactions.
//!
//! Software keys implement the [`Signer`] trait directly. Hardware wallets are reached
//! through a [`LedgerOperationManager`], which performs exactly one request/response
//! exchange with the device per transaction.
//!
//! Supported signers:
//! - Private key ([`LocalWallet`], grouped by address in a [`Keyring`])
//! - Ledger over BLE ([`LedgerAlgorand`] on top of any [`LedgerTransport`])
//!
//! ```
//! use algosign_core::{rand::thread_rng, types::UnsignedTransactionData};
//! use algosign_signers::{LocalWallet, Signer};
//!
//! # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
//! // instantiate the wallet
//! let wallet = LocalWallet::new(&mut thread_rng());
//!
//! // a transaction built elsewhere
//! let tx = UnsignedTransactionData::new(0, 0, vec![0x81, 0xa3]).signer(wallet.address());
//!
//! // sign it
//! let signature = wallet.sign_transaction(&tx).await?;
//! signature.verify(tx.bytes_to_sign(), &wallet.address())?;
//! # Ok(())
//! # }
//! ```
mod wallet;
pub use wallet::{Keyring, LocalWallet, WalletError};

pub mod ledger;
pub use ledger::{
    app::{LedgerAlgorand, LedgerTransport},
    types::{LedgerError, LedgerSignRequest},
    LedgerOperationManager,
};

use algosign_core::types::{Address, Signature, UnsignedTransactionData};
use async_trait::async_trait;
use std::error::Error;

/// Trait for signing transactions
///
/// Implement this trait to support different signing modes, e.g. a keychain, hosted keys etc.
#[async_trait]
pub trait Signer: std::fmt::Debug + Send + Sync {
    type Error: Error + Send + Sync;

    /// Signs the `"TX"`-prefixed transaction bytes
    async fn sign_transaction(
        &self,
        tx: &UnsignedTransactionData,
    ) -> Result<Signature, Self::Error>;

    /// Returns the signer's address
    fn address(&self) -> Address;
}
