#![cfg_attr(docsrs, feature(doc_cfg))]
//! Algorand account, transaction and signature types.
//!
//! This crate holds the data model which the signers and the signing coordinator
//! pass between each other:
//!
//! - [`Address`](types::Address), [`Bytes`](types::Bytes) and
//!   [`Signature`](types::Signature) primitives
//! - [`Account`](types::Account)s and how they are authorized to sign
//! - [`UnsignedTransactionData`](types::UnsignedTransactionData) going into a signing batch
//!   and [`SignedTransactionData`](types::SignedTransactionData) coming out of it
//! - [`SwapQuoteTransaction`](types::SwapQuoteTransaction) groups built from a swap quote
//!
//! ## Verifying a signed transaction
//!
//! ```rust
//! use algosign_core::types::{Address, SignedTransaction, UnsignedTransactionData};
//!
//! # fn foo(tx: UnsignedTransactionData, signed: &[u8], signer: Address) -> Result<(), Box<dyn std::error::Error>> {
//! let envelope = SignedTransaction::decode(signed)?;
//! envelope.sig.verify(tx.bytes_to_sign(), &signer)?;
//! # Ok(())
//! # }
//! ```
pub mod types;

// re-export rand to avoid potential confusion when there's rand version mismatches
pub use rand;
