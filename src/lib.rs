#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! # algosign
//!
//! Batch transaction signing for Algorand wallets.
//!
//! A wallet holds keys of its own and accounts living on Ledger devices paired over
//! Bluetooth LE. A single request, such as a WalletConnect call or a swap quote, may
//! need signatures from both. This crate collects the transactions of such a request,
//! routes each one to the right signer, feeds the Ledger ones to the device one at a
//! time and hands back the results in their original order, all or nothing.
//!
//! # Quickstart
//!
//! A prelude is provided which imports all the important things for you.
//!
//! ```no_run
//! use algosign::prelude::*;
//!
//! # async fn foo() -> Result<(), SignError> {
//! let wallet = LocalWallet::from_seed([1; 32]);
//! let address = wallet.address();
//!
//! let accounts: AccountCache = vec![Account::standard(address, "main")].into_iter().collect();
//! let keyring: Keyring = vec![wallet].into_iter().collect();
//! let coordinator = SigningCoordinator::new(FlatShape, keyring, accounts, MockLedger::new());
//!
//! let tx = UnsignedTransactionData::new(0, 0, vec![0x81, 0xa3]).signer(address);
//! let signed = coordinator.sign(vec![tx]).await.into_result()?;
//! # Ok(())
//! # }
//! ```

/// # Algorand types
///
/// Addresses, signatures, accounts and the transaction data exchanged with signers.
///
/// ```rust
/// use algosign::core::types::Address;
///
/// let zero: Address = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ".parse().unwrap();
/// assert_eq!(zero, Address::new([0; 32]));
/// ```
pub mod core {
    pub use algosign_core::*;
}

/// # Signers
///
/// Local ed25519 keys and Ledger devices.
pub mod signers {
    pub use algosign_signers::*;
}

/// # Signing coordinator
///
/// Routes the transactions of a batch to their signers and serializes Ledger requests.
pub mod coordinator {
    pub use algosign_coordinator::*;
}

/// Easy import of frequently used type definitions and traits
pub mod prelude {
    pub use algosign_coordinator::*;

    pub use algosign_signers::{ledger::mock::MockLedger, *};

    pub use algosign_core::types::*;
}
