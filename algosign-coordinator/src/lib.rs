#![cfg_attr(docsrs, feature(doc_cfg))]
//! # Algosign Coordinator
//!
//! Signs batches of Algorand transactions which may need several signers: keys stored
//! in the app, and Ledger devices connected over Bluetooth LE.
//!
//! A BLE Ledger handles a single request at a time and waits for the user to confirm
//! each transaction. The [`SigningCoordinator`] therefore signs local transactions first,
//! then feeds the hardware ones through a [`TransactionQueue`] one by one, and reports
//! the whole batch back as a single [`SignResult`].
//!
//! ## Batch shapes
//! - [`FlatShape`]: a list of transactions, e.g. a WalletConnect request
//! - [`SwapQuoteShape`]: the transaction groups of a swap quote, see [`SwapSigner`]
//!
//! ## Example
//!
//! ```no_run
//! use algosign_coordinator::{AccountCache, SignResult, SwapSigner, SwapQuoteShape};
//! use algosign_core::types::{
//!     Account, LedgerDetail, LedgerDevice, SwapQuoteTransaction, SwapTransactionPurpose,
//!     UnsignedTransactionData,
//! };
//! use algosign_signers::{ledger::mock::MockLedger, Keyring};
//!
//! # async fn foo() {
//! let device = LedgerDevice::new("Nano X 1A2B", "D4:F5:13:00:00:01");
//! let address = MockLedger::address_for(0);
//! let accounts: AccountCache = vec![Account::ledger(
//!     address,
//!     "ledger",
//!     LedgerDetail { device, account_index: 0 },
//! )]
//! .into_iter()
//! .collect();
//!
//! let signer: SwapSigner<_, _> =
//!     SwapSigner::new(SwapQuoteShape, Keyring::new(), accounts, MockLedger::new());
//! let quote = vec![SwapQuoteTransaction::new(
//!     SwapTransactionPurpose::Swap,
//!     vec![UnsignedTransactionData::new(0, 0, vec![0x81]).signer(address)],
//! )];
//!
//! match signer.sign_swap_quote_transactions(quote).await {
//!     SignResult::Success(groups) => assert!(groups[0].is_fully_signed()),
//!     SignResult::Failure(err) => eprintln!("signing failed: {}", err.code()),
//!     SignResult::Cancelled => {}
//! }
//! # }
//! ```

mod accounts;
pub use accounts::{AccountCache, AccountDirectory};

mod config;
pub use config::{CoordinatorConfig, DEFAULT_EVENT_CAPACITY, DEFAULT_LEDGER_TIMEOUT};

mod coordinator;
pub use coordinator::{CoordinatorEvent, CoordinatorState, SignResult, SigningCoordinator};

mod error;
pub use error::SignError;

mod holder;
pub use holder::ResultHolder;

pub mod queue;
pub use queue::{BatchId, QueueEvent, QueuePolicy, TransactionQueue};

mod shape;
pub use shape::{BatchShape, FlatShape};

mod swap;
pub use swap::{SwapQuoteShape, SwapSigner};
