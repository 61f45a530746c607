mod address;
pub use address::{Address, AddressError};

mod bytes;
pub use self::bytes::{deserialize_bytes, serialize_bytes, Bytes};

mod signature;
pub use signature::{Signature, SignatureError, SIGNATURE_LENGTH};

mod account;
pub use account::{Account, AuthorizationType, LedgerDetail, LedgerDevice};

mod transaction;
pub use transaction::{
    SignedTransaction, SignedTransactionData, TxIndex, UnsignedTransactionData, TX_PREFIX,
};

mod swap;
pub use swap::{SwapQuoteError, SwapQuoteTransaction, SwapTransactionPurpose};
