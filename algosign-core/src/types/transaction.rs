use super::{Address, Bytes, Signature};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain separation prefix prepended to an encoded transaction before it is signed
pub const TX_PREFIX: &[u8] = b"TX";

/// Position of a transaction within a batch: the group it belongs to, and its place
/// inside that group. Orders by group first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxIndex {
    pub parent: usize,
    pub transaction: usize,
}

impl TxIndex {
    pub const fn new(parent: usize, transaction: usize) -> Self {
        Self { parent, transaction }
    }
}

impl fmt::Display for TxIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.parent, self.transaction)
    }
}

impl From<(usize, usize)> for TxIndex {
    fn from((parent, transaction): (usize, usize)) -> Self {
        Self { parent, transaction }
    }
}

/// A transaction waiting to be signed, as produced by a swap quote or a WalletConnect
/// request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransactionData {
    /// The group this transaction belongs to, e.g. which swap leg
    pub parent_list_index: usize,
    /// Position within the group
    pub transaction_list_index: usize,
    /// Account expected to sign. `None` when the transaction is signed by another party
    /// and only included for context, as in a WalletConnect atomic group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<Address>,
    /// The canonical encoded transaction
    pub payload: Bytes,
}

impl UnsignedTransactionData {
    pub fn new(
        parent_list_index: usize,
        transaction_list_index: usize,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self { parent_list_index, transaction_list_index, signer: None, payload: payload.into() }
    }

    /// Sets the account expected to sign this transaction
    #[must_use]
    pub fn signer(mut self, signer: Address) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn index(&self) -> TxIndex {
        TxIndex::new(self.parent_list_index, self.transaction_list_index)
    }

    /// The message an ed25519 key signs for this transaction: `"TX" || payload`
    pub fn bytes_to_sign(&self) -> Vec<u8> {
        let mut message = Vec::with_capacity(TX_PREFIX.len() + self.payload.len());
        message.extend_from_slice(TX_PREFIX);
        message.extend_from_slice(&self.payload);
        message
    }
}

/// The outcome of signing one [`UnsignedTransactionData`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransactionData {
    pub parent_list_index: usize,
    pub transaction_list_index: usize,
    /// Encoded [`SignedTransaction`], or `None` when this entry was deliberately not signed
    pub signed: Option<Bytes>,
}

impl SignedTransactionData {
    pub fn new(index: TxIndex, signed: impl Into<Bytes>) -> Self {
        Self {
            parent_list_index: index.parent,
            transaction_list_index: index.transaction,
            signed: Some(signed.into()),
        }
    }

    /// An entry the wallet declined to sign
    pub fn skipped(index: TxIndex) -> Self {
        Self {
            parent_list_index: index.parent,
            transaction_list_index: index.transaction,
            signed: None,
        }
    }

    pub fn index(&self) -> TxIndex {
        TxIndex::new(self.parent_list_index, self.transaction_list_index)
    }

    pub fn is_skipped(&self) -> bool {
        self.signed.is_none()
    }
}

/// A signed transaction envelope, ready to be submitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub sig: Signature,
    pub txn: Bytes,
    /// The authorizing account when it differs from the sender (rekeyed accounts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sgnr: Option<Address>,
}

impl SignedTransaction {
    pub fn new(transaction: &UnsignedTransactionData, sig: Signature) -> Self {
        Self { sig, txn: transaction.payload.clone(), sgnr: None }
    }

    /// Records the account which actually signed, for rekeyed senders
    #[must_use]
    pub fn auth_address(mut self, auth_address: Option<Address>) -> Self {
        self.sgnr = auth_address;
        self
    }

    pub fn encode(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Into::into)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
