use super::{Bytes, SignedTransactionData, UnsignedTransactionData};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a transaction group of a swap quote does
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapTransactionPurpose {
    /// Opts the account into the asset it is about to receive
    OptIn,
    Swap,
    /// Pays the swap fee
    Fee,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Error, PartialEq, Eq)]
/// Error thrown when a signed transaction does not fit the group it is inserted into
pub enum SwapQuoteError {
    #[error("transaction index {index} is out of bounds for a group of {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("signed transaction belongs to group {got}, not {expected}")]
    GroupMismatch { expected: usize, got: usize },
}

/// One transaction group of a swap quote, e.g. opt-in + swap + fee. Signing results
/// are written back into the group so it can be submitted in its original shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuoteTransaction {
    pub purpose: SwapTransactionPurpose,
    pub transactions: Vec<UnsignedTransactionData>,
    #[serde(default)]
    signed: Vec<Option<SignedTransactionData>>,
}

impl SwapQuoteTransaction {
    pub fn new(purpose: SwapTransactionPurpose, transactions: Vec<UnsignedTransactionData>) -> Self {
        Self { purpose, transactions, signed: Vec::new() }
    }

    /// The group index shared by all transactions of this group, `None` if it is empty
    pub fn parent_list_index(&self) -> Option<usize> {
        self.transactions.first().map(|tx| tx.parent_list_index)
    }

    /// Checks that every transaction belongs to this group and sits at its own position
    pub fn check(&self) -> Result<(), SwapQuoteError> {
        let Some(expected) = self.parent_list_index() else { return Ok(()) };
        let len = self.transactions.len();
        for tx in &self.transactions {
            if tx.parent_list_index != expected {
                return Err(SwapQuoteError::GroupMismatch { expected, got: tx.parent_list_index })
            }
            if tx.transaction_list_index >= len {
                return Err(SwapQuoteError::IndexOutOfBounds { index: tx.transaction_list_index, len })
            }
        }
        Ok(())
    }

    /// Inserts a signing result at its `transaction_list_index`
    pub fn insert_signed(&mut self, signed: SignedTransactionData) -> Result<(), SwapQuoteError> {
        let index = signed.transaction_list_index;
        let tx = self
            .transactions
            .get(index)
            .ok_or(SwapQuoteError::IndexOutOfBounds { index, len: self.transactions.len() })?;
        if tx.parent_list_index != signed.parent_list_index {
            return Err(SwapQuoteError::GroupMismatch {
                expected: tx.parent_list_index,
                got: signed.parent_list_index,
            })
        }

        if self.signed.len() < self.transactions.len() {
            self.signed.resize(self.transactions.len(), None);
        }
        self.signed[index] = Some(signed);
        Ok(())
    }

    /// Returns the result stored at `index`, if any
    pub fn signed(&self, index: usize) -> Option<&SignedTransactionData> {
        self.signed.get(index).and_then(Option::as_ref)
    }

    /// True once every transaction of the group has a result, including skipped ones
    pub fn is_fully_signed(&self) -> bool {
        self.signed.len() == self.transactions.len() && self.signed.iter().all(Option::is_some)
    }

    /// The signed blobs in group order, leaving out skipped entries
    pub fn signed_transactions(&self) -> Vec<Bytes> {
        self.signed.iter().flatten().filter_map(|signed| signed.signed.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TxIndex;

    fn group(parent: usize, len: usize) -> SwapQuoteTransaction {
        let transactions =
            (0..len).map(|i| UnsignedTransactionData::new(parent, i, vec![i as u8])).collect();
        SwapQuoteTransaction::new(SwapTransactionPurpose::Swap, transactions)
    }

    #[test]
    fn inserts_at_transaction_index() {
        let mut swap = group(1, 2);
        swap.insert_signed(SignedTransactionData::new(TxIndex::new(1, 1), vec![0xaa])).unwrap();
        assert!(!swap.is_fully_signed());
        assert!(swap.signed(0).is_none());

        swap.insert_signed(SignedTransactionData::skipped(TxIndex::new(1, 0))).unwrap();
        assert!(swap.is_fully_signed());
        assert_eq!(swap.signed_transactions(), vec![Bytes::from(vec![0xaa])]);
    }

    #[test]
    fn checks_group_consistency() {
        assert_eq!(group(2, 3).check(), Ok(()));
        assert_eq!(SwapQuoteTransaction::new(SwapTransactionPurpose::Fee, vec![]).check(), Ok(()));

        let mut mixed = group(0, 2);
        mixed.transactions[1].parent_list_index = 1;
        assert_eq!(mixed.check(), Err(SwapQuoteError::GroupMismatch { expected: 0, got: 1 }));

        let mut gap = group(0, 2);
        gap.transactions[1].transaction_list_index = 2;
        assert_eq!(gap.check(), Err(SwapQuoteError::IndexOutOfBounds { index: 2, len: 2 }));
    }

    #[test]
    fn rejects_foreign_results() {
        let mut swap = group(0, 1);
        assert_eq!(
            swap.insert_signed(SignedTransactionData::skipped(TxIndex::new(0, 3))),
            Err(SwapQuoteError::IndexOutOfBounds { index: 3, len: 1 })
        );
        assert_eq!(
            swap.insert_signed(SignedTransactionData::skipped(TxIndex::new(2, 0))),
            Err(SwapQuoteError::GroupMismatch { expected: 0, got: 2 })
        );
    }

    #[test]
    fn unknown_purposes_deserialize() {
        let purpose: SwapTransactionPurpose = serde_json::from_str("\"app_call\"").unwrap();
        assert_eq!(purpose, SwapTransactionPurpose::Unknown);
        let purpose: SwapTransactionPurpose = serde_json::from_str("\"opt_in\"").unwrap();
        assert_eq!(purpose, SwapTransactionPurpose::OptIn);
    }
}
