use algosign_core::types::{SignedTransactionData, TxIndex};
use std::collections::BTreeMap;

/// One slot per transaction of a batch, filled as results come in
#[derive(Clone, Debug, Default)]
pub struct ResultHolder {
    slots: BTreeMap<TxIndex, Option<SignedTransactionData>>,
}

impl ResultHolder {
    /// Creates an empty slot for every index. Duplicates collapse into one slot.
    pub fn new(indices: impl IntoIterator<Item = TxIndex>) -> Self {
        Self { slots: indices.into_iter().map(|index| (index, None)).collect() }
    }

    /// Fills the slot of `signed`. Returns false if there is no such slot or it was
    /// already filled, in which case the holder is left untouched.
    pub fn insert(&mut self, signed: SignedTransactionData) -> bool {
        match self.slots.get_mut(&signed.index()) {
            Some(slot @ None) => {
                *slot = Some(signed);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots still waiting for a result
    pub fn remaining(&self) -> usize {
        self.slots.values().filter(|slot| slot.is_none()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.values().all(Option::is_some)
    }

    /// The results ordered by `(parent, transaction)`, once every slot is filled
    pub fn into_results(self) -> Option<Vec<SignedTransactionData>> {
        self.slots.into_values().collect()
    }
}
