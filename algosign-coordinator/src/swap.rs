use crate::{AccountDirectory, BatchShape, SignError, SignResult, SigningCoordinator};
use algosign_core::types::{SignedTransactionData, SwapQuoteTransaction, UnsignedTransactionData};
use algosign_signers::LedgerOperationManager;
use std::collections::HashSet;

/// The transaction groups of a swap quote. Results are inserted into the group they belong
/// to, and the groups are handed back in their original shape.
#[derive(Clone, Copy, Debug, Default)]
pub struct SwapQuoteShape;

impl BatchShape for SwapQuoteShape {
    type Input = Vec<SwapQuoteTransaction>;
    type Output = Vec<SwapQuoteTransaction>;

    fn validate(&self, input: &Self::Input) -> Result<(), SignError> {
        let mut parents = HashSet::with_capacity(input.len());
        for group in input {
            group.check().map_err(|err| SignError::InvalidBatch(err.to_string()))?;
            if let Some(parent) = group.parent_list_index() {
                if !parents.insert(parent) {
                    return Err(SignError::InvalidBatch(format!(
                        "transaction group {parent} appears more than once"
                    )))
                }
            }
        }
        Ok(())
    }

    fn flatten(&self, input: &Self::Input) -> Vec<UnsignedTransactionData> {
        input.iter().flat_map(|group| group.transactions.iter().cloned()).collect()
    }

    fn insert(
        &self,
        input: &mut Self::Input,
        signed: SignedTransactionData,
    ) -> Result<(), SignError> {
        let parent = signed.parent_list_index;
        let group = input
            .iter_mut()
            .find(|group| group.parent_list_index() == Some(parent))
            .ok_or_else(|| SignError::InvalidBatch(format!("no transaction group {parent}")))?;
        group.insert_signed(signed).map_err(|err| SignError::InvalidBatch(err.to_string()))
    }

    fn finish(&self, input: Self::Input, _: Vec<SignedTransactionData>) -> Self::Output {
        input
    }
}

/// A [`SigningCoordinator`] for swap quotes
pub type SwapSigner<L, A> = SigningCoordinator<SwapQuoteShape, L, A>;

impl<L, A> SigningCoordinator<SwapQuoteShape, L, A>
where
    L: LedgerOperationManager + 'static,
    A: AccountDirectory,
{
    /// Signs every group of a swap quote. On success every group is fully signed.
    pub async fn sign_swap_quote_transactions(
        &self,
        transactions: Vec<SwapQuoteTransaction>,
    ) -> SignResult<Vec<SwapQuoteTransaction>> {
        self.sign(transactions).await
    }
}
