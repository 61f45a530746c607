use crate::SignError;
use algosign_core::types::{SignedTransactionData, UnsignedTransactionData};
use std::fmt::Debug;

/// Describes how a caller's request maps to a flat list of transactions, and how the
/// signed results map back.
///
/// The [`SigningCoordinator`](crate::SigningCoordinator) is generic over its shape, so one
/// coordinator implementation serves plain transaction lists as well as structured
/// requests such as swap quotes.
pub trait BatchShape: Debug + Send + Sync {
    /// What the caller asks to sign
    type Input: Send;
    /// What the caller gets back on success
    type Output: Send;

    /// Checks the request before anything is signed. Results of a request which passes
    /// must always fit back in through [`insert`](Self::insert).
    fn validate(&self, _input: &Self::Input) -> Result<(), SignError> {
        Ok(())
    }

    /// Every transaction of the batch, in the order they are routed to signers
    fn flatten(&self, input: &Self::Input) -> Vec<UnsignedTransactionData>;

    /// Writes one result back into the caller's request
    fn insert(
        &self,
        input: &mut Self::Input,
        signed: SignedTransactionData,
    ) -> Result<(), SignError>;

    /// Builds the output once every transaction has a result. `results` is ordered by
    /// `(parent, transaction)`.
    fn finish(&self, input: Self::Input, results: Vec<SignedTransactionData>) -> Self::Output;
}

/// A plain list of transactions, as received from a WalletConnect request.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatShape;

impl BatchShape for FlatShape {
    type Input = Vec<UnsignedTransactionData>;
    type Output = Vec<SignedTransactionData>;

    fn flatten(&self, input: &Self::Input) -> Vec<UnsignedTransactionData> {
        input.clone()
    }

    fn insert(&self, _: &mut Self::Input, _: SignedTransactionData) -> Result<(), SignError> {
        Ok(())
    }

    fn finish(&self, _: Self::Input, results: Vec<SignedTransactionData>) -> Self::Output {
        results
    }
}
