use super::{LocalWallet, WalletError};
use crate::Signer;
use algosign_core::types::{Address, Signature, UnsignedTransactionData};
use std::collections::HashMap;

/// The app's locally stored keys, indexed by address
#[derive(Debug, Default)]
pub struct Keyring {
    wallets: HashMap<Address, LocalWallet>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a key, replacing any previous key for the same address
    pub fn insert(&mut self, wallet: LocalWallet) -> Option<LocalWallet> {
        self.wallets.insert(wallet.address(), wallet)
    }

    pub fn remove(&mut self, address: &Address) -> Option<LocalWallet> {
        self.wallets.remove(address)
    }

    pub fn get(&self, address: &Address) -> Option<&LocalWallet> {
        self.wallets.get(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.wallets.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    /// Signs `tx` with the key stored for `address`
    pub async fn sign(
        &self,
        address: &Address,
        tx: &UnsignedTransactionData,
    ) -> Result<Signature, WalletError> {
        let wallet = self.get(address).ok_or(WalletError::MissingKey(*address))?;
        match wallet.sign_transaction(tx).await {
            Ok(signature) => Ok(signature),
            Err(never) => match never {},
        }
    }
}

impl FromIterator<LocalWallet> for Keyring {
    fn from_iter<I: IntoIterator<Item = LocalWallet>>(iter: I) -> Self {
        Self { wallets: iter.into_iter().map(|wallet| (wallet.address(), wallet)).collect() }
    }
}

impl Extend<LocalWallet> for Keyring {
    fn extend<I: IntoIterator<Item = LocalWallet>>(&mut self, iter: I) {
        self.wallets.extend(iter.into_iter().map(|wallet| (wallet.address(), wallet)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signs_with_stored_key() {
        let wallet = LocalWallet::from_seed([1; 32]);
        let address = wallet.address();
        let keyring: Keyring = std::iter::once(wallet).collect();

        let tx = UnsignedTransactionData::new(0, 0, vec![9]).signer(address);
        let signature = keyring.sign(&address, &tx).await.unwrap();
        signature.verify(tx.bytes_to_sign(), &address).unwrap();
    }

    #[tokio::test]
    async fn missing_key() {
        let keyring = Keyring::new();
        let address = Address::new([4; 32]);
        let tx = UnsignedTransactionData::new(0, 0, vec![9]);
        let err = keyring.sign(&address, &tx).await.unwrap_err();
        assert!(matches!(err, WalletError::MissingKey(a) if a == address));
    }

    #[test]
    fn insert_replaces_same_address() {
        let mut keyring = Keyring::new();
        assert!(keyring.insert(LocalWallet::from_seed([1; 32])).is_none());
        assert!(keyring.insert(LocalWallet::from_seed([1; 32])).is_some());
        assert_eq!(keyring.len(), 1);
        keyring.extend([LocalWallet::from_seed([2; 32])]);
        assert_eq!(keyring.len(), 2);
        assert!(keyring.contains(&LocalWallet::from_seed([2; 32]).address()));
    }
}
