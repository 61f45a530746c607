mod keyring;
pub use keyring::Keyring;

use crate::Signer;
use algosign_core::{
    rand::{CryptoRng, RngCore},
    types::{Address, Signature, UnsignedTransactionData},
};
use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey, SECRET_KEY_LENGTH};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug)]
/// Error thrown by the Wallet module
pub enum WalletError {
    /// Error propagated from the hex crate.
    #[error(transparent)]
    HexError(#[from] hex::FromHexError),
    /// The secret key was not 32 bytes long
    #[error("invalid secret key length, got {0}, expected 32")]
    InvalidKeyLength(usize),
    /// No local key is stored for the account
    #[error("no private key stored for {0}")]
    MissingKey(Address),
}

/// An ed25519 keypair held in the app, used to sign transactions of standard accounts.
///
/// ```
/// use algosign_core::rand::thread_rng;
/// use algosign_signers::LocalWallet;
///
/// let wallet = LocalWallet::new(&mut thread_rng());
/// let signature = wallet.sign_bytes(b"TXpayload");
/// assert!(signature.verify(b"TXpayload", &wallet.address()).is_ok());
/// ```
pub struct LocalWallet {
    /// The wallet's private key
    pub(crate) signer: SigningKey,
    /// The wallet's address
    pub(crate) address: Address,
}

impl LocalWallet {
    /// Creates a new random keypair seeded with the provided RNG
    pub fn new<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        SigningKey::generate(rng).into()
    }

    /// Instantiates a wallet from a 32-byte secret seed
    pub fn from_seed(seed: [u8; SECRET_KEY_LENGTH]) -> Self {
        SigningKey::from_bytes(&seed).into()
    }

    /// Instantiates a wallet from a slice holding a 32-byte secret seed
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let seed: [u8; SECRET_KEY_LENGTH] =
            bytes.try_into().map_err(|_| WalletError::InvalidKeyLength(bytes.len()))?;
        Ok(Self::from_seed(seed))
    }

    /// Signs raw bytes. Transactions must already carry the `"TX"` prefix.
    pub fn sign_bytes(&self, message: &[u8]) -> Signature {
        self.signer.sign(message).into()
    }

    /// Returns the wallet's address
    pub fn address(&self) -> Address {
        self.address
    }
}

impl From<SigningKey> for LocalWallet {
    fn from(signer: SigningKey) -> Self {
        let address = Address::new(signer.verifying_key().to_bytes());
        Self { signer, address }
    }
}

impl FromStr for LocalWallet {
    type Err = WalletError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let src = src.strip_prefix("0x").unwrap_or(src);
        let bytes = hex::decode(src)?;
        Self::from_bytes(&bytes)
    }
}

#[async_trait]
impl Signer for LocalWallet {
    type Error = std::convert::Infallible;

    async fn sign_transaction(
        &self,
        tx: &UnsignedTransactionData,
    ) -> Result<Signature, Self::Error> {
        Ok(self.sign_bytes(&tx.bytes_to_sign()))
    }

    fn address(&self) -> Address {
        self.address
    }
}

// do not log the secret key
impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet").field("address", &self.address).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    #[test]
    fn parses_hex_seed() {
        let wallet: LocalWallet = SEED.parse().unwrap();
        let prefixed: LocalWallet = format!("0x{SEED}").parse().unwrap();
        assert_eq!(wallet.address(), prefixed.address());
        // RFC 8032 test vector 1
        assert_eq!(
            hex::encode(wallet.address().as_bytes()),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
    }

    #[test]
    fn rejects_short_seed() {
        assert!(matches!("abcd".parse::<LocalWallet>(), Err(WalletError::InvalidKeyLength(2))));
        assert!(matches!("zz".parse::<LocalWallet>(), Err(WalletError::HexError(_))));
    }

    #[test]
    fn debug_hides_key() {
        let wallet: LocalWallet = SEED.parse().unwrap();
        let debug = format!("{wallet:?}");
        assert!(debug.contains("address"));
        assert!(!debug.contains(SEED));
    }

    #[tokio::test]
    async fn signs_prefixed_transaction() {
        let wallet = LocalWallet::from_seed([5; 32]);
        let tx = UnsignedTransactionData::new(0, 0, vec![1, 2, 3]).signer(wallet.address());
        let signature = wallet.sign_transaction(&tx).await.unwrap();
        signature.verify(b"TX\x01\x02\x03", &wallet.address()).unwrap();
        assert!(signature.verify([1, 2, 3], &wallet.address()).is_err());
    }
}
