use super::{deserialize_bytes, serialize_bytes, Address, Bytes};
use ed25519_dalek::{Verifier, VerifyingKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Length in bytes of an ed25519 signature
pub const SIGNATURE_LENGTH: usize = 64;

/// An ed25519 signature over a transaction's `"TX"`-prefixed bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

#[derive(Debug, Error)]
/// An error involving a signature.
pub enum SignatureError {
    /// Invalid length, ed25519 signatures are 64 bytes
    #[error("invalid signature length, got {0}, expected 64")]
    InvalidLength(usize),
    /// The address is not a valid ed25519 point, or the signature does not match
    #[error(transparent)]
    Ed25519Error(#[from] ed25519_dalek::SignatureError),
}

impl Signature {
    pub const fn new(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Builds a signature from a device or API response
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        let bytes: [u8; SIGNATURE_LENGTH] =
            bytes.try_into().map_err(|_| SignatureError::InvalidLength(bytes.len()))?;
        Ok(Self(bytes))
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0
    }

    /// Verifies that `message` was signed by the key behind `address`
    pub fn verify<M: AsRef<[u8]>>(
        &self,
        message: M,
        address: &Address,
    ) -> Result<(), SignatureError> {
        let key = VerifyingKey::from_bytes(address.as_bytes())?;
        let signature = ed25519_dalek::Signature::from_bytes(&self.0);
        key.verify(message.as_ref(), &signature)?;
        Ok(())
    }
}

impl From<ed25519_dalek::Signature> for Signature {
    fn from(src: ed25519_dalek::Signature) -> Self {
        Self(src.to_bytes())
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", Bytes::from(self.0))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_bytes(self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = deserialize_bytes(deserializer)?;
        Signature::from_slice(&bytes).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    #[test]
    fn verifies_against_address() {
        let key = SigningKey::from_bytes(&[3; 32]);
        let address = Address::new(key.verifying_key().to_bytes());
        let signature = Signature::from(key.sign(b"TXhello"));

        signature.verify(b"TXhello", &address).unwrap();
        assert!(signature.verify(b"TXother", &address).is_err());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(Signature::from_slice(&[0; 63]), Err(SignatureError::InvalidLength(63))));
    }

    #[test]
    fn serde_roundtrip() {
        let signature = Signature::new([9; SIGNATURE_LENGTH]);
        let json = serde_json::to_string(&signature).unwrap();
        assert_eq!(serde_json::from_str::<Signature>(&json).unwrap(), signature);
    }
}
