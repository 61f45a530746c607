use data_encoding::BASE32_NOPAD;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512_256};
use std::{fmt, str::FromStr};
use thiserror::Error;

const PUBLIC_KEY_LENGTH: usize = 32;
const CHECKSUM_LENGTH: usize = 4;

/// An Algorand account address, i.e. the 32-byte ed25519 public key of the account.
///
/// The textual form is the 58 character base32 encoding of the key followed by the
/// last 4 bytes of its SHA-512/256 digest.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; PUBLIC_KEY_LENGTH]);

#[derive(Debug, Error)]
/// Error thrown when parsing an [`Address`] from its textual form
pub enum AddressError {
    /// Not a valid base32 string
    #[error(transparent)]
    Encoding(#[from] data_encoding::DecodeError),
    /// Decoded to the wrong number of bytes
    #[error("expected {} decoded bytes, got {0}", PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH)]
    InvalidLength(usize),
    /// The trailing checksum does not match the public key
    #[error("address checksum mismatch")]
    InvalidChecksum,
}

impl Address {
    pub const fn new(public_key: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(public_key)
    }

    /// Returns the raw public key
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    fn checksum(&self) -> [u8; CHECKSUM_LENGTH] {
        let digest = Sha512_256::digest(self.0);
        let mut checksum = [0; CHECKSUM_LENGTH];
        checksum.copy_from_slice(&digest[digest.len() - CHECKSUM_LENGTH..]);
        checksum
    }
}

impl From<[u8; PUBLIC_KEY_LENGTH]> for Address {
    fn from(public_key: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(public_key)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::with_capacity(PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH);
        buf.extend_from_slice(&self.0);
        buf.extend_from_slice(&self.checksum());
        f.write_str(&BASE32_NOPAD.encode(&buf))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let decoded = BASE32_NOPAD.decode(src.as_bytes())?;
        if decoded.len() != PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH {
            return Err(AddressError::InvalidLength(decoded.len()))
        }

        let mut public_key = [0; PUBLIC_KEY_LENGTH];
        public_key.copy_from_slice(&decoded[..PUBLIC_KEY_LENGTH]);
        let address = Address(public_key);
        if address.checksum()[..] != decoded[PUBLIC_KEY_LENGTH..] {
            return Err(AddressError::InvalidChecksum)
        }

        Ok(address)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}
