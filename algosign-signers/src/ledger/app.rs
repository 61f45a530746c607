use super::types::*;
use algosign_core::types::{Address, Signature, SIGNATURE_LENGTH};
use async_trait::async_trait;
use futures_util::lock::Mutex;
use tracing::trace;

/// A command frame sent to the device
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApduCommand {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
}

impl ApduCommand {
    /// Serializes the frame as `CLA INS P1 P2 Lc data`. Fails if `data` is longer than
    /// [`CHUNK_SIZE`], since Lc is a single byte.
    pub fn serialize(&self) -> Result<Vec<u8>, LedgerError> {
        let lc = u8::try_from(self.data.len())
            .map_err(|_| LedgerError::FrameTooLong(self.data.len()))?;
        let mut buf = Vec::with_capacity(5 + self.data.len());
        buf.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2, lc]);
        buf.extend_from_slice(&self.data);
        Ok(buf)
    }
}

/// A response frame: payload followed by a 2-byte status word
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApduAnswer {
    data: Vec<u8>,
    status: u16,
}

impl ApduAnswer {
    /// Splits a raw response into payload and status word
    pub fn from_answer(mut answer: Vec<u8>) -> Result<Self, LedgerError> {
        if answer.len() < 2 {
            return Err(LedgerError::ShortResponse { got: answer.len(), at_least: 2 })
        }
        let status = u16::from_be_bytes([answer[answer.len() - 2], answer[answer.len() - 1]]);
        answer.truncate(answer.len() - 2);
        Ok(Self { data: answer, status })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Maps the status word to an error unless it is `0x9000`
    pub fn into_result(self) -> Result<Vec<u8>, LedgerError> {
        match self.status {
            SW_OK => Ok(self.data),
            SW_USER_REJECTED => Err(LedgerError::UserRejected),
            status => Err(LedgerError::UnexpectedStatus(status)),
        }
    }
}

/// A raw, framed connection to the device, e.g. a BLE GATT characteristic pair
#[async_trait]
pub trait LedgerTransport: std::fmt::Debug + Send + Sync {
    /// Writes one command and waits for its answer
    async fn exchange(&self, command: &ApduCommand) -> Result<ApduAnswer, LedgerError>;

    /// Interrupts a pending exchange
    fn abort(&self) {}
}

/// The Algorand app running on a Ledger device.
///
/// This is a simple wrapper around a [`LedgerTransport`]. Exchanges are serialized through
/// a lock since the device only ever processes one command at a time.
#[derive(Debug)]
pub struct LedgerAlgorand<T> {
    transport: T,
    lock: Mutex<()>,
}

impl<T: LedgerTransport> LedgerAlgorand<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, lock: Mutex::new(()) }
    }

    /// Consume self and return the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Gets the address of the account at `account_index` in the Algorand app
    pub async fn get_address(&self, account_index: u32) -> Result<Address, LedgerError> {
        let _guard = self.lock.lock().await;
        let command = ApduCommand {
            cla: CLA,
            ins: INS::GET_PUBLIC_KEY as u8,
            p1: P1::FIRST as u8,
            p2: P2::LAST as u8,
            data: account_index.to_be_bytes().to_vec(),
        };

        let result = self.transport.exchange(&command).await?.into_result()?;
        let public_key: [u8; 32] = result
            .get(..32)
            .and_then(|key| key.try_into().ok())
            .ok_or(LedgerError::ShortResponse { got: result.len(), at_least: 32 })?;
        Ok(Address::new(public_key))
    }

    /// Signs a transaction (requires confirmation on the ledger)
    pub async fn sign_tx(&self, request: &LedgerSignRequest) -> Result<Signature, LedgerError> {
        let mut payload = request.account_index.to_be_bytes().to_vec();
        payload.extend_from_slice(&request.transaction.payload);
        trace!(
            index = %request.index(),
            path = %request.derivation_path(),
            len = payload.len(),
            "sending transaction to device"
        );
        self.sign_payload(INS::SIGN_MSGPACK, payload).await
    }

    /// Interrupts the exchange in progress
    pub fn abort(&self) {
        self.transport.abort()
    }

    // Sends the payload in 255 byte chunks and parses the signature off the last answer
    async fn sign_payload(&self, ins: INS, mut payload: Vec<u8>) -> Result<Signature, LedgerError> {
        if payload.len() <= 4 {
            return Err(LedgerError::EmptyPayload)
        }

        let _guard = self.lock.lock().await;
        let mut command = ApduCommand {
            cla: CLA,
            ins: ins as u8,
            p1: P1::FIRST_ACCOUNT_ID as u8,
            p2: P2::MORE as u8,
            data: Vec::new(),
        };

        let mut result = Vec::new();
        while !payload.is_empty() {
            let chunk_size = std::cmp::min(payload.len(), CHUNK_SIZE);
            command.data = payload.drain(0..chunk_size).collect();
            if payload.is_empty() {
                command.p2 = P2::LAST as u8;
            }

            result = self.transport.exchange(&command).await?.into_result()?;

            // We need more data
            command.p1 = P1::MORE as u8;
        }

        if result.is_empty() {
            return Err(LedgerError::UnexpectedNullResponse)
        }
        let signature = result.get(..SIGNATURE_LENGTH).ok_or(LedgerError::ShortResponse {
            got: result.len(),
            at_least: SIGNATURE_LENGTH,
        })?;
        Signature::from_slice(signature).map_err(|_| LedgerError::UnexpectedNullResponse)
    }
}
