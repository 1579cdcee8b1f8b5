//! Outbound cross-chain messages and their canonical encoding.
//!
//! The same byte sequence must be hashed when a message is committed on the
//! source side and when it is recomputed from a proof on the destination
//! side, so the layout is fixed and big-endian:
//!
//! ```text
//! source u64 | destination u64 | token [32] | sequence u64 | sender [20] | payload_len u32 | payload
//! ```

use serde::{Deserialize, Serialize};

use crate::wire::Reader;
use crate::{AccountId, ChainId, MessageKey, PotatoError, Result, TokenId, TxHash, constants};

/// Fixed-size prefix of an encoded message (everything but the payload).
pub const MESSAGE_HEADER_LEN: usize = 8 + 8 + constants::TOKEN_ID_LEN + 8 + constants::ACCOUNT_ID_LEN + 4;

/// A burn-and-throw message. Created exactly once per throw; immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub source_chain_id: ChainId,
    pub destination_chain_id: ChainId,
    pub token_id: TokenId,
    /// Monotonic per source chain.
    pub sequence_number: u64,
    /// Owner of the token at throw time.
    pub sender: AccountId,
    /// Opaque token metadata.
    pub payload: Vec<u8>,
}

impl OutboundMessage {
    /// The replay-protection key of this message.
    #[must_use]
    pub fn key(&self) -> MessageKey {
        MessageKey {
            source_chain_id: self.source_chain_id,
            token_id: self.token_id,
            sequence_number: self.sequence_number,
        }
    }

    /// Canonical encoding. This is what gets hashed into the message root.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MESSAGE_HEADER_LEN + self.payload.len());
        out.extend_from_slice(&self.source_chain_id.0.to_be_bytes());
        out.extend_from_slice(&self.destination_chain_id.0.to_be_bytes());
        out.extend_from_slice(self.token_id.as_bytes());
        out.extend_from_slice(&self.sequence_number.to_be_bytes());
        out.extend_from_slice(self.sender.as_bytes());
        let len = u32::try_from(self.payload.len()).unwrap_or(u32::MAX);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Decode a canonically encoded message. Rejects trailing bytes.
    ///
    /// # Errors
    /// Returns `Serialization` on truncated input, oversized payload, or
    /// trailing bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let message = Self::read(&mut reader)?;
        reader.finish()?;
        Ok(message)
    }

    pub(crate) fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let source_chain_id = ChainId(reader.u64("source chain id")?);
        let destination_chain_id = ChainId(reader.u64("destination chain id")?);
        let token_id = TokenId(reader.array("token id")?);
        let sequence_number = reader.u64("sequence number")?;
        let sender = AccountId(reader.array("sender")?);
        let len = reader.u32("payload length")? as usize;
        if len > constants::MAX_PAYLOAD_LEN {
            return Err(PotatoError::Serialization(format!(
                "payload of {len} bytes exceeds {}",
                constants::MAX_PAYLOAD_LEN
            )));
        }
        let payload = reader.take(len, "payload")?.to_vec();
        Ok(Self {
            source_chain_id,
            destination_chain_id,
            token_id,
            sequence_number,
            sender,
            payload,
        })
    }
}

/// What a successful burn-and-throw hands back to the thrower: the hash of
/// the emitting transaction (used to request a proof later) and the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrowReceipt {
    pub tx_hash: TxHash,
    pub message: OutboundMessage,
}

/// Dummy message for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl OutboundMessage {
    pub fn dummy(source: u64, destination: u64, sequence_number: u64) -> Self {
        Self {
            source_chain_id: ChainId(source),
            destination_chain_id: ChainId(destination),
            token_id: TokenId::random(),
            sequence_number,
            sender: AccountId::random(),
            payload: b"potato".to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_layout() {
        let msg = OutboundMessage {
            source_chain_id: ChainId(271),
            destination_chain_id: ChainId(260),
            token_id: TokenId::from_bytes([0xaa; 32]),
            sequence_number: 3,
            sender: AccountId::from_bytes([0xbb; 20]),
            payload: vec![1, 2, 3],
        };
        let bytes = msg.encode();
        assert_eq!(bytes.len(), MESSAGE_HEADER_LEN + 3);
        assert_eq!(&bytes[..8], &271u64.to_be_bytes());
        assert_eq!(&bytes[8..16], &260u64.to_be_bytes());
        assert_eq!(&bytes[16..48], &[0xaa; 32]);
        assert_eq!(&bytes[48..56], &3u64.to_be_bytes());
        assert_eq!(&bytes[56..76], &[0xbb; 20]);
        assert_eq!(&bytes[76..80], &3u32.to_be_bytes());
        assert_eq!(&bytes[80..], &[1, 2, 3]);
        assert_eq!(OutboundMessage::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn encoding_is_deterministic() {
        let msg = OutboundMessage::dummy(1, 2, 0);
        assert_eq!(msg.encode(), msg.clone().encode());
    }

    #[test]
    fn truncated_input_rejected() {
        let bytes = OutboundMessage::dummy(1, 2, 0).encode();
        let err = OutboundMessage::decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, PotatoError::Serialization(_)));
        assert!(OutboundMessage::decode(&bytes[..10]).is_err());
        assert!(OutboundMessage::decode(&[]).is_err());
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = OutboundMessage::dummy(1, 2, 0).encode();
        bytes.push(0);
        let err = OutboundMessage::decode(&bytes).unwrap_err();
        assert!(format!("{err}").contains("trailing"));
    }

    #[test]
    fn oversized_payload_rejected() {
        let mut msg = OutboundMessage::dummy(1, 2, 0);
        msg.payload = vec![0; constants::MAX_PAYLOAD_LEN + 1];
        let err = OutboundMessage::decode(&msg.encode()).unwrap_err();
        assert!(format!("{err}").contains("exceeds"));
    }

    #[test]
    fn key_ignores_destination_and_payload() {
        let a = OutboundMessage::dummy(1, 2, 7);
        let mut b = a.clone();
        b.destination_chain_id = ChainId(9);
        b.payload = b"other".to_vec();
        assert_eq!(a.key(), b.key());
    }
}
