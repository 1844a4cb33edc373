//! A1: address negotiation request. The header is the whole packet.

use crate::error::{ProtocolError, Result};
use crate::header::{PacketHeader, PacketType, HEADER_SIZE};

/// Zero-payload address negotiation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct A1Packet;

impl A1Packet {
    pub fn new() -> Self {
        A1Packet
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        HEADER_SIZE
    }

    pub fn encode(&self) -> Vec<u8> {
        PacketHeader::new(PacketType::A1).encode().to_vec()
    }

    /// Decodes an A1 packet at `offset`.
    ///
    /// A1 defines no flags, so any set flag bit is a `BadPeer` error.
    pub fn decode(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (header, consumed) = PacketHeader::decode(data, offset, PacketType::A1)?;
        if header.flags != 0 {
            return Err(ProtocolError::BadPeer(format!(
                "A1 defines no flags, got 0x{:02x}",
                header.flags
            )));
        }
        Ok((A1Packet, consumed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_encode() {
        let encoded = A1Packet::new().encode();
        assert_eq!(encoded, vec![PacketType::A1.as_byte(), 0]);
        assert_eq!(encoded.len(), A1Packet.size());
    }

    #[test]
    fn test_a1_decode() {
        let (packet, consumed) = A1Packet::decode(&[8, 0, 0xFF], 0).unwrap();
        assert_eq!(packet, A1Packet);
        assert_eq!(consumed, HEADER_SIZE);
    }

    #[test]
    fn test_a1_rejects_flags() {
        assert!(matches!(
            A1Packet::decode(&[8, 1], 0),
            Err(ProtocolError::BadPeer(_))
        ));
    }

    #[test]
    fn test_a1_rejects_other_type() {
        assert!(matches!(
            A1Packet::decode(&[9, 0], 0),
            Err(ProtocolError::BadPeer(_))
        ));
    }
}
