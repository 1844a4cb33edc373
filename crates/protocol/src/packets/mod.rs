//! Handshake packets handled at the resumption layer.
//!
//! [`Packet::decode`] peeks the type byte and dispatches to the matching
//! codec. Packet types this layer does not handle (M2..M4, application and
//! encrypted packets) are rejected as unexpected.

mod a1;
mod m1;
mod tt;

pub use a1::A1Packet;
pub use m1::{M1Flags, M1Packet};
pub use tt::TicketTransferPacket;

use crate::error::{ProtocolError, Result};
use crate::header::PacketType;

/// Any packet decodable at this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    A1(A1Packet),
    M1(M1Packet),
    TicketTransfer(TicketTransferPacket),
}

impl Packet {
    /// The wire type of this packet.
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::A1(_) => PacketType::A1,
            Packet::M1(_) => PacketType::M1,
            Packet::TicketTransfer(_) => PacketType::TicketTransfer,
        }
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        match self {
            Packet::A1(p) => p.size(),
            Packet::M1(p) => p.size(),
            Packet::TicketTransfer(p) => p.size(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Packet::A1(p) => p.encode(),
            Packet::M1(p) => p.encode(),
            Packet::TicketTransfer(p) => p.encode(),
        }
    }

    /// Decodes the packet at `offset`, whatever its type.
    ///
    /// Returns the packet and the number of bytes consumed.
    pub fn decode(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let packet_type = PacketType::peek(data, offset)?;
        match packet_type {
            PacketType::A1 => A1Packet::decode(data, offset).map(|(p, n)| (Packet::A1(p), n)),
            PacketType::M1 => M1Packet::decode(data, offset).map(|(p, n)| (Packet::M1(p), n)),
            PacketType::TicketTransfer => TicketTransferPacket::decode(data, offset)
                .map(|(p, n)| (Packet::TicketTransfer(p), n)),
            other => Err(ProtocolError::BadPeer(format!(
                "unexpected packet type {:?}",
                other
            ))),
        }
    }
}

impl From<A1Packet> for Packet {
    fn from(packet: A1Packet) -> Self {
        Packet::A1(packet)
    }
}

impl From<M1Packet> for Packet {
    fn from(packet: M1Packet) -> Self {
        Packet::M1(packet)
    }
}

impl From<TicketTransferPacket> for Packet {
    fn from(packet: TicketTransferPacket) -> Self {
        Packet::TicketTransfer(packet)
    }
}
