//! Packet header shared by every handshake packet.
//!
//! # Header Format
//!
//! - 1 byte: packet type
//! - 1 byte: flags (meaning depends on the packet type)

use crate::error::{ProtocolError, Result};

/// Header size: 1 (type) + 1 (flags) = 2 bytes.
pub const HEADER_SIZE: usize = 2;

/// Packet type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// Client hello, optionally carrying a resume ticket.
    M1 = 1,
    /// Server hello.
    M2 = 2,
    /// Server authentication.
    M3 = 3,
    /// Client authentication.
    M4 = 4,
    /// Application data.
    App = 5,
    /// Encrypted wrapper around another packet.
    Encrypted = 6,
    /// Address negotiation request.
    A1 = 8,
    /// Address negotiation response.
    A2 = 9,
    /// Server-to-client ticket delivery.
    TicketTransfer = 10,
    /// Several application messages in one packet.
    MultiApp = 11,
}

impl PacketType {
    /// Returns the wire byte of this type.
    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Reads the type byte at `offset` without consuming anything.
    pub fn peek(data: &[u8], offset: usize) -> Result<Self> {
        let byte = *data.get(offset).ok_or_else(|| {
            ProtocolError::truncated("packet type", offset.saturating_add(1), data.len())
        })?;
        Self::try_from(byte)
    }
}

impl TryFrom<u8> for PacketType {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self> {
        Ok(match byte {
            1 => PacketType::M1,
            2 => PacketType::M2,
            3 => PacketType::M3,
            4 => PacketType::M4,
            5 => PacketType::App,
            6 => PacketType::Encrypted,
            8 => PacketType::A1,
            9 => PacketType::A2,
            10 => PacketType::TicketTransfer,
            11 => PacketType::MultiApp,
            other => {
                return Err(ProtocolError::MalformedInput(format!(
                    "unknown packet type 0x{:02x}",
                    other
                )))
            }
        })
    }
}

/// Type and flag byte at the start of every packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// The packet type.
    pub packet_type: PacketType,
    /// Type-specific flag bits.
    pub flags: u8,
}

impl PacketHeader {
    /// Creates a header with no flags set.
    pub fn new(packet_type: PacketType) -> Self {
        Self {
            packet_type,
            flags: 0,
        }
    }

    /// Creates a header with explicit flags.
    pub fn with_flags(packet_type: PacketType, flags: u8) -> Self {
        Self { packet_type, flags }
    }

    /// Encodes the header into its fixed two-byte form.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        [self.packet_type.as_byte(), self.flags]
    }

    /// Decodes a header at `offset`, requiring it to be of `expected` type.
    ///
    /// Returns the header and the number of bytes consumed.
    pub fn decode(data: &[u8], offset: usize, expected: PacketType) -> Result<(Self, usize)> {
        let end = offset.saturating_add(HEADER_SIZE);
        if data.len() < end {
            return Err(ProtocolError::truncated("packet header", end, data.len()));
        }

        let type_byte = data[offset];
        if type_byte != expected.as_byte() {
            return Err(ProtocolError::BadPeer(format!(
                "expected packet type {:?} (0x{:02x}), got 0x{:02x}",
                expected,
                expected.as_byte(),
                type_byte
            )));
        }

        let header = Self {
            packet_type: expected,
            flags: data[offset + 1],
        };
        Ok((header, HEADER_SIZE))
    }
}
