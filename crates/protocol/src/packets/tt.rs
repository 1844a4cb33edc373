//! TicketTransfer: delivers a freshly issued resume ticket to the client.
//!
//! ```text
//! header (2 bytes)    type = TicketTransfer, flags = 0
//! ticket (var)        EncryptedTicketData
//! ```

use crate::error::{ProtocolError, Result};
use crate::header::{PacketHeader, PacketType, HEADER_SIZE};
use crate::ticket::EncryptedTicketData;

/// Server-to-client ticket delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketTransferPacket {
    pub ticket: EncryptedTicketData,
}

impl TicketTransferPacket {
    pub fn new(ticket: EncryptedTicketData) -> Self {
        Self { ticket }
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.ticket.size()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        out.extend_from_slice(&PacketHeader::new(PacketType::TicketTransfer).encode());
        self.ticket.encode_into(&mut out);
        out
    }

    /// Decodes a TicketTransfer packet at `offset`.
    pub fn decode(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (header, consumed) = PacketHeader::decode(data, offset, PacketType::TicketTransfer)?;
        if header.flags != 0 {
            return Err(ProtocolError::BadPeer(format!(
                "TicketTransfer defines no flags, got 0x{:02x}",
                header.flags
            )));
        }

        let (ticket, used) = EncryptedTicketData::decode(data, offset + consumed)?;
        Ok((Self { ticket }, consumed + used))
    }
}
