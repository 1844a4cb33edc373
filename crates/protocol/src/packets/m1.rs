//! M1: the first client-to-server handshake packet.
//!
//! # Packet Format
//!
//! ```text
//! header (2 bytes)        type = M1, flags = field bitmap
//! client_enc_key (32)     present if flags & CLIENT_ENC_KEY
//! server_sig_key (32)     present if flags & SERVER_SIG_KEY
//! resume ticket (var)     present if flags & RESUME_TICKET
//! ```
//!
//! Fields always appear in this order; an absent field takes no bytes.
//!
//! An M1 must carry a client encryption key, a resume ticket, or both.
//! Flags of `0x00`, or `SERVER_SIG_KEY` alone, decode as
//! [`ProtocolError::BadPeer`]: such a packet can neither start a handshake
//! nor resume a session. Unknown flag bits are also rejected.

use crate::error::{ProtocolError, Result};
use crate::header::{PacketHeader, PacketType, HEADER_SIZE};
use crate::keys::{read_array, EncKey, SigKey, ENC_KEY_SIZE, SIG_KEY_SIZE};
use crate::ticket::EncryptedTicketData;

/// Field bitmap carried in the M1 header flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct M1Flags(u8);

impl M1Flags {
    /// The client's ephemeral encryption key follows.
    pub const CLIENT_ENC_KEY: u8 = 0b0000_0001;

    /// The signing key the client expects the server to hold follows.
    pub const SERVER_SIG_KEY: u8 = 0b0000_0010;

    /// A resume ticket follows.
    pub const RESUME_TICKET: u8 = 0b0000_0100;

    /// Every bit with a defined meaning.
    pub const KNOWN: u8 = Self::CLIENT_ENC_KEY | Self::SERVER_SIG_KEY | Self::RESUME_TICKET;

    /// Create an empty flags set.
    #[inline]
    pub fn new() -> Self {
        Self(0)
    }

    /// Create flags from a raw byte, rejecting undefined bits.
    pub fn from_byte(byte: u8) -> Result<Self> {
        if byte & !Self::KNOWN != 0 {
            return Err(ProtocolError::BadPeer(format!(
                "M1 has undefined flag bits 0x{:02x}",
                byte & !Self::KNOWN
            )));
        }
        Ok(Self(byte))
    }

    /// Get the raw byte value of the flags.
    #[inline]
    pub fn as_byte(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn has_client_enc_key(self) -> bool {
        self.0 & Self::CLIENT_ENC_KEY != 0
    }

    #[inline]
    pub fn has_server_sig_key(self) -> bool {
        self.0 & Self::SERVER_SIG_KEY != 0
    }

    #[inline]
    pub fn has_resume_ticket(self) -> bool {
        self.0 & Self::RESUME_TICKET != 0
    }

    /// Return a copy with `bit` set or cleared.
    #[inline]
    pub fn with(mut self, bit: u8, present: bool) -> Self {
        if present {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
        self
    }
}

/// A decoded M1 packet.
///
/// Every valid flag combination maps to exactly one variant: a resume ticket
/// selects `Resume`, otherwise the encryption key is mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum M1Packet {
    /// Full handshake.
    Handshake {
        client_enc_key: EncKey,
        server_sig_key: Option<SigKey>,
    },
    /// Resumption attempt.
    Resume {
        ticket: EncryptedTicketData,
        client_enc_key: Option<EncKey>,
        server_sig_key: Option<SigKey>,
    },
}

impl M1Packet {
    /// Creates a full-handshake M1.
    pub fn handshake(client_enc_key: EncKey, server_sig_key: Option<SigKey>) -> Self {
        M1Packet::Handshake {
            client_enc_key,
            server_sig_key,
        }
    }

    /// Creates a resumption M1.
    pub fn resume(
        ticket: EncryptedTicketData,
        client_enc_key: Option<EncKey>,
        server_sig_key: Option<SigKey>,
    ) -> Self {
        M1Packet::Resume {
            ticket,
            client_enc_key,
            server_sig_key,
        }
    }

    pub fn client_enc_key(&self) -> Option<&EncKey> {
        match self {
            M1Packet::Handshake { client_enc_key, .. } => Some(client_enc_key),
            M1Packet::Resume { client_enc_key, .. } => client_enc_key.as_ref(),
        }
    }

    pub fn server_sig_key(&self) -> Option<&SigKey> {
        match self {
            M1Packet::Handshake { server_sig_key, .. } | M1Packet::Resume { server_sig_key, .. } => {
                server_sig_key.as_ref()
            }
        }
    }

    pub fn resume_ticket(&self) -> Option<&EncryptedTicketData> {
        match self {
            M1Packet::Handshake { .. } => None,
            M1Packet::Resume { ticket, .. } => Some(ticket),
        }
    }

    pub fn has_client_enc_key(&self) -> bool {
        self.client_enc_key().is_some()
    }

    pub fn has_server_sig_key(&self) -> bool {
        self.server_sig_key().is_some()
    }

    pub fn has_resume_ticket(&self) -> bool {
        self.resume_ticket().is_some()
    }

    /// Flag bitmap derived from the fields present.
    pub fn flags(&self) -> M1Flags {
        M1Flags::new()
            .with(M1Flags::CLIENT_ENC_KEY, self.has_client_enc_key())
            .with(M1Flags::SERVER_SIG_KEY, self.has_server_sig_key())
            .with(M1Flags::RESUME_TICKET, self.has_resume_ticket())
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        let mut size = HEADER_SIZE;
        if self.has_client_enc_key() {
            size += ENC_KEY_SIZE;
        }
        if self.has_server_sig_key() {
            size += SIG_KEY_SIZE;
        }
        if let Some(ticket) = self.resume_ticket() {
            size += ticket.size();
        }
        size
    }

    /// Appends the encoded packet to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.reserve(self.size());
        out.extend_from_slice(
            &PacketHeader::with_flags(PacketType::M1, self.flags().as_byte()).encode(),
        );
        if let Some(key) = self.client_enc_key() {
            out.extend_from_slice(key.as_bytes());
        }
        if let Some(key) = self.server_sig_key() {
            out.extend_from_slice(key.as_bytes());
        }
        if let Some(ticket) = self.resume_ticket() {
            ticket.encode_into(out);
        }
    }

    /// Encodes the packet.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        self.encode_into(&mut out);
        out
    }

    /// Decodes an M1 packet at `offset`.
    ///
    /// Returns the packet and the number of bytes consumed. Any mismatch
    /// between the flags and the data that follows is a `BadPeer` error.
    pub fn decode(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (header, mut consumed) = PacketHeader::decode(data, offset, PacketType::M1)?;
        let flags = M1Flags::from_byte(header.flags)?;

        let client_enc_key = if flags.has_client_enc_key() {
            let bytes: [u8; ENC_KEY_SIZE] =
                read_array(data, offset + consumed, "M1 client encryption key")
                    .map_err(as_bad_peer)?;
            consumed += ENC_KEY_SIZE;
            Some(EncKey::from_bytes(bytes))
        } else {
            None
        };

        let server_sig_key = if flags.has_server_sig_key() {
            let bytes: [u8; SIG_KEY_SIZE] =
                read_array(data, offset + consumed, "M1 server signing key")
                    .map_err(as_bad_peer)?;
            consumed += SIG_KEY_SIZE;
            Some(SigKey::from_bytes(bytes))
        } else {
            None
        };

        let ticket = if flags.has_resume_ticket() {
            let (ticket, used) =
                EncryptedTicketData::decode(data, offset + consumed).map_err(as_bad_peer)?;
            consumed += used;
            Some(ticket)
        } else {
            None
        };

        let packet = match (ticket, client_enc_key) {
            (Some(ticket), client_enc_key) => M1Packet::Resume {
                ticket,
                client_enc_key,
                server_sig_key,
            },
            (None, Some(client_enc_key)) => M1Packet::Handshake {
                client_enc_key,
                server_sig_key,
            },
            (None, None) => {
                return Err(ProtocolError::BadPeer(
                    "M1 carries neither an encryption key nor a resume ticket".to_string(),
                ))
            }
        };

        Ok((packet, consumed))
    }

    /// Decodes a buffer holding exactly one M1 packet.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (packet, consumed) = Self::decode(data, 0)?;
        if consumed != data.len() {
            return Err(ProtocolError::BadPeer(format!(
                "M1 followed by {} unexpected bytes",
                data.len() - consumed
            )));
        }
        Ok(packet)
    }
}

fn as_bad_peer(err: ProtocolError) -> ProtocolError {
    match err {
        ProtocolError::MalformedInput(msg) => ProtocolError::BadPeer(msg),
        other => other,
    }
}
