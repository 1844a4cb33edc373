//! # Tessera Protocol Library
//!
//! Wire codecs and session-resumption tickets for the Tessera secure-channel
//! handshake.
//!
//! ## Overview
//!
//! A full Tessera handshake costs several public-key operations. Once a
//! client has authenticated, the server can hand it an encrypted resume
//! ticket; presenting that ticket in a later M1 packet skips the expensive
//! part of the handshake. This crate provides:
//!
//! - **Packet Codecs**: the shared two-byte header, the variant M1 packet,
//!   A1 and TicketTransfer
//! - **Ticket Model**: plaintext [`TicketData`] and the wire envelope
//!   [`EncryptedTicketData`]
//! - **Anti-Replay**: [`TicketIndexAllocator`], which lets each issued ticket
//!   be redeemed at most once
//! - **Resume Handler**: [`ResumeHandler`], issuing and checking tickets
//! - **Frame Codec**: length-prefixed framing over byte streams
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Handshake layer              │  M1 / M2 / M3 / M4
//! ├─────────────────────────────────────────┤
//! │     ResumeHandler + IndexAllocator      │  issue / check tickets
//! ├─────────────────────────────────────────┤
//! │             Ticket cipher               │  ChaCha20-Poly1305
//! ├─────────────────────────────────────────┤
//! │               Framing                   │  u32 length prefix
//! ├─────────────────────────────────────────┤
//! │          Ordered transport              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use tessera_protocol::{
//!     M1Packet, Packet, ResumeHandler, SessionKey, SigKey, TicketData, TicketKey,
//!     TicketTransferPacket,
//! };
//!
//! let handler = ResumeHandler::new(&TicketKey::generate(), 0, 1000).unwrap();
//!
//! // After a full handshake, hand the client a ticket
//! let session = TicketData::new(SigKey::from_bytes([7; 32]), SessionKey::generate());
//! let ticket = handler.issue_ticket(&session, [0; 8]).unwrap();
//! let transfer = TicketTransferPacket::new(ticket.clone()).encode();
//!
//! // Later the client presents it
//! let m1 = M1Packet::resume(ticket, None, None).encode();
//! let (packet, _) = Packet::decode(&m1, 0).unwrap();
//! if let Packet::M1(m1) = packet {
//!     let ticket = m1.resume_ticket().unwrap();
//!     assert_eq!(handler.check_ticket(ticket).unwrap(), session);
//!     // Second use is refused
//!     assert!(handler.check_ticket(ticket).is_err());
//! }
//! # let _ = transfer;
//! ```
//!
//! ## Modules
//!
//! - [`header`]: Packet types and the common header
//! - [`packets`]: A1, M1 and TicketTransfer codecs and dispatch
//! - [`ticket`]: Ticket data model and envelope codec
//! - [`allocator`]: Ticket index allocation and replay protection
//! - [`cipher`]: Ticket encryption
//! - [`resume`]: Ticket issuing and checking
//! - [`framing`]: Frame codec
//! - [`config`]: Resume configuration
//! - [`error`]: Error types

pub mod allocator;
pub mod cipher;
pub mod config;
pub mod error;
pub mod framing;
pub mod header;
pub mod keys;
pub mod packets;
pub mod resume;
pub mod ticket;

pub use allocator::{TicketIndexAllocator, MAX_TICKET_CAPACITY};
pub use cipher::{ChaChaTicketCipher, TicketCipher, TicketKey, TAG_SIZE, TICKET_KEY_SIZE};
pub use config::{ResumeConfig, DEFAULT_TICKET_CAPACITY, DEFAULT_TICKET_HEADER};
pub use error::{ProtocolError, Result};
pub use framing::{FrameCodec, FRAME_HEADER_SIZE, MAX_FRAME_SIZE};
pub use header::{PacketHeader, PacketType, HEADER_SIZE};
pub use keys::{EncKey, SessionKey, SigKey, ENC_KEY_SIZE, SESSION_KEY_SIZE, SIG_KEY_SIZE};
pub use packets::{A1Packet, M1Flags, M1Packet, Packet, TicketTransferPacket};
pub use resume::ResumeHandler;
pub use ticket::{EncryptedTicketData, TicketData, HOST_DATA_SIZE, TICKET_ENVELOPE_OVERHEAD};
