//! Resume ticket data model and wire codecs.
//!
//! # Ticket Envelope Format
//!
//! All integers are little-endian.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ header (1 byte)            │ host-defined format byte    │
//! ├──────────────────────────────────────────────────────────┤
//! │ ticket_index (8 bytes)     │ i64, bound as AEAD nonce/AAD│
//! ├──────────────────────────────────────────────────────────┤
//! │ host_data (8 bytes)        │ opaque, never encrypted     │
//! ├──────────────────────────────────────────────────────────┤
//! │ length (2 bytes)           │ u16, size of encrypted bytes│
//! ├──────────────────────────────────────────────────────────┤
//! │ encrypted_bytes (length)   │ AEAD(TicketData) || tag     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The plaintext [`TicketData`] is a fixed 64-byte structure:
//! `client_sig_key (32) || session_key (32)`.

use crate::cipher::TAG_SIZE;
use crate::error::{ProtocolError, Result};
use crate::keys::{read_array, SessionKey, SigKey, SESSION_KEY_SIZE, SIG_KEY_SIZE};

/// Size of the host-private context carried in every ticket envelope.
pub const HOST_DATA_SIZE: usize = 8;

/// Width of the ticket index field.
pub const TICKET_INDEX_SIZE: usize = 8;

/// Width of the encrypted-bytes length field.
pub const LENGTH_FIELD_SIZE: usize = 2;

/// Bytes of an encoded envelope that precede the encrypted bytes.
pub const TICKET_ENVELOPE_OVERHEAD: usize =
    1 + TICKET_INDEX_SIZE + HOST_DATA_SIZE + LENGTH_FIELD_SIZE;

/// Largest ciphertext the length field can describe.
pub const MAX_ENCRYPTED_BYTES: usize = u16::MAX as usize;

/// Plaintext session-resumption payload.
///
/// Only ever exists in host memory between ticket decryption and the
/// handshake layer consuming it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketData {
    client_sig_key: SigKey,
    session_key: SessionKey,
}

impl TicketData {
    /// Encoded size: signing key followed by session key.
    pub const SIZE: usize = SIG_KEY_SIZE + SESSION_KEY_SIZE;

    /// Creates ticket data for a completed session.
    pub fn new(client_sig_key: SigKey, session_key: SessionKey) -> Self {
        Self {
            client_sig_key,
            session_key,
        }
    }

    /// The client's long-term signing key, as authenticated in the original handshake.
    pub fn client_sig_key(&self) -> &SigKey {
        &self.client_sig_key
    }

    /// The symmetric key of the session being resumed.
    pub fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    /// Returns the client signing key as an Ed25519 verifying key.
    pub fn client_verifying_key(&self) -> Result<ed25519_dalek::VerifyingKey> {
        self.client_sig_key.verifying_key()
    }

    /// Encodes the ticket data into its fixed 64-byte form.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend_from_slice(self.client_sig_key.as_bytes());
        out.extend_from_slice(self.session_key.as_bytes());
        out
    }

    /// Decodes ticket data at `offset`.
    ///
    /// Returns the ticket data and the number of bytes consumed.
    pub fn decode(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let sig: [u8; SIG_KEY_SIZE] = read_array(data, offset, "ticket client key")?;
        let session: [u8; SESSION_KEY_SIZE] =
            read_array(data, offset.saturating_add(SIG_KEY_SIZE), "ticket session key")?;

        let ticket = Self {
            client_sig_key: SigKey::from_bytes(sig),
            session_key: SessionKey::from_bytes(session),
        };
        Ok((ticket, Self::SIZE))
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        Self::SIZE
    }
}

/// Encrypted ticket envelope as sent to the client.
///
/// `size_of_encrypted_bytes` mirrors `encrypted_bytes.len()`. The fields are
/// private and every constructor sets both, so the two can never diverge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedTicketData {
    header: u8,
    ticket_index: i64,
    host_data: [u8; HOST_DATA_SIZE],
    encrypted_bytes: Vec<u8>,
    size_of_encrypted_bytes: usize,
}

impl EncryptedTicketData {
    /// Creates an envelope.
    ///
    /// Fails with `MalformedInput` if `encrypted_bytes` is shorter than the
    /// authentication tag or longer than the length field can express.
    pub fn new(
        header: u8,
        ticket_index: i64,
        host_data: [u8; HOST_DATA_SIZE],
        encrypted_bytes: Vec<u8>,
    ) -> Result<Self> {
        check_encrypted_len(encrypted_bytes.len())?;
        let size_of_encrypted_bytes = encrypted_bytes.len();
        Ok(Self {
            header,
            ticket_index,
            host_data,
            encrypted_bytes,
            size_of_encrypted_bytes,
        })
    }

    /// Host-defined format byte.
    pub fn header(&self) -> u8 {
        self.header
    }

    /// Index the ticket was issued under.
    pub fn ticket_index(&self) -> i64 {
        self.ticket_index
    }

    /// Host-private context bytes.
    pub fn host_data(&self) -> &[u8; HOST_DATA_SIZE] {
        &self.host_data
    }

    /// Ciphertext followed by the authentication tag.
    pub fn encrypted_bytes(&self) -> &[u8] {
        &self.encrypted_bytes
    }

    /// Cached length of [`encrypted_bytes`](Self::encrypted_bytes).
    pub fn size_of_encrypted_bytes(&self) -> usize {
        self.size_of_encrypted_bytes
    }

    /// Replaces the ciphertext, keeping the cached size in step.
    pub fn set_encrypted_bytes(&mut self, encrypted_bytes: Vec<u8>) -> Result<()> {
        check_encrypted_len(encrypted_bytes.len())?;
        self.size_of_encrypted_bytes = encrypted_bytes.len();
        self.encrypted_bytes = encrypted_bytes;
        Ok(())
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        TICKET_ENVELOPE_OVERHEAD + self.size_of_encrypted_bytes
    }

    /// Appends the encoded envelope to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.reserve(self.size());
        out.push(self.header);
        out.extend_from_slice(&self.ticket_index.to_le_bytes());
        out.extend_from_slice(&self.host_data);
        // new() and set_encrypted_bytes() bound the length to u16::MAX
        out.extend_from_slice(&(self.size_of_encrypted_bytes as u16).to_le_bytes());
        out.extend_from_slice(&self.encrypted_bytes);
    }

    /// Encodes the envelope.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        self.encode_into(&mut out);
        out
    }

    /// Decodes an envelope at `offset`.
    ///
    /// Returns the envelope and the number of bytes consumed.
    pub fn decode(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let fixed_end = offset.saturating_add(TICKET_ENVELOPE_OVERHEAD);
        if data.len() < fixed_end {
            return Err(ProtocolError::truncated("ticket envelope", fixed_end, data.len()));
        }

        let mut pos = offset;
        let header = data[pos];
        pos += 1;

        let index_bytes: [u8; TICKET_INDEX_SIZE] = read_array(data, pos, "ticket index")?;
        let ticket_index = i64::from_le_bytes(index_bytes);
        pos += TICKET_INDEX_SIZE;

        let host_data: [u8; HOST_DATA_SIZE] = read_array(data, pos, "ticket host data")?;
        pos += HOST_DATA_SIZE;

        let len_bytes: [u8; LENGTH_FIELD_SIZE] = read_array(data, pos, "ticket length")?;
        let encrypted_len = u16::from_le_bytes(len_bytes) as usize;
        pos += LENGTH_FIELD_SIZE;

        if encrypted_len < TAG_SIZE {
            return Err(ProtocolError::MalformedInput(format!(
                "ticket ciphertext too short: {} bytes, tag alone is {}",
                encrypted_len, TAG_SIZE
            )));
        }

        let end = pos + encrypted_len;
        let encrypted_bytes = data
            .get(pos..end)
            .ok_or_else(|| ProtocolError::truncated("ticket ciphertext", end, data.len()))?
            .to_vec();

        let ticket = Self {
            header,
            ticket_index,
            host_data,
            encrypted_bytes,
            size_of_encrypted_bytes: encrypted_len,
        };
        Ok((ticket, end - offset))
    }

    /// Additional authenticated data binding the cleartext envelope fields.
    pub(crate) fn associated_data(&self) -> Vec<u8> {
        associated_data(self.header, self.ticket_index, &self.host_data)
    }
}

/// `header || ticket_index (LE) || host_data`
pub(crate) fn associated_data(
    header: u8,
    ticket_index: i64,
    host_data: &[u8; HOST_DATA_SIZE],
) -> Vec<u8> {
    let mut aad = Vec::with_capacity(1 + TICKET_INDEX_SIZE + HOST_DATA_SIZE);
    aad.push(header);
    aad.extend_from_slice(&ticket_index.to_le_bytes());
    aad.extend_from_slice(host_data);
    aad
}

fn check_encrypted_len(len: usize) -> Result<()> {
    if len < TAG_SIZE {
        return Err(ProtocolError::MalformedInput(format!(
            "ticket ciphertext too short: {} bytes, tag alone is {}",
            len, TAG_SIZE
        )));
    }
    if len > MAX_ENCRYPTED_BYTES {
        return Err(ProtocolError::MalformedInput(format!(
            "ticket ciphertext too long: {} bytes exceeds maximum of {}",
            len, MAX_ENCRYPTED_BYTES
        )));
    }
    Ok(())
}
