//! Authenticated encryption of resume tickets.
//!
//! The [`TicketCipher`] trait is the seam between the ticket subsystem and the
//! AEAD primitive. [`ChaChaTicketCipher`] is the production implementation.
//!
//! ## Nonce Construction
//! ```text
//! nonce (12 bytes) = ticket_index (8 bytes LE) || 0x00000000 (4 bytes)
//! ```
//!
//! Ticket indices are never reused under one key, so neither is the nonce.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{ProtocolError, Result};
use crate::keys::fingerprint_of;

/// Size of a ticket encryption key.
pub const TICKET_KEY_SIZE: usize = 32;

/// Authentication tag appended to every sealed ticket (Poly1305).
pub const TAG_SIZE: usize = 16;

/// ChaCha20-Poly1305 nonce size.
const NONCE_SIZE: usize = 12;

/// Host-private key used to seal and open resume tickets.
#[derive(Clone)]
pub struct TicketKey([u8; TICKET_KEY_SIZE]);

impl TicketKey {
    /// Generates a new random key from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TICKET_KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; TICKET_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    ///
    /// **Security Warning**: only use this to persist the key.
    pub fn as_bytes(&self) -> &[u8; TICKET_KEY_SIZE] {
        &self.0
    }

    /// Non-secret identifier of this key, safe to log.
    pub fn fingerprint(&self) -> String {
        fingerprint_of(&self.0)
    }
}

impl Drop for TicketKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for TicketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketKey")
            .field("fingerprint", &self.fingerprint())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// AEAD operations needed by the resume handler.
///
/// Implementations must append exactly [`TAG_SIZE`] bytes of tag and must
/// reject any ciphertext whose tag does not verify.
pub trait TicketCipher: Send + Sync {
    /// Encrypts `plaintext` for the ticket with the given index.
    fn seal(&self, ticket_index: i64, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypts and authenticates `ciphertext`.
    ///
    /// Any failure is reported as [`ProtocolError::InvalidTicket`].
    fn open(&self, ticket_index: i64, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// ChaCha20-Poly1305 ticket cipher.
pub struct ChaChaTicketCipher {
    aead: ChaCha20Poly1305,
    key_fingerprint: String,
}

impl ChaChaTicketCipher {
    /// Creates a cipher bound to `key`.
    pub fn new(key: &TicketKey) -> Self {
        Self {
            aead: ChaCha20Poly1305::new(Key::from_slice(key.as_bytes())),
            key_fingerprint: key.fingerprint(),
        }
    }

    /// Fingerprint of the key this cipher was built from.
    pub fn key_fingerprint(&self) -> &str {
        &self.key_fingerprint
    }

    fn nonce(ticket_index: i64) -> [u8; NONCE_SIZE] {
        let mut nonce = [0u8; NONCE_SIZE];
        nonce[..8].copy_from_slice(&ticket_index.to_le_bytes());
        nonce
    }
}

impl TicketCipher for ChaChaTicketCipher {
    fn seal(&self, ticket_index: i64, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Self::nonce(ticket_index);
        self.aead
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|e| ProtocolError::Encryption(e.to_string()))
    }

    fn open(&self, ticket_index: i64, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < TAG_SIZE {
            return Err(ProtocolError::InvalidTicket);
        }
        let nonce = Self::nonce(ticket_index);
        self.aead
            .decrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| ProtocolError::InvalidTicket)
    }
}

impl std::fmt::Debug for ChaChaTicketCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChaChaTicketCipher")
            .field("key_fingerprint", &self.key_fingerprint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> ChaChaTicketCipher {
        ChaChaTicketCipher::new(&TicketKey::from_bytes([0x42; TICKET_KEY_SIZE]))
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let cipher = cipher();
        let sealed = cipher.seal(7, b"aad", b"ticket payload").unwrap();
        assert_eq!(sealed.len(), b"ticket payload".len() + TAG_SIZE);

        let opened = cipher.open(7, b"aad", &sealed).unwrap();
        assert_eq!(opened, b"ticket payload");
    }

    #[test]
    fn test_open_with_wrong_index_fails() {
        let cipher = cipher();
        let sealed = cipher.seal(7, b"aad", b"payload").unwrap();
        assert_eq!(cipher.open(8, b"aad", &sealed), Err(ProtocolError::InvalidTicket));
    }

    #[test]
    fn test_open_with_wrong_aad_fails() {
        let cipher = cipher();
        let sealed = cipher.seal(7, b"aad", b"payload").unwrap();
        assert_eq!(cipher.open(7, b"bad", &sealed), Err(ProtocolError::InvalidTicket));
    }

    #[test]
    fn test_open_with_other_key_fails() {
        let sealed = cipher().seal(1, b"", b"payload").unwrap();
        let other = ChaChaTicketCipher::new(&TicketKey::generate());
        assert_eq!(other.open(1, b"", &sealed), Err(ProtocolError::InvalidTicket));
    }

    #[test]
    fn test_open_tampered_fails() {
        let cipher = cipher();
        let mut sealed = cipher.seal(3, b"", b"payload").unwrap();
        sealed[0] ^= 0xFF;
        assert_eq!(cipher.open(3, b"", &sealed), Err(ProtocolError::InvalidTicket));
    }

    #[test]
    fn test_open_short_ciphertext_fails() {
        let cipher = cipher();
        assert_eq!(
            cipher.open(3, b"", &[0u8; TAG_SIZE - 1]),
            Err(ProtocolError::InvalidTicket)
        );
    }

    #[test]
    fn test_negative_index_nonce() {
        let cipher = cipher();
        let sealed = cipher.seal(-5, b"", b"payload").unwrap();
        assert_eq!(cipher.open(-5, b"", &sealed).unwrap(), b"payload");
        assert!(cipher.open(5, b"", &sealed).is_err());
    }

    #[test]
    fn test_ticket_key_debug_redacts() {
        let key = TicketKey::from_bytes([0x11; TICKET_KEY_SIZE]);
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(debug.contains(&key.fingerprint()));
    }

    #[test]
    fn test_generated_keys_differ() {
        assert_ne!(
            TicketKey::generate().as_bytes(),
            TicketKey::generate().as_bytes()
        );
    }
}
