//! Fixed-size key material carried in handshake packets and resume tickets.
//!
//! Public keys travel verbatim on the wire. Session keys are symmetric secrets:
//! they are zeroized on drop and never printed.

use ed25519_dalek::{SigningKey, VerifyingKey, PUBLIC_KEY_LENGTH};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{ProtocolError, Result};

/// Size of an Ed25519 signing public key.
pub const SIG_KEY_SIZE: usize = PUBLIC_KEY_LENGTH;

/// Size of an X25519 ephemeral encryption public key.
pub const ENC_KEY_SIZE: usize = 32;

/// Size of a symmetric session key.
pub const SESSION_KEY_SIZE: usize = 32;

/// Length of the truncated SHA-256 key fingerprint in bytes.
const FINGERPRINT_LENGTH: usize = 8;

/// Formats the first bytes of `SHA-256(bytes)` as colon separated hex groups.
pub(crate) fn fingerprint_of(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(bytes);
    hash[..FINGERPRINT_LENGTH]
        .chunks(2)
        .map(|chunk| format!("{:02x}{:02x}", chunk[0], chunk[1]))
        .collect::<Vec<_>>()
        .join(":")
}

/// Copies `N` bytes starting at `offset`, or reports what was missing.
pub(crate) fn read_array<const N: usize>(
    data: &[u8],
    offset: usize,
    what: &str,
) -> Result<[u8; N]> {
    let end = offset
        .checked_add(N)
        .ok_or_else(|| ProtocolError::MalformedInput(format!("{} offset overflows", what)))?;
    let slice = data
        .get(offset..end)
        .ok_or_else(|| ProtocolError::truncated(what, end, data.len()))?;
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    Ok(out)
}

/// A peer's long-term Ed25519 signing public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigKey(pub [u8; SIG_KEY_SIZE]);

impl SigKey {
    /// Creates a SigKey from raw bytes without validating the curve point.
    pub fn from_bytes(bytes: [u8; SIG_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes of this key.
    pub fn as_bytes(&self) -> &[u8; SIG_KEY_SIZE] {
        &self.0
    }

    /// Converts the raw bytes into a verifying key.
    ///
    /// Fails with `InvalidPublicKey` if the bytes are not a valid Ed25519 point.
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        VerifyingKey::from_bytes(&self.0).map_err(ProtocolError::from)
    }

    /// Human-readable fingerprint, e.g. `a1b2:c3d4:e5f6:7890`.
    pub fn fingerprint(&self) -> String {
        fingerprint_of(&self.0)
    }
}

impl From<&VerifyingKey> for SigKey {
    fn from(key: &VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl From<&SigningKey> for SigKey {
    fn from(key: &SigningKey) -> Self {
        Self(key.verifying_key().to_bytes())
    }
}

impl std::fmt::Display for SigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fingerprint())
    }
}

/// A client's ephemeral X25519 encryption public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncKey(pub [u8; ENC_KEY_SIZE]);

impl EncKey {
    /// Creates an EncKey from raw bytes.
    pub fn from_bytes(bytes: [u8; ENC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes of this key.
    pub fn as_bytes(&self) -> &[u8; ENC_KEY_SIZE] {
        &self.0
    }
}

/// A symmetric session key shared by both ends after a handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey([u8; SESSION_KEY_SIZE]);

impl SessionKey {
    /// Generates a fresh random session key from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SESSION_KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Creates a session key from raw bytes.
    pub fn from_bytes(bytes: [u8; SESSION_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    ///
    /// **Security Warning**: only hand these to a cipher or to the ticket encoder.
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_SIZE] {
        &self.0
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey([REDACTED])")
    }
}
