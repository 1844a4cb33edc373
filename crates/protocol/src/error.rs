//! Error types for the protocol crate.

use thiserror::Error;

/// Protocol error type covering all possible failure modes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    // Decoding errors
    /// Wire bytes are truncated or internally inconsistent.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The peer sent a packet that does not fit the expected handshake step.
    #[error("bad peer: {0}")]
    BadPeer(String),

    // Ticket errors
    /// A presented resume ticket was rejected.
    ///
    /// Deliberately carries no reason: unknown index, replayed index and
    /// failed authentication are indistinguishable to the caller.
    #[error("invalid ticket")]
    InvalidTicket,

    /// The allocator has issued every representable ticket index.
    #[error("ticket index space exhausted")]
    TicketIndexExhausted,

    // Cryptographic errors
    /// Encryption operation failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Invalid or malformed public key.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    // Configuration errors
    /// A handler or allocator was configured with out-of-range values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Frame errors
    /// Frame exceeds maximum allowed size.
    #[error("frame too large: {size} bytes exceeds maximum of {max} bytes")]
    FrameTooLarge {
        /// Actual frame size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

impl ProtocolError {
    /// Builds a `MalformedInput` error for a buffer that ended too early.
    pub(crate) fn truncated(what: &str, need: usize, have: usize) -> Self {
        ProtocolError::MalformedInput(format!(
            "insufficient data for {}: need {} bytes, have {}",
            what, need, have
        ))
    }
}

impl From<ed25519_dalek::SignatureError> for ProtocolError {
    fn from(err: ed25519_dalek::SignatureError) -> Self {
        ProtocolError::InvalidPublicKey(err.to_string())
    }
}
