//! Frame codec for carrying packets over an ordered byte stream.
//!
//! # Frame Format
//!
//! Each frame consists of:
//! - 4 bytes: payload length (little-endian u32)
//! - N bytes: payload (one encoded packet)
//!
//! Handshake packets carry no length of their own, so a stream transport
//! needs this prefix to find packet boundaries.

use crate::error::{ProtocolError, Result};

/// Default maximum payload size.
pub const MAX_FRAME_SIZE: usize = 65_535;

/// Frame header size: the 4-byte length prefix.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Encoder and decoder for length-prefixed frames.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    /// Create a codec with the default [`MAX_FRAME_SIZE`] limit.
    pub fn new() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    /// Create a codec with a custom payload limit.
    ///
    /// The limit is capped at `u32::MAX`, the largest length the prefix can carry.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            max_frame_size: max_frame_size.min(u32::MAX as usize),
        }
    }

    /// Largest payload this codec accepts.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Encode a payload into a frame.
    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        self.check_size(payload.len())?;

        let mut output = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
        // check_size bounds the length to u32
        output.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        output.extend_from_slice(payload);
        Ok(output)
    }

    /// Decode one frame from the start of `data`.
    ///
    /// Returns the payload and the number of bytes consumed.
    pub fn decode(&self, data: &[u8]) -> Result<(Vec<u8>, usize)> {
        let payload_len = self.read_length(data)?.ok_or_else(|| {
            ProtocolError::truncated("frame header", FRAME_HEADER_SIZE, data.len())
        })?;

        let end = FRAME_HEADER_SIZE + payload_len;
        let payload = data
            .get(FRAME_HEADER_SIZE..end)
            .ok_or_else(|| ProtocolError::truncated("frame", end, data.len()))?;

        Ok((payload.to_vec(), end))
    }

    /// Try to decode a frame, returning None if there isn't enough data yet.
    ///
    /// Oversized frames are still reported as errors, since waiting for more
    /// data cannot fix them.
    pub fn try_decode(&self, data: &[u8]) -> Result<Option<(Vec<u8>, usize)>> {
        match self.read_length(data)? {
            Some(payload_len) if data.len() >= FRAME_HEADER_SIZE + payload_len => {
                self.decode(data).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Reads and validates the length prefix, or None if it is incomplete.
    fn read_length(&self, data: &[u8]) -> Result<Option<usize>> {
        let Some(prefix) = data.get(..FRAME_HEADER_SIZE) else {
            return Ok(None);
        };
        let mut length_bytes = [0u8; FRAME_HEADER_SIZE];
        length_bytes.copy_from_slice(prefix);
        let payload_len = u32::from_le_bytes(length_bytes) as usize;

        self.check_size(payload_len)?;
        Ok(Some(payload_len))
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size,
                max: self.max_frame_size,
            });
        }
        Ok(())
    }
}
