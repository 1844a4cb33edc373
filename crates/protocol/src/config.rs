//! Resume ticket configuration.
//!
//! Deserialised from the `[resume]` table of a host configuration file:
//!
//! ```toml
//! [resume]
//! first_ticket_index = 0
//! capacity = 10000
//! ticket_header = 1
//! ```

use serde::{Deserialize, Serialize};

use crate::allocator::MAX_TICKET_CAPACITY;
use crate::error::{ProtocolError, Result};

/// Default ticket format byte.
pub const DEFAULT_TICKET_HEADER: u8 = 0x01;

/// Default number of tickets tracked by the anti-replay window.
pub const DEFAULT_TICKET_CAPACITY: usize = 10_000;

/// Settings for a [`ResumeHandler`](crate::ResumeHandler).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResumeConfig {
    /// First index the allocator hands out.
    pub first_ticket_index: i64,

    /// Number of most recently issued tickets that remain redeemable.
    pub capacity: usize,

    /// Format byte written into every ticket envelope.
    pub ticket_header: u8,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            first_ticket_index: 0,
            capacity: DEFAULT_TICKET_CAPACITY,
            ticket_header: DEFAULT_TICKET_HEADER,
        }
    }
}

impl ResumeConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 || self.capacity > MAX_TICKET_CAPACITY {
            return Err(ProtocolError::InvalidConfig(format!(
                "capacity must be between 1 and {}, got {}",
                MAX_TICKET_CAPACITY, self.capacity
            )));
        }

        if self.first_ticket_index == i64::MAX {
            return Err(ProtocolError::InvalidConfig(
                "first_ticket_index leaves no index to issue".to_string(),
            ));
        }

        Ok(())
    }
}
