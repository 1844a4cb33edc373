//! Host-side session resumption.
//!
//! [`ResumeHost`] wraps a [`ResumeHandler`] with the state a long-running
//! server needs: a ticket key that survives restarts and a persisted index
//! watermark. Indices are reserved on disk in blocks before they are issued,
//! so a restart never reissues an index (and never reuses an AEAD nonce).
//! Outstanding tickets do not survive a restart; clients holding one fall
//! back to a full handshake.

use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use tessera_protocol::{
    EncryptedTicketData, ResumeConfig, ResumeHandler, TicketData, HOST_DATA_SIZE,
};

use crate::config::Config;
use crate::key_store::{load_or_generate_ticket_key, TICKET_KEY_FILE};
use crate::watermark::{WatermarkStore, WATERMARK_FILE};

/// Resume ticket service for one host.
///
/// The inner handler is never handed out: every issue must pass through
/// [`ResumeHost::issue_ticket`] so the index is covered by the watermark.
#[derive(Debug)]
pub struct ResumeHost {
    handler: ResumeHandler,
    watermark: WatermarkStore,
    /// First index not yet covered by the on-disk watermark.
    reserved_until: Mutex<i64>,
    reserve_block: i64,
    key_fingerprint: String,
}

impl ResumeHost {
    /// Opens the host state under `config.host.data_dir`.
    ///
    /// Loads or creates the ticket key, resumes issuing at the persisted
    /// watermark (or the configured first index, whichever is higher) and
    /// reserves the first block.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let data_dir = &config.host.data_dir;
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let key = load_or_generate_ticket_key(&data_dir.join(TICKET_KEY_FILE))?;
        let watermark = WatermarkStore::new(data_dir.join(WATERMARK_FILE));

        let configured_first = config.resume.first_ticket_index;
        let first = match watermark.load()? {
            Some(persisted) if persisted > configured_first => persisted,
            _ => configured_first,
        };

        let reserve_block = i64::try_from(config.persistence.reserve_block).unwrap_or(i64::MAX);
        let reserved_until = first.saturating_add(reserve_block);
        watermark.save(reserved_until)?;

        let resume = ResumeConfig {
            first_ticket_index: first,
            ..config.resume.clone()
        };
        let handler = ResumeHandler::from_config(&key, &resume)
            .context("Failed to create resume handler")?;

        tracing::info!(
            key = %key.fingerprint(),
            first_ticket_index = first,
            capacity = resume.capacity,
            reserved_until,
            "Resume host ready"
        );

        Ok(Self {
            handler,
            watermark,
            reserved_until: Mutex::new(reserved_until),
            reserve_block,
            key_fingerprint: key.fingerprint(),
        })
    }

    /// Issues a ticket, extending the on-disk reservation first if needed.
    pub fn issue_ticket(
        &self,
        session: &TicketData,
        host_data: [u8; HOST_DATA_SIZE],
    ) -> Result<EncryptedTicketData> {
        // Held across the issue so no index escapes the reservation
        let mut reserved_until = self
            .reserved_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let next = self.handler.allocator().next_index();
        if next >= *reserved_until && *reserved_until < i64::MAX {
            let extended = next.saturating_add(self.reserve_block);
            self.watermark
                .save(extended)
                .context("Failed to extend ticket index reservation")?;
            tracing::debug!(from = *reserved_until, to = extended, "Extended index reservation");
            *reserved_until = extended;
        }

        self.handler
            .issue_ticket(session, host_data)
            .context("Failed to issue resume ticket")
    }

    /// Checks and redeems a presented ticket.
    ///
    /// Rejections are always [`ProtocolError::InvalidTicket`](tessera_protocol::ProtocolError::InvalidTicket).
    pub fn check_ticket(&self, ticket: &EncryptedTicketData) -> tessera_protocol::Result<TicketData> {
        self.handler.check_ticket(ticket)
    }

    /// The index the next issued ticket will carry.
    pub fn next_index(&self) -> i64 {
        self.handler.allocator().next_index()
    }

    /// Number of recent tickets that stay redeemable.
    pub fn capacity(&self) -> usize {
        self.handler.allocator().capacity()
    }

    /// Format byte written into every issued ticket.
    pub fn ticket_header(&self) -> u8 {
        self.handler.ticket_header()
    }

    /// Whether `index` was issued by this process and is still redeemable.
    pub fn is_valid(&self, index: i64) -> bool {
        self.handler.allocator().is_valid(index)
    }

    /// Fingerprint of the ticket key, safe to log or display.
    pub fn key_fingerprint(&self) -> &str {
        &self.key_fingerprint
    }

    /// First index not covered by the persisted watermark.
    pub fn reserved_until(&self) -> i64 {
        *self
            .reserved_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
