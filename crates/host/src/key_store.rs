//! Ticket key file handling.
//!
//! The key is stored as 32 raw bytes. Losing the file invalidates every
//! outstanding ticket, which is safe: clients fall back to a full handshake.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tessera_protocol::{TicketKey, TICKET_KEY_SIZE};
use zeroize::Zeroize;

/// File name of the ticket key inside the data directory.
pub const TICKET_KEY_FILE: &str = "ticket.key";

/// Loads the ticket key at `path`, generating and saving one if absent.
pub fn load_or_generate_ticket_key(path: &Path) -> Result<TicketKey> {
    if path.exists() {
        let mut bytes = fs::read(path)
            .with_context(|| format!("Failed to read ticket key file: {}", path.display()))?;
        if bytes.len() != TICKET_KEY_SIZE {
            let len = bytes.len();
            bytes.zeroize();
            anyhow::bail!(
                "Invalid ticket key file: expected {} bytes, got {}",
                TICKET_KEY_SIZE,
                len
            );
        }

        let mut key = [0u8; TICKET_KEY_SIZE];
        key.copy_from_slice(&bytes);
        bytes.zeroize();
        let key = TicketKey::from_bytes(key);

        tracing::debug!(fingerprint = %key.fingerprint(), "Loaded ticket key from {:?}", path);
        Ok(key)
    } else {
        let key = TicketKey::generate();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        write_private(path, key.as_bytes())?;

        tracing::info!(
            fingerprint = %key.fingerprint(),
            "Generated new ticket key and saved to {:?}",
            path
        );
        Ok(key)
    }
}

/// Writes `bytes` to a fresh owner-only temp file, then renames it over `path`.
fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("key.tmp");
    if temp_path.exists() {
        fs::remove_file(&temp_path).with_context(|| {
            format!("Failed to remove stale temp key: {}", temp_path.display())
        })?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(&temp_path)
        .with_context(|| format!("Failed to create temp key: {}", temp_path.display()))?;
    file.write_all(bytes)
        .and_then(|()| file.sync_all())
        .with_context(|| format!("Failed to write temp key: {}", temp_path.display()))?;
    drop(file);

    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename temp key {} to {}",
            temp_path.display(),
            path.display()
        )
    })
}
