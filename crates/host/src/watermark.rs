//! Persisted ticket index watermark.
//!
//! The watermark is the first index the host has *not* reserved. Every index
//! below it may already have been used as a ticket nonce, so a restarted
//! host must never issue below it.
//!
//! Stored as JSON: `{ "version": 1, "next_index": 2048 }`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name of the watermark inside the data directory.
pub const WATERMARK_FILE: &str = "ticket_index.json";

const WATERMARK_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct WatermarkData {
    version: u32,
    next_index: i64,
}

/// JSON file holding the ticket index watermark.
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the watermark, or None if it has never been written.
    pub fn load(&self) -> Result<Option<i64>> {
        if !self.path.exists() {
            tracing::debug!("Watermark file not found at {:?}", self.path);
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read watermark: {}", self.path.display()))?;

        let data: WatermarkData = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse watermark: {}", self.path.display()))?;

        if data.version != WATERMARK_VERSION {
            anyhow::bail!(
                "Unsupported watermark version {} in {}",
                data.version,
                self.path.display()
            );
        }

        tracing::debug!(next_index = data.next_index, "Loaded watermark from {:?}", self.path);
        Ok(Some(data.next_index))
    }

    /// Writes the watermark atomically (temp file, then rename).
    pub fn save(&self, next_index: i64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create watermark directory: {}", parent.display())
            })?;
        }

        let data = WatermarkData {
            version: WATERMARK_VERSION,
            next_index,
        };
        let contents =
            serde_json::to_string_pretty(&data).context("Failed to serialize watermark")?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &contents).with_context(|| {
            format!("Failed to write temp watermark: {}", temp_path.display())
        })?;

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename temp watermark {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        tracing::debug!(next_index, "Saved watermark to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_watermark() {
        let temp_dir = TempDir::new().unwrap();
        let store = WatermarkStore::new(temp_dir.path().join(WATERMARK_FILE));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = WatermarkStore::new(temp_dir.path().join("sub").join(WATERMARK_FILE));

        store.save(2048).unwrap();
        assert_eq!(store.load().unwrap(), Some(2048));

        store.save(-7).unwrap();
        assert_eq!(store.load().unwrap(), Some(-7));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_watermark() {
        let temp_dir = TempDir::new().unwrap();
        let store = WatermarkStore::new(temp_dir.path().join(WATERMARK_FILE));
        fs::write(store.path(), "{ not json").unwrap();

        let err = store.load().unwrap_err().to_string();
        assert!(err.contains("Failed to parse watermark"));
    }

    #[test]
    fn test_unsupported_version() {
        let temp_dir = TempDir::new().unwrap();
        let store = WatermarkStore::new(temp_dir.path().join(WATERMARK_FILE));
        fs::write(store.path(), r#"{"version": 9, "next_index": 1}"#).unwrap();

        assert!(store.load().is_err());
    }
}
