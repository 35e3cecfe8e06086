//! Local persistence of raw responses, keyed by position id.
//!
//! The core never sees this; commands save what they fetched and `table
//! --cached` reads it back.

use anyhow::{Context as _, Result};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub trait ResponseStore {
    /// Persist the raw response body for `position_id`, replacing any earlier one.
    fn save(&self, position_id: &str, body: &Value) -> Result<PathBuf>;

    /// The stored body for `position_id`, or `None` when nothing was saved.
    fn load(&self, position_id: &str) -> Result<Option<Value>>;
}

/// One `response_<id>.json` file per trimmed position id under `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, position_id: &str) -> PathBuf {
        self.dir.join(format!("response_{}.json", file_safe(position_id)))
    }
}

impl ResponseStore for FileStore {
    fn save(&self, position_id: &str, body: &Value) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create store dir {}", self.dir.display()))?;

        let path = self.path_for(position_id);
        let content = serde_json::to_string_pretty(body)?;
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(position_id, path = %path.display(), "stored raw response");
        Ok(path)
    }

    fn load(&self, position_id: &str) -> Result<Option<Value>> {
        let path = self.path_for(position_id);
        if !path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let body = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(body))
    }
}

/// Percent-encode everything outside `[A-Za-z0-9._-]`, so distinct ids never
/// share a file and no id can name a path separator.
fn file_safe(position_id: &str) -> String {
    let mut encoded = String::with_capacity(position_id.len());
    for byte in position_id.trim().bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            encoded.push(char::from(byte));
        } else {
            push_percent_encoded_byte(&mut encoded, byte);
        }
    }
    encoded
}

fn push_percent_encoded_byte(buffer: &mut String, byte: u8) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    buffer.push('%');
    buffer.push(char::from(HEX[usize::from(byte >> 4)]));
    buffer.push(char::from(HEX[usize::from(byte & 0x0F)]));
}
