//! Response normalization.
//!
//! Turns the raw response body into the shape a consumer asks for. The input
//! is treated as untrusted: anything that does not match the expected schema
//! degrades to an empty result instead of an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::model::{VersionedMessageSet, version_order};

/// Where the message key lives inside each element of a version bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyAccessor {
    /// `element.content.key`, the shape the table consumes.
    #[default]
    Content,
    /// `element.key`, for responses that deliver bare messages.
    Envelope,
}

impl KeyAccessor {
    fn key_of<'a>(self, element: &'a Value) -> Option<&'a str> {
        let holder = match self {
            Self::Content => element.get("content")?,
            Self::Envelope => element,
        };
        holder.get("key")?.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMode {
    KeySummary(KeyAccessor),
    FullTable,
}

/// The message keys of one version, in bucket order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionKeys {
    pub version: String,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    KeySummary(Vec<VersionKeys>),
    FullTable(VersionedMessageSet),
}

#[must_use]
pub fn normalize(raw: &Value, mode: NormalizeMode) -> Normalized {
    match mode {
        NormalizeMode::KeySummary(accessor) => Normalized::KeySummary(summarize_keys(raw, accessor)),
        NormalizeMode::FullTable => Normalized::FullTable(versioned_set(raw)),
    }
}

/// Per-version key lists. Elements without a string key are skipped and a
/// bucket that is not an array yields no keys.
#[must_use]
pub fn summarize_keys(raw: &Value, accessor: KeyAccessor) -> Vec<VersionKeys> {
    let Some(messages) = raw.get("messages").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut summary: Vec<VersionKeys> = messages
        .iter()
        .map(|(version, bucket)| {
            let elements = bucket.as_array().map(Vec::as_slice).unwrap_or_default();
            let keys = elements
                .iter()
                .enumerate()
                .filter_map(|(index, element)| {
                    let key = accessor.key_of(element);
                    if key.is_none() {
                        warn!(version = %version, index, ?accessor, "message has no key; skipped");
                    }
                    key.map(ToOwned::to_owned)
                })
                .collect();

            VersionKeys {
                version: version.clone(),
                keys,
            }
        })
        .collect();

    summary.sort_by(|a, b| version_order(&a.version, &b.version));
    summary
}

/// The typed message set, or the empty set when `messages` is absent or does
/// not match the schema.
#[must_use]
pub fn versioned_set(raw: &Value) -> VersionedMessageSet {
    let Some(messages) = raw.get("messages") else {
        return VersionedMessageSet::default();
    };

    match VersionedMessageSet::deserialize(messages) {
        Ok(set) => set,
        Err(err) => {
            warn!(error = %err, "response messages do not match the expected schema; treating as empty");
            VersionedMessageSet::default()
        }
    }
}
