//! Wire model for publication-message responses.
//!
//! The remote service answers with
//!
//! ```text
//! { "messages": { "<version>": [ { "content": { ...PublicationMessage } } ] } }
//! ```
//!
//! Everything here is deserialized once per response and never mutated.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Wrapper the source system puts around each message inside a version bucket.
///
/// Sibling fields other than `content` are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub content: PublicationMessage,
}

/// One trade-publication message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationMessage {
    /// Unique within a single response.
    pub key: String,
    pub position: Position,
    pub event_details: EventDetails,
    #[serde(rename = "messageTimestampUTC")]
    pub message_timestamp_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub business_event: BusinessEvent,
    pub life_cycle_events: Vec<LifecycleEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessEvent {
    #[serde(rename = "type")]
    pub event_type: String,
}

/// A single-key label object such as `{"CREATED": true}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LifecycleEvent(Map<String, Value>);

impl LifecycleEvent {
    /// Build a lifecycle marker with the conventional `true` payload.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(name.into(), Value::Bool(true));
        Self(map)
    }

    /// The stage name, i.e. the object's (first) key.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.keys().next().map(String::as_str)
    }
}

/// All envelopes of one version key.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionBucket {
    pub version: String,
    pub envelopes: Vec<MessageEnvelope>,
}

/// Mapping from version identifier to its envelopes.
///
/// Buckets are held in traversal order: numeric version keys ascending, then
/// any non-numeric keys lexicographically. Flattening follows this order, so it
/// decides how equal timestamps are ordered downstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionedMessageSet {
    buckets: Vec<VersionBucket>,
}

impl VersionedMessageSet {
    #[must_use]
    pub fn new(buckets: BTreeMap<String, Vec<MessageEnvelope>>) -> Self {
        let mut buckets: Vec<VersionBucket> = buckets
            .into_iter()
            .map(|(version, envelopes)| VersionBucket { version, envelopes })
            .collect();
        buckets.sort_by(|a, b| version_order(&a.version, &b.version));
        Self { buckets }
    }

    #[must_use]
    pub fn buckets(&self) -> &[VersionBucket] {
        &self.buckets
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.envelopes.is_empty())
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.envelopes.len()).sum()
    }

    /// Every message payload, bucket by bucket, in traversal order.
    pub fn messages(&self) -> impl Iterator<Item = &PublicationMessage> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.envelopes.iter().map(|envelope| &envelope.content))
    }
}

impl<'de> Deserialize<'de> for VersionedMessageSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<String, Vec<MessageEnvelope>>::deserialize(deserializer).map(Self::new)
    }
}

impl Serialize for VersionedMessageSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for bucket in &self.buckets {
            map.serialize_entry(&bucket.version, &bucket.envelopes)?;
        }
        map.end()
    }
}

/// Order version keys the way a JavaScript object enumerates them: integer
/// keys ascending numerically, then string keys.
#[must_use]
pub fn version_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// The structured failure value handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
