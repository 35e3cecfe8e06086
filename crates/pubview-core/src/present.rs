//! Message table presentation.
//!
//! Flattens a [`VersionedMessageSet`] into display rows ordered by message
//! timestamp, then derives the alias, lifecycle summary, formatted timestamp
//! and delta columns.
//!
//! # Invariants
//!
//! - Rows are ordered by `messageTimestampUTC` ascending; equal timestamps
//!   keep flattening order.
//! - The alias is a function of row position only.
//! - Row 0 always has a delta of `0ms`.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{LifecycleEvent, PublicationMessage, VersionedMessageSet};

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Fixed rendering pattern for the timestamp column (`HH:MM:SS.mmm`).
pub const TIMESTAMP_PATTERN: &str = "%H:%M:%S%.3f";

/// One line of the audit table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    pub alias: String,
    pub version: i64,
    pub business_event_type: String,
    pub lifecycle_summary: String,
    pub key: String,
    pub formatted_timestamp: String,
    pub delta_from_previous: String,
    #[serde(rename = "messageTimestampUTC")]
    pub message_timestamp_utc: DateTime<Utc>,
}

/// Zone used when rendering the timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    #[default]
    Utc,
    Local,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Presenter {
    zone: TimeZoneMode,
}

impl Presenter {
    #[must_use]
    pub const fn new(zone: TimeZoneMode) -> Self {
        Self { zone }
    }

    #[must_use]
    pub fn present(&self, set: &VersionedMessageSet) -> Vec<DisplayRow> {
        let mut messages: Vec<&PublicationMessage> = set.messages().collect();
        // `sort_by_key` is stable, so equal timestamps keep flattening order.
        messages.sort_by_key(|msg| msg.message_timestamp_utc);

        let mut previous: Option<DateTime<Utc>> = None;
        messages
            .into_iter()
            .enumerate()
            .map(|(index, msg)| {
                let ts = msg.message_timestamp_utc;
                let delta_ms = previous.map_or(0, |prev| (ts - prev).num_milliseconds().max(0));
                previous = Some(ts);

                DisplayRow {
                    alias: alias_for(index),
                    version: msg.position.version,
                    business_event_type: msg.event_details.business_event.event_type.clone(),
                    lifecycle_summary: lifecycle_summary(&msg.event_details.life_cycle_events),
                    key: msg.key.clone(),
                    formatted_timestamp: self.format_timestamp(ts),
                    delta_from_previous: format_delta(delta_ms),
                    message_timestamp_utc: ts,
                }
            })
            .collect()
    }

    #[must_use]
    pub fn format_timestamp(&self, ts: DateTime<Utc>) -> String {
        match self.zone {
            TimeZoneMode::Utc => ts.format(TIMESTAMP_PATTERN).to_string(),
            TimeZoneMode::Local => ts.with_timezone(&Local).format(TIMESTAMP_PATTERN).to_string(),
        }
    }
}

/// Present with UTC timestamps.
#[must_use]
pub fn present(set: &VersionedMessageSet) -> Vec<DisplayRow> {
    Presenter::default().present(set)
}

/// Position label: `a`..`z`, then `aa`, `ab`, ... where the first letter is
/// `a + floor(i / 26) - 1`.
///
/// The closed form is kept past `zz` (position 701), so later positions start
/// with code points beyond `z`.
#[must_use]
pub fn alias_for(index: usize) -> String {
    const BASE: u32 = 'a' as u32;

    let index = u32::try_from(index).unwrap_or(u32::MAX);
    let letter = |code: u32| char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);

    if index < 26 {
        return letter(BASE + index).to_string();
    }

    let first = letter(BASE.saturating_add(index / 26 - 1));
    let second = letter(BASE + index % 26);
    [first, second].iter().collect()
}

/// Stage names joined with `", "` in their original order.
#[must_use]
pub fn lifecycle_summary(events: &[LifecycleEvent]) -> String {
    events
        .iter()
        .filter_map(LifecycleEvent::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render an elapsed time in milliseconds with an adaptive unit.
///
/// Negative input is clamped to zero.
#[must_use]
pub fn format_delta(delta_ms: i64) -> String {
    let ms = delta_ms.max(0);
    if ms < MILLIS_PER_SECOND {
        format!("{ms}ms")
    } else if ms < MILLIS_PER_MINUTE {
        format!("{}s", fixed_two(ms, MILLIS_PER_SECOND))
    } else if ms < MILLIS_PER_HOUR {
        format!("{}m", fixed_two(ms, MILLIS_PER_MINUTE))
    } else {
        format!("{}h", fixed_two(ms, MILLIS_PER_HOUR))
    }
}

/// `ms / unit` with two decimals, rounded like `Number.prototype.toFixed(2)`:
/// the quotient is an `f64` and its exact binary value is rounded, ties up.
/// So 1005 ms is `1.00` because `1.005_f64` sits just below the tie.
#[allow(clippy::cast_precision_loss)]
fn fixed_two(ms: i64, unit: i64) -> String {
    let hundredths = round_hundredths(ms as f64 / unit as f64);
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

/// Nearest integer to `100 * x` for a positive finite `x`, with ties going up.
fn round_hundredths(x: f64) -> u128 {
    let bits = x.to_bits();
    let biased = i64::try_from((bits >> 52) & 0x7ff).unwrap_or_default();
    let fraction = bits & ((1 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1 << 52), biased - 1075)
    };

    // x * 100 == mantissa * 100 * 2^exponent exactly.
    let scaled = u128::from(mantissa) * 100;
    if exponent >= 0 {
        let shift = u32::try_from(exponent).unwrap_or(u32::MAX);
        return scaled.checked_shl(shift).unwrap_or(u128::MAX);
    }

    let shift = u32::try_from(-exponent).unwrap_or(u32::MAX);
    if shift >= u128::BITS {
        return 0;
    }
    let whole = scaled >> shift;
    let remainder = scaled - (whole << shift);
    if remainder >= 1 << (shift - 1) {
        whole + 1
    } else {
        whole
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set_from(raw: serde_json::Value) -> VersionedMessageSet {
        serde_json::from_value(raw).unwrap()
    }

    fn envelope(key: &str, ts: &str, events: &[&str]) -> serde_json::Value {
        let events: Vec<_> = events
            .iter()
            .map(|e| serde_json::to_value(LifecycleEvent::named(*e)).unwrap())
            .collect();
        json!({
            "content": {
                "key": key,
                "position": { "version": 1 },
                "eventDetails": {
                    "businessEvent": { "type": "NEW" },
                    "lifeCycleEvents": events
                },
                "messageTimestampUTC": ts
            }
        })
    }

    #[test]
    fn alias_known_positions() {
        assert_eq!(alias_for(0), "a");
        assert_eq!(alias_for(25), "z");
        assert_eq!(alias_for(26), "aa");
        assert_eq!(alias_for(27), "ab");
        assert_eq!(alias_for(51), "az");
        assert_eq!(alias_for(52), "ba");
        assert_eq!(alias_for(701), "zz");
    }

    #[test]
    fn alias_continues_closed_form_past_zz() {
        assert_eq!(alias_for(702), "{a");
    }

    #[test]
    fn delta_boundaries() {
        assert_eq!(format_delta(0), "0ms");
        assert_eq!(format_delta(999), "999ms");
        assert_eq!(format_delta(1_000), "1.00s");
        assert_eq!(format_delta(1_234), "1.23s");
        assert_eq!(format_delta(59_999), "60.00s");
        assert_eq!(format_delta(60_000), "1.00m");
        assert_eq!(format_delta(90_000), "1.50m");
        assert_eq!(format_delta(3_599_999), "60.00m");
        assert_eq!(format_delta(3_600_000), "1.00h");
        assert_eq!(format_delta(5_400_000), "1.50h");
        assert_eq!(format_delta(-5), "0ms");
    }

    #[test]
    fn delta_rounds_like_binary_to_fixed() {
        assert_eq!(format_delta(1_004), "1.00s");
        assert_eq!(format_delta(1_005), "1.00s");
        assert_eq!(format_delta(1_015), "1.01s");
        assert_eq!(format_delta(1_125), "1.13s");
        assert_eq!(format_delta(2_675), "2.67s");
        assert_eq!(format_delta(61_500), "1.02m");
        assert_eq!(format_delta(5_418_000), "1.50h");
    }

    #[test]
    fn hundredths_of_exact_binary_values() {
        assert_eq!(round_hundredths(0.125), 13);
        assert_eq!(round_hundredths(1.0), 100);
        assert_eq!(round_hundredths(59.999), 6000);
        assert_eq!(round_hundredths(1.005), 100);
    }

    #[test]
    fn lifecycle_summary_keeps_event_order() {
        let events = vec![
            LifecycleEvent::named("VALIDATED"),
            LifecycleEvent::named("CREATED"),
            LifecycleEvent::named("ARCHIVED"),
        ];
        assert_eq!(lifecycle_summary(&events), "VALIDATED, CREATED, ARCHIVED");
        assert_eq!(lifecycle_summary(&[]), "");
    }

    #[test]
    fn rows_sorted_by_timestamp_across_versions() {
        let set = set_from(json!({
            "1": [ envelope("late", "2024-01-01T00:00:05.000Z", &["CREATED"]) ],
            "2": [ envelope("early", "2024-01-01T00:00:01.000Z", &["UPDATED"]) ]
        }));

        let rows = present(&set);
        let keys: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["early", "late"]);
        assert_eq!(rows[0].alias, "a");
        assert_eq!(rows[1].alias, "b");
        assert_eq!(rows[0].delta_from_previous, "0ms");
        assert_eq!(rows[1].delta_from_previous, "4.00s");
        assert_eq!(rows[1].formatted_timestamp, "00:00:05.000");
    }

    #[test]
    fn equal_timestamps_keep_flattening_order() {
        let ts = "2024-01-01T12:00:00.000Z";
        let set = set_from(json!({
            "1": [ envelope("first", ts, &[]), envelope("second", ts, &[]) ],
            "2": [ envelope("third", ts, &[]) ]
        }));

        let keys: Vec<_> = present(&set).into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_set_presents_no_rows() {
        assert!(present(&VersionedMessageSet::default()).is_empty());
    }

    #[test]
    fn utc_timestamp_uses_millisecond_pattern() {
        let ts = "2024-03-09T23:59:58.007Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(Presenter::new(TimeZoneMode::Utc).format_timestamp(ts), "23:59:58.007");
    }

    #[test]
    fn row_serializes_with_camel_case_fields() {
        let set = set_from(json!({ "1": [ envelope("k1", "2024-01-01T00:00:00.000Z", &["CREATED"]) ] }));
        let value = serde_json::to_value(&present(&set)[0]).unwrap();
        assert_eq!(value["alias"], "a");
        assert_eq!(value["businessEventType"], "NEW");
        assert_eq!(value["lifecycleSummary"], "CREATED");
        assert_eq!(value["deltaFromPrevious"], "0ms");
        assert!(value.get("messageTimestampUTC").is_some());
    }
}
