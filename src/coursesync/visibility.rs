//! Availability/visibility encoding.
//!
//! Callers describe visibility with two loose inputs: an optional "available
//! from" time and a visible flag. [`encode`] turns that pair into the single
//! [`Visibility`] predicate stored on the element:
//!
//! | time    | visible | result                                   |
//! |---------|---------|------------------------------------------|
//! | `Some`  | any     | `From { at, show_when_unmet: visible }`  |
//! | `None`  | `false` | `Hidden`                                 |
//! | `None`  | `true`  | `Always`                                 |
//!
//! With a time condition the flag does not hide the element; it decides
//! whether viewers see a greyed-out placeholder before the date passes.

use crate::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Always,
    Hidden,
    From {
        at: DateTime<Utc>,
        show_when_unmet: bool,
    },
}

pub fn encode(time: Option<DateTime<Utc>>, visible: bool) -> Visibility {
    match time {
        Some(at) => Visibility::From {
            at,
            show_when_unmet: visible,
        },
        None if !visible => Visibility::Hidden,
        None => Visibility::Always,
    }
}

impl Visibility {
    /// Whether the element is listed at all for non-privileged viewers.
    pub fn is_listed(&self) -> bool {
        !matches!(self, Visibility::Hidden)
    }

    /// Whether a non-privileged viewer can open the element at `now`.
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            Visibility::Always => true,
            Visibility::Hidden => false,
            Visibility::From { at, .. } => now >= *at,
        }
    }

    /// The conjunctive date-condition document for time-gated visibility.
    ///
    /// Returns `None` for the unconditional variants, which are expressed by
    /// the element's visible bit instead of a condition tree.
    pub fn availability_document(&self) -> Option<Value> {
        match self {
            Visibility::From {
                at,
                show_when_unmet,
            } => Some(json!({
                "op": "&",
                "c": [{ "type": "date", "d": ">=", "t": at.timestamp() }],
                "showc": [show_when_unmet],
            })),
            _ => None,
        }
    }
}

/// Parse a transport-level visible flag.
pub fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(SyncError::validation(format!(
            "visible must be true or false, got '{}'",
            other
        ))),
    }
}

/// Parse a transport-level availability time: unix seconds or RFC 3339.
pub fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| SyncError::validation(format!("time {} is out of range", secs)));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| {
            SyncError::validation(format!(
                "time must be unix seconds or RFC 3339, got '{}'",
                raw
            ))
        })
}
