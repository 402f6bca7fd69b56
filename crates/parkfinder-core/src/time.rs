// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

use crate::ValidationError;
use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Minute step offered by the date/time picker.
pub const PICKER_MINUTE_INCREMENT: u32 = 5;
const SUGGESTION_SLOT_MINUTES: i64 = 15;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A prediction instant must be strictly after `now`.
pub fn validate_future(at: DateTime<Local>, now: DateTime<Local>) -> Result<(), ValidationError> {
    if at > now {
        Ok(())
    } else {
        Err(ValidationError::DateTimeNotInFuture)
    }
}

/// RFC 3339 with the local offset, e.g. `2026-10-15T09:00:00+11:00`.
pub fn to_datetime_iso(at: &DateTime<Local>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// `YYYY-MM-DDTHH:MM`, the format the picker field shows.
pub fn to_local_input(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H:%M").to_string()
}

/// Rounds up to the next quarter hour. Times already on a slot are kept.
pub fn round_to_next_slot(now: DateTime<Local>) -> DateTime<Local> {
    let slot_ms = SUGGESTION_SLOT_MINUTES * 60 * 1000;
    let ms = now.timestamp_millis();
    let rounded = (ms + slot_ms - 1).div_euclid(slot_ms) * slot_ms;
    DateTime::<Utc>::from_timestamp_millis(rounded)
        .map(|dt| dt.with_timezone(&Local))
        .unwrap_or(now)
}

/// Accepts RFC 3339, or a local wall-clock time as `YYYY-MM-DDTHH:MM[:SS]`
/// or `YYYY-MM-DD HH:MM[:SS]`.
pub fn parse_local_datetime(text: &str) -> Result<DateTime<Local>, ValidationError> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Local));
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];
    let naive = FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| ValidationError::UnrecognisedDateTime(text.to_string()))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| ValidationError::NonexistentLocalTime(text.to_string()))
}
