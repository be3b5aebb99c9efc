// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing and display of operator-entered publish times.
//!
//! Operators type local wall-clock times; everything past this module is a
//! UTC instant. The configured zone only matters here and when formatting
//! times back to the operator.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Wire format for publish times, both input and display.
pub const SCHEDULE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Human rendering of [`SCHEDULE_FORMAT`] for prompts and usage messages.
pub const SCHEDULE_FORMAT_HUMAN: &str = "DD.MM.YYYY HH:MM";

#[derive(Debug, Error)]
pub enum ScheduleParseError {
    #[error("invalid date format: {0}")]
    Format(#[from] chrono::format::ParseError),

    /// The wall-clock time falls into a DST gap for the zone.
    #[error("time does not exist in zone {0}")]
    NonexistentLocalTime(Tz),
}

/// Parse `input` as a local wall-clock time in `zone` into a UTC instant.
///
/// Ambiguous times (DST fold) resolve to the earlier instant.
pub fn parse_publish_at(input: &str, zone: Tz) -> Result<DateTime<Utc>, ScheduleParseError> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), SCHEDULE_FORMAT)?;
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(at) => Ok(at.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _) => Ok(earlier.with_timezone(&Utc)),
        LocalResult::None => Err(ScheduleParseError::NonexistentLocalTime(zone)),
    }
}

/// Format a UTC instant as local wall-clock time in `zone`.
pub fn format_local(at: DateTime<Utc>, zone: Tz) -> String {
    at.with_timezone(&zone).format(SCHEDULE_FORMAT).to_string()
}
