// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and time-derived ids.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Id for a match created at `now`: epoch milliseconds, bumped past
/// `newest_id` when the clock has not advanced beyond it.
pub fn next_match_id(now: DateTime<Utc>, newest_id: Option<i64>) -> i64 {
    let millis = now.timestamp_millis();
    match newest_id {
        Some(newest) if millis <= newest => newest + 1,
        _ => millis,
    }
}
