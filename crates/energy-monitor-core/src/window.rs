// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Energy Monitor.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! History window resolution.
//!
//! Accepted timestamp forms:
//! - RFC 3339 with offset (`2025-10-01T08:00:00+02:00`, `2025-10-01T06:00:00Z`)
//! - the same with a space instead of `T`
//! - naive date-time, interpreted in the configured zone
//! - date only, filled to the first (start) or last (end) second of that day

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{MonitorError, MonitorResult};
use crate::settings::ApiSettings;

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Which end of the window a timestamp describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

impl Boundary {
    fn fill_day(self, date: NaiveDate) -> Option<NaiveDateTime> {
        match self {
            Self::Start => date.and_hms_opt(0, 0, 0),
            Self::End => date.and_hms_opt(23, 59, 59),
        }
    }
}

/// Parse a user supplied timestamp into UTC
pub fn parse_timestamp(
    raw: &str,
    boundary: Boundary,
    timezone: Tz,
) -> MonitorResult<DateTime<Utc>> {
    let raw = raw.trim();
    let invalid = || MonitorError::InvalidParameter(format!("Invalid date format: {raw}"));

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| boundary.fill_day(date))
        })
        .ok_or_else(invalid)?;

    // Wall-clock times skipped by a DST jump have no instant
    timezone
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(invalid)
}

/// Closed time range of a history query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// Resolve the query parameters into a window.
    ///
    /// `days` is validated whenever it is given but only used when `start`
    /// is absent. A missing `end` means `now`.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        days: Option<&str>,
        settings: &ApiSettings,
        now: DateTime<Utc>,
    ) -> MonitorResult<Self> {
        let days = match days.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => parse_days(raw, settings.max_days)?,
            None => settings.default_days,
        };

        let end = match end.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => parse_timestamp(raw, Boundary::End, settings.timezone)?,
            None => now,
        };

        let start = match start.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => parse_timestamp(raw, Boundary::Start, settings.timezone)?,
            None => end - Duration::days(i64::from(days)),
        };

        if start >= end {
            return Err(MonitorError::InvalidParameter(format!(
                "start ({}) must be before end ({})",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }

        Ok(Self { start, end })
    }
}

fn parse_days(raw: &str, max_days: u32) -> MonitorResult<u32> {
    let days: i64 = raw.parse().map_err(|_| {
        MonitorError::InvalidParameter(format!("days must be an integer, got '{raw}'"))
    })?;

    u32::try_from(days)
        .ok()
        .filter(|days| (1..=max_days).contains(days))
        .ok_or_else(|| {
            MonitorError::InvalidParameter(format!("days must be between 1 and {max_days}"))
        })
}
