use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::models::task::TaskRecord;
use crate::models::time_entry::TimeEntryRecord;

pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// RFC 3339 first; a zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

pub fn parse_record_datetime(value: &Option<String>) -> Option<DateTime<Utc>> {
    value.as_deref().and_then(parse_timestamp)
}

pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

pub fn created_date(task: &TaskRecord, tz: Tz) -> Option<NaiveDate> {
    parse_record_datetime(&task.created_at).map(|dt| local_date(dt, tz))
}

/// Day a completed task is credited to: `completed_at`, else `created_at`.
pub fn completion_date(task: &TaskRecord, tz: Tz) -> Option<NaiveDate> {
    if !task.is_completed() {
        return None;
    }
    parse_record_datetime(&task.completed_at)
        .or_else(|| parse_record_datetime(&task.created_at))
        .map(|dt| local_date(dt, tz))
}

pub fn entry_start(entry: &TimeEntryRecord) -> Option<DateTime<Utc>> {
    parse_timestamp(&entry.start_time)
}

pub fn duration_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_milliseconds().max(0)
}

/// Open (or unreadable) ends are measured against `now`.
pub fn entry_duration_ms(entry: &TimeEntryRecord, now: DateTime<Utc>) -> Option<i64> {
    let start = entry_start(entry)?;
    let end = parse_record_datetime(&entry.end_time).unwrap_or(now);
    Some(duration_ms(start, end))
}

/// Only entries with both ends readable.
pub fn closed_entry_duration_ms(entry: &TimeEntryRecord) -> Option<i64> {
    let start = entry_start(entry)?;
    let end = parse_record_datetime(&entry.end_time)?;
    Some(duration_ms(start, end))
}

pub fn ms_to_hours(ms: i64) -> f64 {
    ms as f64 / MS_PER_HOUR
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
