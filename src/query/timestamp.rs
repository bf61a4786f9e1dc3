use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Result, TentlyError};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d %b %Y", "%d %B %Y", "%d/%m/%Y"];
// Seed data carries day-month stamps without a year ("25 Jan, 10:40 PM").
const YEARLESS_DATETIME_FORMATS: &[&str] = &["%Y %d %b, %I:%M %p", "%Y %d %b %I:%M %p"];
const YEARLESS_DATE_FORMATS: &[&str] = &["%Y %d %b", "%Y %d %B"];

/// Parse a free-form record timestamp. Stamps without a year are placed in
/// `default_year`.
pub fn parse_timestamp(raw: &str, default_year: i32) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    let with_year = format!("{default_year} {raw}");
    for fmt in YEARLESS_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&with_year, fmt) {
            return Some(dt);
        }
    }
    for fmt in YEARLESS_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&with_year, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Parse a `YYYY-MM-DD` boundary given on the command line.
pub fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| TentlyError::InvalidDate(raw.to_string()))
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub const RANGE_PRESETS: &[&str] = &["today", "yesterday", "this-week", "last-week", "last-month"];

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let day = at.date();
        self.from <= day && day <= self.to
    }

    /// Named ranges relative to `today`. Weeks start on Monday.
    pub fn preset(id: &str, today: NaiveDate) -> Option<Self> {
        let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        match id {
            "today" => Some(Self::new(today, today)),
            "yesterday" => {
                let y = today - Duration::days(1);
                Some(Self::new(y, y))
            }
            "this-week" => Some(Self::new(week_start, today)),
            "last-week" => Some(Self::new(
                week_start - Duration::days(7),
                week_start - Duration::days(1),
            )),
            "last-month" => {
                let first_this_month = today.with_day(1)?;
                let last_prev = first_this_month - Duration::days(1);
                Some(Self::new(last_prev.with_day(1)?, last_prev))
            }
            _ => None,
        }
    }
}
