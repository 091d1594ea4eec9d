//! Open/closed evaluation for posted weekly hours.
//!
//! Hours tables come from loosely-shaped documents and use one of two day-key
//! conventions: full weekday names (`"Monday"`) or grouped keys (`"M-F"`,
//! `"Sat"`, `"Sun"`). Ranges look like `"8am - 10:30pm"`. Anything missing or
//! malformed evaluates to closed.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{Datelike, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Label shown for a day without usable hours.
pub const CLOSED_LABEL: &str = "Closed";

/// Monday through Sunday, in display order.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Full English name of a weekday, as used for named hours keys.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// ==================== Day Keys ====================

/// Grouped day keys where Monday to Friday share one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayGroup {
    Weekdays,
    Saturday,
    Sunday,
}

impl DayGroup {
    pub fn of(day: Weekday) -> Self {
        match day {
            Weekday::Sat => DayGroup::Saturday,
            Weekday::Sun => DayGroup::Sunday,
            _ => DayGroup::Weekdays,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            DayGroup::Weekdays => "M-F",
            DayGroup::Saturday => "Sat",
            DayGroup::Sunday => "Sun",
        }
    }
}

/// The key under which a day's hours were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayKey {
    Named(Weekday),
    Grouped(DayGroup),
}

impl DayKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayKey::Named(day) => weekday_name(*day),
            DayKey::Grouped(group) => group.key(),
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Errors ====================

/// Why a day's hours could not produce an open window.
///
/// `is_open` folds every variant into `false`; these are only visible through
/// [`WeeklyHours::window_for`] and [`TimeRange::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HoursError {
    #[error("no hours entry for {0}")]
    MissingDayKey(Weekday),
    #[error("closed all day")]
    ClosedAllDay,
    #[error("malformed hours range {0:?}")]
    MalformedRange(String),
    #[error("unparsable time {0:?}")]
    UnparsableTime(String),
}

// ==================== Time Parsing ====================

/// Which end of a range a time string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Open,
    Close,
}

/// Parse `h[:mm](am|pm)` into minutes since midnight.
///
/// A closing time of exactly `12am` means end of day (1440), so a range like
/// `6pm - 12am` stays a same-day window.
pub fn parse_time(input: &str, boundary: Boundary) -> Option<u32> {
    let lowered = input.trim().to_ascii_lowercase();
    let (clock, is_pm) = if let Some(clock) = lowered.strip_suffix("am") {
        (clock, false)
    } else if let Some(clock) = lowered.strip_suffix("pm") {
        (clock, true)
    } else {
        return None;
    };

    let (hour, minute) = match clock.split_once(':') {
        Some((hour, minute)) if minute.len() == 2 => (hour, minute),
        Some(_) => return None,
        None => (clock, "00"),
    };

    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if hour.len() > 2 || !is_digits(hour) || !is_digits(minute) {
        return None;
    }

    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    if !(1..=12).contains(&hour) || minute >= 60 {
        return None;
    }

    let hour = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    let minutes = hour * 60 + minute;

    if boundary == Boundary::Close && minutes == 0 {
        Some(MINUTES_PER_DAY)
    } else {
        Some(minutes)
    }
}

fn format_minutes(minutes: u32, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let minutes = minutes % MINUTES_PER_DAY;
    let (hour, minute) = (minutes / 60, minutes % 60);
    let suffix = if hour < 12 { "am" } else { "pm" };
    let hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    write!(f, "{hour}:{minute:02}{suffix}")
}

// ==================== Time Range ====================

/// An open/close window in minutes since midnight.
///
/// `close <= open` is an overnight window that closes after midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    open: u32,
    close: u32,
}

impl TimeRange {
    pub fn parse(range: &str) -> Result<Self, HoursError> {
        let range = range.trim();
        if range.is_empty() || range.eq_ignore_ascii_case("closed") {
            return Err(HoursError::ClosedAllDay);
        }

        let parts: Vec<&str> = range.split('-').map(str::trim).collect();
        let &[open, close] = parts.as_slice() else {
            return Err(HoursError::MalformedRange(range.to_string()));
        };
        if open.is_empty() || close.is_empty() {
            return Err(HoursError::MalformedRange(range.to_string()));
        }

        let open = parse_time(open, Boundary::Open)
            .ok_or_else(|| HoursError::UnparsableTime(open.to_string()))?;
        let close = parse_time(close, Boundary::Close)
            .ok_or_else(|| HoursError::UnparsableTime(close.to_string()))?;

        Ok(Self { open, close })
    }

    pub fn open(&self) -> u32 {
        self.open
    }

    pub fn close(&self) -> u32 {
        self.close
    }

    pub fn is_overnight(&self) -> bool {
        self.close <= self.open
    }

    /// Half-open containment: open at the opening minute, closed at the
    /// closing minute.
    pub fn contains(&self, minute: u32) -> bool {
        if self.is_overnight() {
            minute >= self.open || minute < self.close
        } else {
            (self.open..self.close).contains(&minute)
        }
    }
}

impl FromStr for TimeRange {
    type Err = HoursError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_minutes(self.open, f)?;
        f.write_str(" - ")?;
        format_minutes(self.close, f)
    }
}

// ==================== Weekly Hours ====================

/// Day key to range string, e.g. `{"M-F": "8am - 6pm", "Sun": "Closed"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyHours(BTreeMap<String, String>);

impl WeeklyHours {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, range: impl Into<String>) -> Self {
        self.insert(key, range);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, range: impl Into<String>) {
        self.0.insert(key.into(), range.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Find the entry for a weekday: the full name first, then the grouped key.
    pub fn resolve(&self, day: Weekday) -> Option<(DayKey, &str)> {
        [DayKey::Named(day), DayKey::Grouped(DayGroup::of(day))]
            .into_iter()
            .find_map(|key| self.0.get(key.as_str()).map(|range| (key, range.as_str())))
    }

    pub fn window_for(&self, day: Weekday) -> Result<TimeRange, HoursError> {
        let (_, range) = self.resolve(day).ok_or(HoursError::MissingDayKey(day))?;
        TimeRange::parse(range)
    }

    /// Text to display for a day: the posted range, or `"Closed"`.
    pub fn label_for(&self, day: Weekday) -> &str {
        match self.resolve(day) {
            Some((_, range)) if !range.trim().is_empty() => range,
            _ => CLOSED_LABEL,
        }
    }

    pub fn is_open<T: Datelike + Timelike>(&self, at: &T) -> bool {
        is_open(self, at)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for WeeklyHours {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

pub fn minutes_since_midnight<T: Timelike>(at: &T) -> u32 {
    at.hour() * 60 + at.minute()
}

/// Whether a location with these hours is open at a local wall-clock instant.
///
/// Uses the instant's weekday and minute of day only; the caller localizes.
/// Missing or malformed data is closed, never an error.
pub fn is_open<T: Datelike + Timelike>(hours: &WeeklyHours, at: &T) -> bool {
    match hours.window_for(at.weekday()) {
        Ok(window) => window.contains(minutes_since_midnight(at)),
        Err(reason) => {
            tracing::trace!(%reason, "treating location as closed");
            false
        }
    }
}
