//! Date and time helpers shared by the views and the schedule form.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Utc, Weekday};

use crate::error::AppError;
use crate::models::Program;

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Parses a datetime as the data API returns it.
///
/// Values with an offset are normalized to UTC; naive values are taken as-is.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime, AppError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| AppError::Parse(format!("Invalid datetime: {}", value)))
}

pub fn parse_time(value: &str) -> Result<NaiveTime, AppError> {
    let value = value.trim();
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| AppError::Parse(format!("Invalid time: {}", value)))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Parse(format!("Invalid date: {}", value)))
}

/// `"14:05"` -> `"2:05:00 PM"`
pub fn format_to_am_pm(time24: &str) -> Result<String, AppError> {
    Ok(format_clock(parse_time(time24)?))
}

/// `2024-05-06T09:00:00` -> `"9:00:00 AM"`
pub fn format_time_from_datetime(dt: &NaiveDateTime) -> String {
    format_clock(dt.time())
}

/// `2024-05-06T09:00:00` -> `"2024-05-06"`
pub fn format_date_from_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// `2024-05-06T09:00:00` -> `"Monday"`
pub fn weekday_from_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%A").to_string()
}

fn format_clock(time: NaiveTime) -> String {
    time.format("%-I:%M:%S %p").to_string()
}

/// Instantiates a program slot on a calendar date.
///
/// The date must fall on the program's weekday and the slot must end after it starts.
pub fn session_range(
    program: &Program,
    date: NaiveDate,
) -> Result<(NaiveDateTime, NaiveDateTime), AppError> {
    let weekday: Weekday = program.weekday.parse().map_err(|_| {
        AppError::Validation(format!(
            "Program {} has an unknown weekday '{}'",
            program.id, program.weekday
        ))
    })?;

    if date.weekday() != weekday {
        return Err(AppError::Validation(format!(
            "{} is a {}, program {} runs on {}",
            date,
            date.format("%A"),
            program.id,
            program.weekday
        )));
    }

    let start = date.and_time(program.start_time);
    let end = date.and_time(program.end_time);
    ensure_ordered(start, end)?;
    Ok((start, end))
}

pub fn ensure_ordered(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), AppError> {
    if end <= start {
        return Err(AppError::Validation(
            "Session end must be after session start".to_string(),
        ));
    }
    Ok(())
}

/// Lower bound for "upcoming" schedule queries: one day before `now`, whole seconds.
pub fn future_cutoff(now: DateTime<Utc>) -> NaiveDateTime {
    (now - Duration::days(1)).naive_utc().trunc_subsecs(0)
}

pub fn format_cutoff(cutoff: &NaiveDateTime) -> String {
    format!("{}Z", cutoff.format(DATETIME_FORMAT))
}

pub mod datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(super::DATETIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_datetime(&raw).map_err(serde::de::Error::custom)
    }
}

pub mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(super::TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}
