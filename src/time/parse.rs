//! Datetime and duration strings as they appear in project files.
//!
//! Accepted datetime formats:
//! - `2024-W36-1 08:00` (ISO year, week and weekday)
//! - `02/09/2024 08:00` (day/month/year)
//! - `2024-09-02T08:00` or `2024-09-02T08:00:00`
//!
//! Durations are dash-separated `<n><unit>` terms with units `w`, `d`, `h`
//! and `m`, e.g. `1w-2d-3h-15m`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};

use super::TimeError;

const NAIVE_FORMATS: [&str; 5] = [
    "%d/%m/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

fn weekday_from_iso(weekday: u32) -> Option<Weekday> {
    match weekday {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Resolves an ISO year/week/weekday (1 = Monday) to a calendar date.
pub fn iso_date(year: i32, week: u32, weekday: u32) -> Result<NaiveDate, TimeError> {
    weekday_from_iso(weekday)
        .and_then(|wd| NaiveDate::from_isoywd_opt(year, week, wd))
        .ok_or(TimeError::InvalidIsoDate { year, week, weekday })
}

/// Parses a datetime in any of the accepted formats.
pub fn parse_datetime(text: &str) -> Result<NaiveDateTime, TimeError> {
    let text = text.trim();
    let invalid = || TimeError::InvalidDateTime(text.to_string());

    if text.contains('W') {
        let (date, clock) = text.split_once(' ').ok_or_else(invalid)?;
        let mut fields = date.split('-');
        let (Some(year), Some(week), Some(weekday), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(invalid());
        };
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let week: u32 = week
            .strip_prefix('W')
            .ok_or_else(invalid)?
            .parse()
            .map_err(|_| invalid())?;
        let weekday: u32 = weekday.parse().map_err(|_| invalid())?;
        let time = NaiveTime::parse_from_str(clock.trim(), "%H:%M").map_err(|_| invalid())?;
        return Ok(iso_date(year, week, weekday)?.and_time(time));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(invalid)
}

/// Parses a duration such as `1w-2d-3h-15m`.
pub fn parse_duration(text: &str) -> Result<TimeDelta, TimeError> {
    let text = text.trim();
    let invalid = || TimeError::InvalidDuration(text.to_string());
    if text.is_empty() {
        return Err(invalid());
    }

    let mut total = TimeDelta::zero();
    for term in text.split('-') {
        let unit = term.chars().last().ok_or_else(invalid)?;
        let amount: i64 = term[..term.len() - unit.len_utf8()]
            .parse()
            .map_err(|_| invalid())?;
        let part = match unit {
            'w' => TimeDelta::try_weeks(amount),
            'd' => TimeDelta::try_days(amount),
            'h' => TimeDelta::try_hours(amount),
            'm' => TimeDelta::try_minutes(amount),
            _ => None,
        }
        .ok_or_else(invalid)?;
        total = total.checked_add(&part).ok_or_else(invalid)?;
    }
    Ok(total)
}

/// Formats a datetime as `YYYY-Www-D HH:MM`.
pub fn format_isocalendar(dt: &NaiveDateTime) -> String {
    dt.format("%G-W%V-%u %H:%M").to_string()
}
