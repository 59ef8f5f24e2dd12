//! Resolves the date expressions accepted on the command line.
//!
//! Supported forms: `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM[:SS]`,
//! `today`, `tomorrow`, `yesterday` and weekday names (next occurrence),
//! each optionally followed by `HH:MM`. `none` and `clear` mean no due date.
//! A date without a time resolves to midnight, i.e. an all-day task.
//! Seconds are dropped.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use thiserror::Error;

use super::normalizer::ALL_DAY_TIME;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot resolve date '{0}'")]
pub struct DateError(pub String);

fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M").ok()
}

fn parse_weekday(text: &str) -> Option<Weekday> {
    match text {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn relative_day(word: &str, today: NaiveDate) -> Option<NaiveDate> {
    match word {
        "today" => Some(today),
        "tomorrow" => Some(today + Duration::days(1)),
        "yesterday" => Some(today - Duration::days(1)),
        other => parse_weekday(other).map(|weekday| {
            let ahead = (7 + weekday.num_days_from_monday() as i64 - today.weekday().num_days_from_monday() as i64) % 7;
            today + Duration::days(if ahead == 0 { 7 } else { ahead })
        }),
    }
}

/// Agenda lines carry `HH:MM` only, so stored due dates never hold seconds.
fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.date().and_time(NaiveTime::from_hms_opt(dt.hour(), dt.minute(), 0).unwrap_or(ALL_DAY_TIME))
}

/// Resolves `text` relative to `today`. `Ok(None)` means "no due date".
pub fn resolve_date(text: &str, today: NaiveDate) -> Result<Option<NaiveDateTime>, DateError> {
    let lowered = text.trim().to_lowercase();
    if matches!(lowered.as_str(), "none" | "clear" | "-") {
        return Ok(None);
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text.trim(), format) {
            return Ok(Some(truncate_to_minute(dt)));
        }
    }

    let mut words = lowered.split_whitespace();
    let (Some(day_word), time_word, None) = (words.next(), words.next(), words.next()) else {
        return Err(DateError(text.to_string()));
    };

    let day = NaiveDate::parse_from_str(day_word, "%Y-%m-%d")
        .ok()
        .or_else(|| relative_day(day_word, today))
        .ok_or_else(|| DateError(text.to_string()))?;

    let time = match time_word {
        Some(word) => parse_time(word).ok_or_else(|| DateError(text.to_string()))?,
        None => ALL_DAY_TIME,
    };

    Ok(Some(day.and_time(time)))
}
