//! Time zone resolution and decoding of the date/time values found in calendar sources

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// A decoded point in time, along with whether the source only gave a date
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodedTime {
    pub time: DateTime<FixedOffset>,
    pub date_only: bool,
}

/// Resolve a zone identifier (e.g. `Europe/Paris`) from the time zone database
pub fn resolve(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::UnknownTimeZone(name.to_string()))
}

/// Anchor a floating date-time in `tz`, or in UTC when the calendar has no time zone
pub fn localize(naive: &NaiveDateTime, tz: Option<Tz>) -> DateTime<FixedOffset> {
    match tz {
        None => Utc.from_utc_datetime(naive).fixed_offset(),
        Some(tz) => {
            // Local times skipped by a DST transition do not exist, keep the wall clock reading as UTC
            let local = tz.from_local_datetime(naive)
                .earliest()
                .unwrap_or_else(|| tz.from_utc_datetime(naive));
            local.fixed_offset()
        },
    }
}

fn localize_date(date: &NaiveDate, tz: Option<Tz>) -> DateTime<FixedOffset> {
    localize(&date.and_time(chrono::NaiveTime::MIN), tz)
}

/// Decode an iCal date or date-time value (`20240101`, `20240101T090000`, `20240101T090000Z`)
///
/// `tzid` is the value of a `TZID` parameter, if any. It takes precedence over `default_tz`.
pub fn parse_ical_time(value: &str, tzid: Option<&str>, default_tz: Option<Tz>) -> Option<Result<DecodedTime>> {
    let value = value.trim();

    if value.len() == 8 && value.chars().all(|c| c.is_ascii_digit()) {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d").ok()?;
        return Some(Ok(DecodedTime { time: localize_date(&date, default_tz), date_only: true }));
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").ok()?;
        return Some(Ok(DecodedTime { time: Utc.from_utc_datetime(&naive).fixed_offset(), date_only: false }));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;
    let tz = match tzid {
        Some(tzid) => match resolve(tzid.trim_matches('"')) {
            Ok(tz) => Some(tz),
            Err(err) => return Some(Err(err)),
        },
        None => default_tz,
    };
    Some(Ok(DecodedTime { time: localize(&naive, tz), date_only: false }))
}

/// Decode a time value of an atom feed (RFC 3339, or a bare `YYYY-MM-DD` date for all-day events)
pub fn parse_feed_time(value: &str, default_tz: Option<Tz>) -> Option<DecodedTime> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(DecodedTime { time: localize_date(&date, default_tz), date_only: true });
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Some(DecodedTime { time, date_only: false });
    }

    // Some feeds omit the offset
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"].iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| DecodedTime { time: localize(&naive, default_tz), date_only: false })
}

/// Decode an iCal `DURATION` value, e.g. `P1D`, `PT1H30M`, `P2W`, `-PT15M`
///
/// Returns `None` for malformed values, and for durations chrono cannot represent.
pub fn parse_ical_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (negative, value) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    let mut rest = value.strip_prefix('P')?;

    let mut total = Duration::zero();
    let mut in_time = false;
    let mut seen_any = false;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('T') {
            in_time = true;
            rest = after;
            continue;
        }
        let digits_len = rest.find(|c: char| !c.is_ascii_digit())?;
        if digits_len == 0 {
            return None;
        }
        let amount: i64 = rest[..digits_len].parse().ok()?;
        let unit = rest[digits_len..].chars().next()?;
        let part = match (unit, in_time) {
            ('W', false) => Duration::try_weeks(amount),
            ('D', false) => Duration::try_days(amount),
            ('H', true) => Duration::try_hours(amount),
            ('M', true) => Duration::try_minutes(amount),
            ('S', true) => Duration::try_seconds(amount),
            _ => None,
        }?;
        total = total.checked_add(&part)?;
        seen_any = true;
        rest = &rest[digits_len + unit.len_utf8()..];
    }

    if !seen_any {
        return None;
    }
    Some(if negative { -total } else { total })
}
