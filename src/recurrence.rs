//! Recurrence rules (`RRULE`)
//!
//! Rules are decoded by the `rrule` crate, but never expanded: this module does not compute occurrences.

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, Month, Weekday};
use chrono_tz::Tz;
use rrule::{NWeekday, RRule, Unvalidated};
use serde::{Deserialize, Serialize};

use crate::timezone;

/// How often an event repeats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// The event does not repeat
    None,
}

impl Default for Frequency {
    fn default() -> Self {
        Self::None
    }
}

impl FromStr for Frequency {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "YEARLY" => Ok(Self::Yearly),
            other => Err(RuleError(format!("unsupported frequency {}", other))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::None => "none",
        };
        write!(f, "{}", s)
    }
}

/// Why a rule could not be decoded. Adapters turn it into the error of their own format.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleError(pub String);

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid RRULE: {}", self.0)
    }
}

/// A decoded `RRULE`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    freq: Frequency,
    interval: Option<u32>,
    count: Option<u32>,
    by_day: Vec<Weekday>,
    by_month_day: Vec<i8>,
    by_month: Vec<Month>,
    until: Option<DateTime<FixedOffset>>,
}

impl Recurrence {
    /// A rule that repeats with the given frequency, with no further restriction
    pub fn new(freq: Frequency) -> Self {
        Self {
            freq,
            interval: None,
            count: None,
            by_day: Vec::new(),
            by_month_day: Vec::new(),
            by_month: Vec::new(),
            until: None,
        }
    }

    pub fn with_days(mut self, days: &[Weekday]) -> Self {
        for day in days {
            push_unique(&mut self.by_day, *day);
        }
        self
    }

    pub fn with_months(mut self, months: &[Month]) -> Self {
        for month in months {
            push_unique(&mut self.by_month, *month);
        }
        self
    }

    pub fn freq(&self) -> Frequency { self.freq }
    pub fn interval(&self) -> Option<u32> { self.interval }
    pub fn count(&self) -> Option<u32> { self.count }
    pub fn by_day(&self) -> &[Weekday] { &self.by_day }
    pub fn by_month_day(&self) -> &[i8] { &self.by_month_day }
    pub fn by_month(&self) -> &[Month] { &self.by_month }
    pub fn until(&self) -> Option<&DateTime<FixedOffset>> { self.until.as_ref() }

    /// Yearly rules that do not restrict their month repeat on the month (and day) of their first occurrence
    pub(crate) fn anchor_to(&mut self, start: &DateTime<FixedOffset>) {
        if self.freq != Frequency::Yearly {
            return;
        }
        if self.by_month.is_empty() {
            if let Ok(month) = Month::try_from(start.month() as u8) {
                self.by_month.push(month);
            }
            if self.by_day.is_empty() && self.by_month_day.is_empty() {
                self.by_month_day.push(start.day() as i8);
            }
        }
    }
}

fn push_unique<T: PartialEq>(values: &mut Vec<T>, value: T) {
    if !values.contains(&value) {
        values.push(value);
    }
}

/// Decode the value of an `RRULE` property, e.g. `FREQ=WEEKLY;BYDAY=MO,WE;UNTIL=20241231`
///
/// A leading `RRULE:` is accepted. Floating `UNTIL` values are anchored in `tz`.
pub fn parse_rrule(value: &str, tz: Option<Tz>) -> Result<Recurrence, RuleError> {
    let value = value.trim();
    let value = value.strip_prefix("RRULE:").unwrap_or(value);
    let parsed = value.parse::<RRule<Unvalidated>>()
        .map_err(|err| RuleError(err.to_string()))?;

    let freq = match parsed.get_freq() {
        rrule::Frequency::Daily => Frequency::Daily,
        rrule::Frequency::Weekly => Frequency::Weekly,
        rrule::Frequency::Monthly => Frequency::Monthly,
        rrule::Frequency::Yearly => Frequency::Yearly,
        other => return Err(RuleError(format!("unsupported frequency {:?}", other))),
    };
    let mut rule = Recurrence::new(freq);

    let interval = u32::from(parsed.get_interval());
    if interval > 1 {
        rule.interval = Some(interval);
    }
    rule.count = parsed.get_count();

    for day in parsed.get_by_weekday() {
        // The ordinal of `1MO`, `-1FR`... is dropped
        let day = match day {
            NWeekday::Every(day) => *day,
            NWeekday::Nth(_, day) => *day,
        };
        push_unique(&mut rule.by_day, day);
    }
    for day in parsed.get_by_month_day() {
        if *day == 0 || !(-31..=31).contains(day) {
            return Err(RuleError(format!("invalid month day {}", day)));
        }
        push_unique(&mut rule.by_month_day, *day);
    }
    for month in parsed.get_by_month() {
        let month = Month::try_from(*month).map_err(|_| RuleError(format!("invalid month {}", month)))?;
        push_unique(&mut rule.by_month, month);
    }

    rule.until = parsed.get_until().map(|until| match until.timezone() {
        // No `Z` suffix: the wall clock reading belongs to the calendar's zone
        rrule::Tz::Local(_) => timezone::localize(&until.naive_local(), tz),
        _ => until.fixed_offset(),
    });

    Ok(rule)
}
