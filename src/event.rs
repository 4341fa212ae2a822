//! Calendar events

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Month, Weekday};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::recurrence::{Frequency, Recurrence};

/// One calendar event, whichever format it has been read from
///
/// Events are immutable once produced. Their fields can be read either with the accessors
/// (`event.name()`), or by key (`event.get(Field::Name)`, `event.field("name")`). Both views
/// read the same storage.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    name: String,
    description: Option<String>,
    location: Option<String>,
    start_time: Option<DateTime<FixedOffset>>,
    end_time: Option<DateTime<FixedOffset>>,
    all_day: bool,
    /// `None` for events that do not repeat, so that no repeat field can be set on them
    recurrence: Option<Recurrence>,
}

impl Event {
    /// Create an event. Use the `with_*` methods to set the optional fields
    pub fn new<S: ToString>(name: S, start_time: Option<DateTime<FixedOffset>>) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            location: None,
            start_time,
            end_time: None,
            all_day: false,
            recurrence: None,
        }
    }

    pub fn with_description<S: ToString>(mut self, description: S) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_location<S: ToString>(mut self, location: S) -> Self {
        self.location = Some(location.to_string());
        self
    }

    /// Set the end time. An end that precedes the start is ignored.
    pub fn with_end_time(mut self, end_time: DateTime<FixedOffset>) -> Self {
        match self.start_time {
            Some(start) if end_time < start => {
                log::warn!("Event {:?} ends ({}) before it starts ({}), ignoring its end time", self.name, end_time, start);
            },
            _ => self.end_time = Some(end_time),
        }
        self
    }

    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn start_time(&self) -> Option<&DateTime<FixedOffset>> {
        self.start_time.as_ref()
    }

    pub fn end_time(&self) -> Option<&DateTime<FixedOffset>> {
        self.end_time.as_ref()
    }

    pub fn all_day(&self) -> bool {
        self.all_day
    }

    pub fn recurrence(&self) -> Option<&Recurrence> {
        self.recurrence.as_ref()
    }

    pub fn repeats(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn repeat_freq(&self) -> Frequency {
        self.recurrence.as_ref().map(|r| r.freq()).unwrap_or(Frequency::None)
    }

    pub fn repeat_day(&self) -> &[Weekday] {
        self.recurrence.as_ref().map(|r| r.by_day()).unwrap_or(&[])
    }

    pub fn repeat_month_day(&self) -> &[i8] {
        self.recurrence.as_ref().map(|r| r.by_month_day()).unwrap_or(&[])
    }

    pub fn repeat_month(&self) -> &[Month] {
        self.recurrence.as_ref().map(|r| r.by_month()).unwrap_or(&[])
    }

    pub fn repeat_interval(&self) -> Option<u32> {
        self.recurrence.as_ref().and_then(|r| r.interval())
    }

    pub fn repeat_count(&self) -> Option<u32> {
        self.recurrence.as_ref().and_then(|r| r.count())
    }

    pub fn repeat_until(&self) -> Option<&DateTime<FixedOffset>> {
        self.recurrence.as_ref().and_then(|r| r.until())
    }

    /// Key-style access to a field
    pub fn get(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Name => FieldValue::Text(self.name()),
            Field::Description => self.description().map(FieldValue::Text).unwrap_or(FieldValue::Unset),
            Field::Location => self.location().map(FieldValue::Text).unwrap_or(FieldValue::Unset),
            Field::StartTime => self.start_time().copied().map(FieldValue::Time).unwrap_or(FieldValue::Unset),
            Field::EndTime => self.end_time().copied().map(FieldValue::Time).unwrap_or(FieldValue::Unset),
            Field::AllDay => FieldValue::Bool(self.all_day()),
            Field::Repeats => FieldValue::Bool(self.repeats()),
            Field::RepeatFreq => FieldValue::Frequency(self.repeat_freq()),
            Field::RepeatDay => FieldValue::Weekdays(self.repeat_day()),
            Field::RepeatMonth => FieldValue::Months(self.repeat_month()),
            Field::RepeatUntil => self.repeat_until().copied().map(FieldValue::Time).unwrap_or(FieldValue::Unset),
        }
    }

    /// Key-style access to a field, by its name (e.g. `"start_time"`)
    pub fn field(&self, key: &str) -> Result<FieldValue<'_>> {
        Ok(self.get(key.parse()?))
    }

    /// Compare the start times of two events
    ///
    /// This fails if any of them has no start time, since such an event cannot be placed in time.
    pub fn try_cmp(&self, other: &Event) -> Result<Ordering> {
        match (&self.start_time, &other.start_time) {
            (Some(left), Some(right)) => Ok(left.cmp(right)),
            _ => Err(Error::OrderingUndefined),
        }
    }

    /// Compare the start times of two events, an unset start time being lower than any other
    pub fn cmp_start(&self, other: &Event) -> Ordering {
        self.start_time.cmp(&other.start_time)
    }
}

/// The fields of an [`Event`] that can be looked up by key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Description,
    Location,
    StartTime,
    EndTime,
    AllDay,
    Repeats,
    RepeatFreq,
    RepeatDay,
    RepeatMonth,
    RepeatUntil,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::Name, Field::Description, Field::Location, Field::StartTime, Field::EndTime, Field::AllDay,
        Field::Repeats, Field::RepeatFreq, Field::RepeatDay, Field::RepeatMonth, Field::RepeatUntil,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Description => "description",
            Field::Location => "location",
            Field::StartTime => "start_time",
            Field::EndTime => "end_time",
            Field::AllDay => "all_day",
            Field::Repeats => "repeats",
            Field::RepeatFreq => "repeat_freq",
            Field::RepeatDay => "repeat_day",
            Field::RepeatMonth => "repeat_month",
            Field::RepeatUntil => "repeat_until",
        }
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL.iter()
            .find(|field| field.as_str() == s)
            .copied()
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The value of a field, as returned by a key-style lookup
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Time(DateTime<FixedOffset>),
    Bool(bool),
    Frequency(Frequency),
    Weekdays(&'a [Weekday]),
    Months(&'a [Month]),
    /// This optional field is absent from the event
    Unset,
}

impl<'a> FieldValue<'a> {
    pub fn is_unset(&self) -> bool {
        matches!(self, FieldValue::Unset)
    }
}


#[cfg(test)]
mod test {
    use super::*;

    fn time(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_both_views_agree() {
        let recurrence = Recurrence::new(Frequency::Weekly).with_days(&[Weekday::Mon, Weekday::Wed]);
        let event = Event::new("Standup", Some(time("2024-01-01T09:00:00+01:00")))
            .with_location("Room 4")
            .with_end_time(time("2024-01-01T09:15:00+01:00"))
            .with_recurrence(recurrence);

        for field in Field::ALL.iter() {
            assert_eq!(event.get(*field), event.field(field.as_str()).unwrap());
        }
        assert_eq!(event.field("name").unwrap(), FieldValue::Text(event.name()));
        assert_eq!(event.field("location").unwrap(), FieldValue::Text("Room 4"));
        assert!(event.field("description").unwrap().is_unset());
        assert_eq!(event.field("repeat_day").unwrap(), FieldValue::Weekdays(&[Weekday::Mon, Weekday::Wed]));
        assert_eq!(event.field("repeat_freq").unwrap(), FieldValue::Frequency(Frequency::Weekly));
        assert!(matches!(event.field("colour"), Err(Error::UnknownField(_))));
    }

    #[test]
    fn test_repeat_fields_follow_recurrence() {
        let single = Event::new("Dentist", Some(time("2024-02-01T14:00:00Z")));
        assert!(!single.repeats());
        assert_eq!(single.repeat_freq(), Frequency::None);
        assert!(single.repeat_day().is_empty());
        assert!(single.repeat_month().is_empty());
        assert!(single.repeat_until().is_none());

        let yearly = single.clone().with_recurrence(Recurrence::new(Frequency::Yearly).with_months(&[Month::February]));
        assert!(yearly.repeats());
        assert_eq!(yearly.repeat_month(), &[Month::February]);
    }

    #[test]
    fn test_end_before_start_is_dropped() {
        let event = Event::new("Backwards", Some(time("2024-02-01T14:00:00Z")))
            .with_end_time(time("2024-02-01T13:00:00Z"));
        assert!(event.end_time().is_none());

        let no_start = Event::new("Floating end", None).with_end_time(time("2024-02-01T13:00:00Z"));
        assert!(no_start.end_time().is_some());
    }

    #[test]
    fn test_serialized_fields() {
        let event = Event::new("Backwards", Some(time("2024-02-01T14:00:00Z")))
            .with_end_time(time("2024-02-01T13:00:00Z"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["name"], "Backwards");
        assert!(json["end_time"].is_null());
        assert!(json["recurrence"].is_null());
    }

    #[test]
    fn test_ordering() {
        let early = Event::new("Early", Some(time("2024-01-01T08:00:00+00:00")));
        // Same instant, written with another offset
        let same = Event::new("Same", Some(time("2024-01-01T09:00:00+01:00")));
        let late = Event::new("Late", Some(time("2024-03-01T08:00:00+00:00")));
        let unset = Event::new("Unset", None);

        assert_eq!(early.try_cmp(&late).unwrap(), Ordering::Less);
        assert_eq!(late.try_cmp(&early).unwrap(), Ordering::Greater);
        assert_eq!(early.try_cmp(&same).unwrap(), Ordering::Equal);
        assert!(matches!(early.try_cmp(&unset), Err(Error::OrderingUndefined)));
        assert!(matches!(unset.try_cmp(&early), Err(Error::OrderingUndefined)));

        assert_eq!(unset.cmp_start(&early), Ordering::Less);
        assert_eq!(unset.cmp_start(&Event::new("Unset too", None)), Ordering::Equal);
    }
}
