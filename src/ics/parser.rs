//! A module to parse ICal files

use std::io::Cursor;

use chrono::Duration;
use chrono_tz::Tz;
use ical::parser::ical::component::IcalEvent;
use ical::property::Property;
use ical::IcalParser;

use crate::error::{Error, Result};
use crate::recurrence;
use crate::timezone::{self, DecodedTime};
use crate::utils::unescape_ical_text;
use crate::Event;

/// The VEVENTs of an iCal file, decoded one at a time
///
/// VCALENDAR components are only read from the input when the events of the previous one have all been consumed.
pub struct IcsEvents {
    reader: IcalParser<Cursor<Vec<u8>>>,
    pending: std::vec::IntoIter<IcalEvent>,
    /// The `X-WR-TIMEZONE` of the VCALENDAR being read, used for floating times
    time_zone: Option<Tz>,
    done: bool,
}

impl Iterator for IcsEvents {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            if let Some(event) = self.pending.next() {
                let parsed = parse_event(&event, self.time_zone);
                if parsed.is_err() {
                    self.done = true;
                }
                return Some(parsed);
            }

            match self.reader.next() {
                None => {
                    self.done = true;
                    return None;
                },
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(Error::MalformedCalendar(err.to_string())));
                },
                Some(Ok(calendar)) => {
                    self.time_zone = match calendar_time_zone(&calendar.properties) {
                        Ok(tz) => tz,
                        Err(err) => {
                            self.done = true;
                            return Some(Err(err));
                        },
                    };
                    log::debug!("Reading a VCALENDAR with {} events", calendar.events.len());
                    self.pending = calendar.events.into_iter();
                },
            }
        }
    }
}

/// Parse an iCal file. Nothing is decoded until the returned iterator is consumed.
pub fn parse(content: &str) -> IcsEvents {
    IcsEvents {
        reader: IcalParser::new(Cursor::new(content.as_bytes().to_vec())),
        pending: Vec::new().into_iter(),
        time_zone: None,
        done: false,
    }
}

fn calendar_time_zone(properties: &[Property]) -> Result<Option<Tz>> {
    match find_prop(properties, "X-WR-TIMEZONE").and_then(|p| p.value.as_deref()) {
        Some(name) => Ok(Some(timezone::resolve(name)?)),
        None => Ok(None),
    }
}

fn find_prop<'a>(properties: &'a [Property], name: &str) -> Option<&'a Property> {
    properties.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

pub(crate) fn param<'a>(prop: &'a Property, name: &str) -> Option<&'a str> {
    prop.params.as_ref()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(|value| value.as_str())
}

fn text(properties: &[Property], name: &str) -> Option<String> {
    find_prop(properties, name)
        .and_then(|p| p.value.as_deref())
        .map(unescape_ical_text)
        .filter(|text| !text.is_empty())
}

fn time(properties: &[Property], name: &str, tz: Option<Tz>) -> Result<Option<DecodedTime>> {
    let prop = match find_prop(properties, name) {
        None => return Ok(None),
        Some(prop) => prop,
    };
    let value = prop.value.as_deref().unwrap_or_default();
    match timezone::parse_ical_time(value, param(prop, "TZID"), tz) {
        Some(Ok(decoded)) => Ok(Some(decoded)),
        Some(Err(err)) => Err(err),
        None => Err(Error::MalformedCalendar(format!("invalid {} value {:?}", name, value))),
    }
}

fn parse_event(event: &IcalEvent, tz: Option<Tz>) -> Result<Event> {
    let props = &event.properties;

    let name = match text(props, "SUMMARY") {
        Some(name) => name,
        None => {
            log::warn!("A VEVENT has no SUMMARY");
            String::new()
        },
    };

    let start = time(props, "DTSTART", tz)?;
    let all_day = start.map(|s| s.date_only).unwrap_or(false);
    let start_time = start.map(|s| s.time);

    let end_time = match time(props, "DTEND", tz)? {
        Some(end) => Some(end.time),
        None => match (start_time, find_prop(props, "DURATION").and_then(|p| p.value.as_deref())) {
            (Some(start), Some(duration)) => {
                let end = timezone::parse_ical_duration(duration)
                    .and_then(|duration| start.checked_add_signed(duration))
                    .ok_or_else(|| Error::MalformedCalendar(format!("invalid DURATION {:?} in {:?}", duration, name)))?;
                Some(end)
            },
            (Some(start), None) if all_day => start.checked_add_signed(Duration::days(1)),
            _ => None,
        },
    };

    let mut parsed = Event::new(name, start_time).with_all_day(all_day);
    if let Some(end) = end_time {
        parsed = parsed.with_end_time(end);
    }
    if let Some(description) = text(props, "DESCRIPTION") {
        parsed = parsed.with_description(description);
    }
    if let Some(location) = text(props, "LOCATION") {
        parsed = parsed.with_location(location);
    }
    if let Some(rrule) = find_prop(props, "RRULE").and_then(|p| p.value.as_deref()) {
        let mut rule = recurrence::parse_rrule(rrule, tz)
            .map_err(|err| Error::MalformedCalendar(format!("{} in {:?}", err, parsed.name())))?;
        if let Some(start) = &start_time {
            rule.anchor_to(start);
        }
        parsed = parsed.with_recurrence(rule);
    }

    Ok(parsed)
}
