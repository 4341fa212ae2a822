//! A module to parse atom feeds

use chrono::{DateTime, Duration, FixedOffset};
use chrono_tz::Tz;
use ical::property::Property;
use ical::PropertyParser;
use minidom::Element;

use crate::error::{Error, Result};
use crate::ics::param;
use crate::recurrence::{self, Recurrence};
use crate::timezone::{self, DecodedTime};
use crate::utils::{child, normalize, text_or_value};
use crate::Event;

/// Feed-level information
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedMetadata {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
    pub calendar_name: Option<String>,
    pub time_zone: Option<Tz>,
    pub last_updated: Option<DateTime<FixedOffset>>,
    pub published: Option<DateTime<FixedOffset>>,
}

impl FeedMetadata {
    /// Fill the fields that are unset in `self` with the ones of `other`
    pub fn merge(&mut self, other: FeedMetadata) {
        fn fill<T>(field: &mut Option<T>, value: Option<T>) {
            if field.is_none() {
                *field = value;
            }
        }
        fill(&mut self.title, other.title);
        fill(&mut self.subtitle, other.subtitle);
        fill(&mut self.author, other.author);
        fill(&mut self.email, other.email);
        fill(&mut self.calendar_name, other.calendar_name);
        fill(&mut self.time_zone, other.time_zone);
        fill(&mut self.last_updated, other.last_updated);
        fill(&mut self.published, other.published);
    }
}

/// The entries of a feed, decoded one at a time
pub struct FeedEvents {
    entries: std::vec::IntoIter<Element>,
    time_zone: Option<Tz>,
}

impl Iterator for FeedEvents {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(parse_entry(&entry, self.time_zone))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

/// Parse an atom feed. Its metadata is returned at once, its entries are decoded lazily.
pub fn parse(content: &str) -> Result<(FeedMetadata, FeedEvents)> {
    let root = content.parse::<Element>()
        .map_err(|err| Error::MalformedFeed(err.to_string()))?;
    if root.name() != "feed" {
        return Err(Error::MalformedFeed(format!("unexpected root element <{}>", root.name())));
    }

    let metadata = parse_metadata(&root)?;
    log::debug!("Read metadata of feed {:?}", metadata.title);

    let entries: Vec<Element> = root.children()
        .filter(|el| el.name() == "entry")
        .cloned()
        .collect();
    log::debug!("Feed has {} entries", entries.len());

    let time_zone = metadata.time_zone;
    Ok((metadata, FeedEvents { entries: entries.into_iter(), time_zone }))
}

fn child_text(parent: &Element, name: &str) -> Option<String> {
    child(parent, name)
        .map(|el| normalize(&el.text()))
        .filter(|text| !text.is_empty())
}

fn parse_metadata(root: &Element) -> Result<FeedMetadata> {
    let author = child(root, "author");
    let time_zone = match child(root, "timezone").and_then(|el| text_or_value(el, "value")) {
        Some(name) => Some(timezone::resolve(&name)?),
        None => None,
    };

    Ok(FeedMetadata {
        title: child_text(root, "title"),
        subtitle: child_text(root, "subtitle"),
        author: author.and_then(|a| child_text(a, "name")),
        email: author.and_then(|a| child_text(a, "email")),
        calendar_name: child(root, "calendarName").and_then(|el| text_or_value(el, "value")),
        time_zone,
        last_updated: metadata_time(root, "updated", time_zone)?,
        published: metadata_time(root, "published", time_zone)?,
    })
}

fn metadata_time(root: &Element, name: &str, tz: Option<Tz>) -> Result<Option<DateTime<FixedOffset>>> {
    match child_text(root, name) {
        None => Ok(None),
        Some(text) => match timezone::parse_feed_time(&text, tz) {
            Some(decoded) => Ok(Some(decoded.time)),
            None => Err(Error::MalformedFeed(format!("invalid <{}> value {:?}", name, text))),
        },
    }
}

fn entry_time(value: &str, what: &str, name: &str, tz: Option<Tz>) -> Result<DecodedTime> {
    timezone::parse_feed_time(value, tz)
        .ok_or_else(|| Error::MalformedFeed(format!("invalid {} {:?} in entry {:?}", what, value, name)))
}

fn parse_entry(entry: &Element, tz: Option<Tz>) -> Result<Event> {
    let name = match child_text(entry, "title") {
        Some(name) => name,
        None => {
            log::warn!("A feed entry has no title");
            String::new()
        },
    };

    let mut start = None;
    let mut end = None;
    // Only the entry's own <gd:when>, not the one of a nested <gd:originalEvent>
    if let Some(when) = child(entry, "when") {
        if let Some(value) = when.attr("startTime") {
            start = Some(entry_time(value, "startTime", &name, tz)?);
        }
        if let Some(value) = when.attr("endTime") {
            end = Some(entry_time(value, "endTime", &name, tz)?.time);
        }
    }

    let mut rule = None;
    if let Some(el) = child(entry, "recurrence") {
        let block = RecurrenceBlock::parse(&el.text(), tz, &name)?;
        // Recurring entries carry their times in the recurrence block rather than in <gd:when>
        if start.is_none() {
            start = block.start;
            end = match (block.end, block.start, block.duration) {
                (Some(end), _, _) => Some(end),
                (None, Some(start), Some(duration)) => {
                    let end = start.time.checked_add_signed(duration)
                        .ok_or_else(|| Error::MalformedFeed(format!("DURATION out of range in entry {:?}", name)))?;
                    Some(end)
                },
                _ => None,
            };
        }
        rule = block.rule;
    }

    let all_day = start.map(|s| s.date_only).unwrap_or(false);
    let start_time = start.map(|s| s.time);
    let mut event = Event::new(name, start_time).with_all_day(all_day);

    match (end, start_time) {
        (Some(end), _) => event = event.with_end_time(end),
        (None, Some(start)) if all_day => {
            if let Some(end) = start.checked_add_signed(Duration::days(1)) {
                event = event.with_end_time(end);
            }
        },
        _ => {},
    }

    if let Some(description) = child_text(entry, "content").or_else(|| child_text(entry, "summary")) {
        event = event.with_description(description);
    }
    if let Some(location) = child(entry, "where").and_then(|el| text_or_value(el, "valueString")) {
        event = event.with_location(location);
    }
    if let Some(mut rule) = rule {
        if let Some(start) = &start_time {
            rule.anchor_to(start);
        }
        event = event.with_recurrence(rule);
    }

    Ok(event)
}

/// The iCal lines embedded in a `<gd:recurrence>` element
#[derive(Debug, Default)]
struct RecurrenceBlock {
    start: Option<DecodedTime>,
    end: Option<DateTime<FixedOffset>>,
    duration: Option<Duration>,
    rule: Option<Recurrence>,
}

impl RecurrenceBlock {
    fn parse(text: &str, tz: Option<Tz>, entry: &str) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedFeed(format!("{} in entry {:?}", reason, entry));
        let mut block = RecurrenceBlock::default();
        // Nested components (e.g. VTIMEZONE) have DTSTART lines of their own
        let mut depth = 0usize;

        for prop in PropertyParser::from_reader(text.trim().as_bytes()) {
            let prop = prop.map_err(|err| malformed(err.to_string()))?;
            let value = prop.value.as_deref().unwrap_or_default();

            match prop.name.to_ascii_uppercase().as_str() {
                "BEGIN" => depth += 1,
                "END" => depth = depth.saturating_sub(1),
                _ if depth > 0 => {},
                "DTSTART" => block.start = Some(ical_time(&prop, tz).ok_or_else(|| malformed(format!("invalid DTSTART {:?}", value)))??),
                "DTEND" => block.end = Some(ical_time(&prop, tz).ok_or_else(|| malformed(format!("invalid DTEND {:?}", value)))??.time),
                "DURATION" => {
                    block.duration = Some(timezone::parse_ical_duration(value)
                        .ok_or_else(|| malformed(format!("invalid DURATION {:?}", value)))?);
                },
                "RRULE" => {
                    block.rule = Some(recurrence::parse_rrule(value, tz).map_err(|err| malformed(err.to_string()))?);
                },
                other => log::debug!("Ignoring recurrence line {}", other),
            }
        }

        if block.rule.is_none() {
            log::debug!("Recurrence block without RRULE");
        }
        Ok(block)
    }
}

/// `None` when the value cannot be decoded. An unknown `TZID` is an error of its own.
fn ical_time(prop: &Property, tz: Option<Tz>) -> Option<Result<DecodedTime>> {
    let value = prop.value.as_deref().unwrap_or_default();
    timezone::parse_ical_time(value, param(prop, "TZID"), tz)
}
