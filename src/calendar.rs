//! The event collection
//!
//! A [`Calendar`] knows where its data comes from ([`Sources`]), reads it through a [`Fetcher`],
//! and keeps the resulting [`Event`]s. They can be read like a list (indexing, slicing,
//! iteration), like a map keyed by event name, and sorted by start time.

use std::collections::HashMap;
use std::ops::Index;
use std::path::Path;

use url::Url;

use crate::error::{Error, Result};
use crate::ics::{self, IcsEvents};
use crate::source::{Fetcher, Format, HttpFetcher, Sources};
use crate::xml::{self, FeedEvents, FeedMetadata};
use crate::Event;

/// How a parse should behave
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// The format to read. When `None`, it is inferred from the configured sources.
    pub format: Option<Format>,
    /// Whether the parsed events replace the current ones (`true`), or are appended to them (`false`)
    pub overwrite: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { format: None, overwrite: true }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// The direction of a sort by start time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    OldestFirst,
    LatestFirst,
}

/// The events, along with an index of their positions by name
#[derive(Clone, Debug, Default)]
struct EventList {
    events: Vec<Event>,
    by_name: HashMap<String, Vec<usize>>,
}

impl EventList {
    fn replace(&mut self, events: Vec<Event>) {
        self.events = events;
        self.reindex();
    }

    fn extend(&mut self, events: Vec<Event>) {
        let offset = self.events.len();
        for (i, event) in events.iter().enumerate() {
            self.by_name.entry(event.name().to_string()).or_default().push(offset + i);
        }
        self.events.extend(events);
    }

    fn reindex(&mut self) {
        self.by_name.clear();
        for (i, event) in self.events.iter().enumerate() {
            self.by_name.entry(event.name().to_string()).or_default().push(i);
        }
    }
}

/// Either adapter, as a single iterator
enum Decoder {
    Xml(FeedEvents),
    Ics(IcsEvents),
}

impl Iterator for Decoder {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Decoder::Xml(entries) => entries.next(),
            Decoder::Ics(events) => events.next(),
        }
    }
}

/// The lazy result of [`Calendar::parse`]
///
/// Every item is decoded only when it is pulled. The events are stored into the calendar once the
/// stream has been fully consumed: dropping it earlier, or hitting an error, leaves the calendar's
/// events as they were before the parse.
pub struct EventStream<'a> {
    list: &'a mut EventList,
    decoder: Decoder,
    format: Format,
    overwrite: bool,
    parsed: Vec<Event>,
    finished: bool,
}

impl<'a> EventStream<'a> {
    /// The format being read
    pub fn format(&self) -> Format {
        self.format
    }

    fn commit(&mut self) {
        let parsed = std::mem::take(&mut self.parsed);
        log::info!("Parsed {} {} events", parsed.len(), self.format);
        if self.overwrite {
            self.list.replace(parsed);
        } else {
            self.list.extend(parsed);
        }
    }
}

impl<'a> Iterator for EventStream<'a> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.decoder.next() {
            Some(Ok(event)) => {
                self.parsed.push(event.clone());
                Some(Ok(event))
            },
            Some(Err(err)) => {
                log::warn!("Unable to parse {} calendar after {} events: {}", self.format, self.parsed.len(), err);
                self.finished = true;
                self.parsed.clear();
                Some(Err(err))
            },
            None => {
                self.finished = true;
                self.commit();
                None
            },
        }
    }
}

/// A calendar, read from an XML feed or an iCal file
pub struct Calendar<F = HttpFetcher> {
    sources: Sources,
    fetcher: F,
    metadata: FeedMetadata,
    list: EventList,
}

impl Calendar<HttpFetcher> {
    /// Create a calendar with no source yet
    pub fn new() -> Self {
        Self::with_fetcher(Sources::new(), HttpFetcher::new())
    }

    pub fn from_sources(sources: Sources) -> Self {
        Self::with_fetcher(sources, HttpFetcher::new())
    }
}

impl Default for Calendar<HttpFetcher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Fetcher> Calendar<F> {
    /// Create a calendar that retrieves its sources with a custom fetcher
    pub fn with_fetcher(sources: Sources, fetcher: F) -> Self {
        Self {
            sources,
            fetcher,
            metadata: FeedMetadata::default(),
            list: EventList::default(),
        }
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    /// Change the sources. This has no effect on the events that have already been parsed.
    pub fn sources_mut(&mut self) -> &mut Sources {
        &mut self.sources
    }

    pub fn set_xml_url(&mut self, url: &str) -> Result<()> {
        self.sources.xml_url = Some(Url::parse(url)?);
        Ok(())
    }

    pub fn set_xml_file<P: AsRef<Path>>(&mut self, path: P) {
        self.sources.xml_file = Some(path.as_ref().to_path_buf());
    }

    pub fn set_ics_url(&mut self, url: &str) -> Result<()> {
        self.sources.ics_url = Some(Url::parse(url)?);
        Ok(())
    }

    pub fn set_ics_file<P: AsRef<Path>>(&mut self, path: P) {
        self.sources.ics_file = Some(path.as_ref().to_path_buf());
    }

    /// The feed metadata. Only XML feeds provide it.
    pub fn metadata(&self) -> &FeedMetadata {
        &self.metadata
    }

    /// Fetch and parse a source, returning its events lazily
    ///
    /// The feed metadata of an XML source is read (and stored) before this returns. The events are only
    /// stored once the returned stream has been fully consumed, see [`EventStream`].
    pub async fn parse(&mut self, options: ParseOptions) -> Result<EventStream<'_>> {
        let (format, location) = self.sources.select(options.format)?;
        log::info!("Parsing {} calendar from {}", format, location);

        let content = self.fetcher.fetch(&location).await?;

        let decoder = match format {
            Format::Xml => {
                let (metadata, entries) = xml::parse(&content)?;
                if options.overwrite {
                    self.metadata = metadata;
                } else {
                    self.metadata.merge(metadata);
                }
                Decoder::Xml(entries)
            },
            Format::Ics => Decoder::Ics(ics::parse(&content)),
        };

        Ok(EventStream {
            list: &mut self.list,
            decoder,
            format,
            overwrite: options.overwrite,
            parsed: Vec::new(),
            finished: false,
        })
    }

    /// Fetch and parse a source, and return all its events at once
    ///
    /// On error, the events of this calendar are left untouched.
    pub async fn parse_to_list(&mut self, options: ParseOptions) -> Result<Vec<Event>> {
        let stream = self.parse(options).await?;
        stream.collect()
    }

    pub fn len(&self) -> usize {
        self.list.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.events.is_empty()
    }

    /// The events, in their current order. Being a slice, this can be indexed and sliced.
    pub fn events(&self) -> &[Event] {
        &self.list.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.list.events.iter()
    }

    pub fn get_index(&self, index: usize) -> Result<&Event> {
        self.list.events.get(index)
            .ok_or_else(|| Error::NoSuchEvent(format!("index {} (calendar has {} events)", index, self.len())))
    }

    /// Whether an event has exactly this name
    pub fn contains(&self, name: &str) -> bool {
        self.list.by_name.contains_key(name)
    }

    /// Whether this very event is in the calendar
    pub fn contains_event(&self, event: &Event) -> bool {
        self.list.by_name.get(event.name())
            .map(|indices| indices.iter().any(|i| &self.list.events[*i] == event))
            .unwrap_or(false)
    }

    /// The first event (in the current order) that has this name
    pub fn get(&self, name: &str) -> Result<&Event> {
        self.list.by_name.get(name)
            .and_then(|indices| indices.first())
            .map(|i| &self.list.events[*i])
            .ok_or_else(|| Error::NoSuchEvent(format!("{:?}", name)))
    }

    /// Every event that has this name, in the current order
    pub fn get_all(&self, name: &str) -> Vec<&Event> {
        match self.list.by_name.get(name) {
            None => Vec::new(),
            Some(indices) => indices.iter().map(|i| &self.list.events[*i]).collect(),
        }
    }

    /// The names of the events, in the current order
    pub fn keys(&self) -> Vec<&str> {
        self.iter().map(|event| event.name()).collect()
    }

    /// The events sorted by start time. Events with no start time come before every other one.
    pub fn sorted(&self, order: SortOrder) -> Vec<Event> {
        let mut sorted = self.list.events.clone();
        match order {
            SortOrder::OldestFirst => sorted.sort_by(|a, b| a.cmp_start(b)),
            SortOrder::LatestFirst => sorted.sort_by(|a, b| b.cmp_start(a)),
        }
        sorted
    }

    /// Returns the events, where the oldest are listed first
    pub fn sort_by_oldest(&mut self, sort_in_place: bool) -> Vec<Event> {
        self.sort(SortOrder::OldestFirst, sort_in_place)
    }

    /// Returns the events, where the latest are listed first
    pub fn sort_by_latest(&mut self, sort_in_place: bool) -> Vec<Event> {
        self.sort(SortOrder::LatestFirst, sort_in_place)
    }

    fn sort(&mut self, order: SortOrder, sort_in_place: bool) -> Vec<Event> {
        let sorted = self.sorted(order);
        if sort_in_place {
            self.list.replace(sorted.clone());
        }
        sorted
    }
}

impl<F> Index<usize> for Calendar<F> {
    type Output = Event;

    fn index(&self, index: usize) -> &Event {
        &self.list.events[index]
    }
}

impl<'a, F> IntoIterator for &'a Calendar<F> {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.events.iter()
    }
}
