//! Error types
//!
//! Every failure of this crate is one variant of [`Error`], so that callers can tell
//! "the source could not be fetched" from "the source was fetched but could not be decoded"
//! from "the query against the current events was invalid".

use thiserror::Error;

use crate::source::Format;

/// Anything that can go wrong while fetching, decoding or querying a calendar
#[derive(Debug, Error)]
pub enum Error {
    /// The retrieval of a URL or a local file failed
    #[error("source {location} is unavailable: {reason}")]
    SourceUnavailable {
        location: String,
        reason: String,
    },

    /// Both an XML and an ICS source are configured, and no format was selected
    #[error("both an XML and an ICS source are configured, a format must be selected")]
    AmbiguousSource,

    /// No source is configured (for the selected format, if any)
    #[error("no {} source has been configured", format_name(.0))]
    MissingSource(Option<Format>),

    /// A source URL could not be parsed
    #[error("invalid source URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The XML decoder rejected the feed, or an entry holds an undecodable value
    #[error("malformed feed: {0}")]
    MalformedFeed(String),

    /// The ICS decoder rejected the calendar, or an event holds an undecodable value
    #[error("malformed calendar: {0}")]
    MalformedCalendar(String),

    /// A time zone identifier is not known to the time zone database
    #[error("unknown time zone {0:?}")]
    UnknownTimeZone(String),

    /// Two events were compared, but at least one of them has no start time
    #[error("events without a start time cannot be ordered")]
    OrderingUndefined,

    /// A lookup by name or by index did not match any event
    #[error("no such event: {0}")]
    NoSuchEvent(String),

    /// A key-style lookup used a name that is not an event field
    #[error("{0:?} is not an event field")]
    UnknownField(String),
}

impl Error {
    /// Whether this error comes from fetching the raw content (as opposed to decoding or querying it)
    pub fn is_retrieval(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }

    /// Whether this error comes from a decoder rejecting fetched content
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedFeed(_) | Self::MalformedCalendar(_) | Self::UnknownTimeZone(_))
    }
}

fn format_name(format: &Option<Format>) -> String {
    match format {
        Some(format) => format.to_string(),
        None => "calendar".to_string(),
    }
}

/// A specialized Result type for this crate
pub type Result<T, E = Error> = std::result::Result<T, E>;
