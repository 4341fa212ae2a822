//! This crate reads calendars published as Google-Calendar-style XML atom feeds or as iCal (.ics) exports.
//!
//! Both formats are turned into the same [`Event`] type, and gathered into a [`Calendar`] that can be read
//! like a list, like a map keyed by event name, and sorted by start time.
//!
//! Sources are URLs or local files, configured in [`Sources`](source::Sources) and retrieved by a
//! [`Fetcher`](source::Fetcher). Parsing is lazy: events are decoded as they are pulled from the
//! [`EventStream`](calendar::EventStream) returned by [`Calendar::parse`].
//!
//! ```no_run
//! # async fn run() -> Result<(), calendar_feed::Error> {
//! use calendar_feed::{Calendar, ParseOptions};
//!
//! let mut calendar = Calendar::new();
//! calendar.set_ics_url("https://calendar.example.com/basic.ics")?;
//! calendar.parse_to_list(ParseOptions::default()).await?;
//! for event in calendar.sort_by_oldest(true) {
//!     println!("{}: {:?}", event.name(), event.start_time());
//! }
//! # Ok(())
//! # }
//! ```

pub mod calendar;
pub use calendar::{Calendar, ParseOptions, SortOrder};
mod event;
pub use event::{Event, Field, FieldValue};
mod error;
pub use error::{Error, Result};
pub mod recurrence;
pub use recurrence::{Frequency, Recurrence};
pub mod source;
pub use source::Format;

pub mod ics;
pub mod xml;

pub mod config;
pub mod timezone;
pub mod utils;
