//! This module reads iCal (.ics) exports
//!
//! The grammar is decoded by the `ical` crate; this module maps its VEVENT components to [`Event`](crate::Event)s.

mod parser;
pub use parser::parse;
pub use parser::IcsEvents;
pub(crate) use parser::param;
