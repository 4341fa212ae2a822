//! This module reads Google-Calendar-style atom feeds
//!
//! The feed is decoded by `minidom`. Feed-level metadata is read eagerly, while `<entry>` elements
//! are only turned into [`Event`](crate::Event)s as they are pulled from [`FeedEvents`].

mod parser;
pub use parser::parse;
pub use parser::FeedEvents;
pub use parser::FeedMetadata;
