//! Where calendar data comes from, and how it is retrieved

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use url::Url;

use crate::config;
use crate::error::{Error, Result};

/// The two supported source formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// A Google-Calendar-style atom feed
    Xml,
    /// An iCal export
    Ics,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Xml => write!(f, "XML"),
            Format::Ics => write!(f, "ICS"),
        }
    }
}

/// A remote or local calendar resource
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    Url(Url),
    File(PathBuf),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Url(url) => write!(f, "{}", url),
            Location::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The (up to four) resources a calendar can be read from
///
/// Within a format, a URL takes precedence over a file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sources {
    pub xml_url: Option<Url>,
    pub xml_file: Option<PathBuf>,
    pub ics_url: Option<Url>,
    pub ics_file: Option<PathBuf>,
}

impl Sources {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resource that will be read for the given format, if any
    pub fn active(&self, format: Format) -> Option<Location> {
        let (url, file) = match format {
            Format::Xml => (&self.xml_url, &self.xml_file),
            Format::Ics => (&self.ics_url, &self.ics_file),
        };
        url.clone().map(Location::Url)
            .or_else(|| file.clone().map(Location::File))
    }

    pub fn has(&self, format: Format) -> bool {
        self.active(format).is_some()
    }

    /// Decide which format to read.
    ///
    /// The format is inferred when it is not given and only one format is configured.
    pub fn select(&self, format: Option<Format>) -> Result<(Format, Location)> {
        let format = match format {
            Some(format) => format,
            None => match (self.has(Format::Xml), self.has(Format::Ics)) {
                (true, true) => return Err(Error::AmbiguousSource),
                (true, false) => Format::Xml,
                (false, true) => Format::Ics,
                (false, false) => return Err(Error::MissingSource(None)),
            },
        };

        match self.active(format) {
            Some(location) => Ok((format, location)),
            None => Err(Error::MissingSource(Some(format))),
        }
    }
}

/// Something that turns a [`Location`] into raw calendar content
#[async_trait]
pub trait Fetcher {
    /// Retrieve the whole content of a resource
    async fn fetch(&self, location: &Location) -> Result<String>;
}

/// Fetches URLs over HTTP(S), and reads local files
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {}
    }

    async fn get(&self, url: &Url) -> std::result::Result<String, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config::user_agent());
        if let Some(timeout) = config::http_timeout() {
            builder = builder.timeout(timeout);
        }

        let res = builder.build()?
            .get(url.as_str())
            .send()
            .await?
            .error_for_status()?;
        let text = res.text().await?;
        Ok(text)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, location: &Location) -> Result<String> {
        log::debug!("Fetching {}", location);
        let content = match location {
            Location::Url(url) => self.get(url).await
                .map_err(|err| unavailable(location, err))?,
            Location::File(path) => tokio::fs::read_to_string(path).await
                .map_err(|err| unavailable(location, err))?,
        };
        log::debug!("Fetched {} bytes from {}", content.len(), location);
        Ok(content)
    }
}

fn unavailable<E: fmt::Display>(location: &Location, err: E) -> Error {
    Error::SourceUnavailable {
        location: location.to_string(),
        reason: err.to_string(),
    }
}

/// Serves content from memory
///
/// Useful to feed calendars that have already been downloaded, and in tests
#[derive(Clone, Debug, Default)]
pub struct MemoryFetcher {
    contents: HashMap<Location, String>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: ToString>(&mut self, location: Location, content: S) {
        self.contents.insert(location, content.to_string());
    }

    /// Convenience to serve content for a local path
    pub fn with_file<P: AsRef<Path>, S: ToString>(mut self, path: P, content: S) -> Self {
        self.insert(Location::File(path.as_ref().to_path_buf()), content);
        self
    }

    /// Convenience to serve content for a URL
    pub fn with_url<S: ToString>(mut self, url: &str, content: S) -> Result<Self> {
        self.insert(Location::Url(Url::parse(url)?), content);
        Ok(self)
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, location: &Location) -> Result<String> {
        self.contents.get(location)
            .cloned()
            .ok_or_else(|| unavailable(location, "no such resource"))
    }
}
