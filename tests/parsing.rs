//! Parsing scenarios, from a configured source down to the calendar's events


use std::io::Write;

use chrono::{Datelike, NaiveDate, Weekday};

use calendar_feed::source::{MemoryFetcher, Sources};
use calendar_feed::{Calendar, Error, Event, Format, Frequency, ParseOptions, SortOrder};

const XML_PATH: &str = "/feeds/club.xml";
const ICS_PATH: &str = "/feeds/club.ics";
const BROKEN_PATH: &str = "/feeds/broken.ics";

fn fetcher() -> MemoryFetcher {
    MemoryFetcher::new()
        .with_file(XML_PATH, fixtures::UNORDERED_FEED)
        .with_file(ICS_PATH, fixtures::WEEKLY_ICS)
        .with_file(BROKEN_PATH, fixtures::BROKEN_ICS)
}

fn xml_calendar() -> Calendar<MemoryFetcher> {
    let mut calendar = Calendar::with_fetcher(Sources::new(), fetcher());
    calendar.set_xml_file(XML_PATH);
    calendar
}

fn ics_calendar(path: &str) -> Calendar<MemoryFetcher> {
    let mut calendar = Calendar::with_fetcher(Sources::new(), fetcher());
    calendar.set_ics_file(path);
    calendar
}

fn names(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.name()).collect()
}

#[tokio::test]
async fn xml_feed_sorted_by_oldest() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut calendar = xml_calendar();
    let parsed = calendar.parse_to_list(ParseOptions::default()).await.unwrap();
    assert_eq!(names(&parsed), vec!["New year party", "Spring cleaning", "my birthday"]);

    calendar.sort_by_oldest(true);
    let months: Vec<u32> = calendar.iter().map(|e| e.start_time().unwrap().month()).collect();
    assert_eq!(months, vec![1, 2, 3]);

    let metadata = calendar.metadata();
    assert_eq!(metadata.title.as_deref(), Some("Club events"));
    assert_eq!(metadata.subtitle.as_deref(), Some("Everything the club organizes"));
    assert_eq!(metadata.author.as_deref(), Some("The Club"));
    assert_eq!(metadata.email.as_deref(), Some("club@example.com"));
    assert_eq!(metadata.time_zone, Some(chrono_tz::Europe::Berlin));
    assert_eq!(metadata.last_updated.unwrap().month(), 3);
    assert!(metadata.published.is_none());
}

#[tokio::test]
async fn end_never_precedes_start() {
    let mut calendar = xml_calendar();
    calendar.parse_to_list(ParseOptions::default()).await.unwrap();

    for event in &calendar {
        if let (Some(start), Some(end)) = (event.start_time(), event.end_time()) {
            assert!(end >= start, "{} ends before it starts", event.name());
        }
    }
}

#[tokio::test]
async fn ics_weekly_rule() {
    let mut calendar = ics_calendar(ICS_PATH);
    calendar.parse_to_list(ParseOptions::default()).await.unwrap();

    let training = calendar.get("Training").unwrap();
    assert!(training.repeats());
    assert_eq!(training.repeat_freq(), Frequency::Weekly);
    assert_eq!(training.repeat_day(), &[Weekday::Mon, Weekday::Wed]);
    assert_eq!(training.repeat_until().unwrap().date_naive(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    assert_eq!(training.location(), Some("Gym"));

    let assembly = calendar.get("General assembly").unwrap();
    assert!(assembly.all_day());

    // ICS sources do not provide feed metadata
    assert!(calendar.metadata().title.is_none());
}

#[tokio::test]
async fn repeat_fields_are_set_only_on_repeating_events() {
    let mut calendar = ics_calendar(ICS_PATH);
    calendar.parse_to_list(ParseOptions::default()).await.unwrap();
    calendar.set_xml_file(XML_PATH);
    calendar.parse_to_list(ParseOptions::new().format(Format::Xml).overwrite(false)).await.unwrap();
    assert_eq!(calendar.len(), 5);

    for event in &calendar {
        let any_repeat_field = event.repeat_freq() != Frequency::None
            || !event.repeat_day().is_empty()
            || !event.repeat_month().is_empty()
            || event.repeat_until().is_some();
        assert_eq!(event.repeats(), any_repeat_field, "{}", event.name());
    }
}

#[tokio::test]
async fn format_is_inferred_from_a_single_source() {
    let mut calendar = xml_calendar();
    let stream = calendar.parse(ParseOptions::default()).await.unwrap();
    assert_eq!(stream.format(), Format::Xml);
    assert_eq!(stream.count(), 3);
    assert_eq!(calendar.len(), 3);
}

#[tokio::test]
async fn two_formats_without_selection_are_ambiguous() {
    let mut calendar = xml_calendar();
    calendar.set_ics_file(ICS_PATH);

    assert!(matches!(calendar.parse(ParseOptions::default()).await, Err(Error::AmbiguousSource)));
    assert!(calendar.is_empty());

    calendar.parse_to_list(ParseOptions::new().format(Format::Ics)).await.unwrap();
    assert_eq!(calendar.len(), 2);
}

#[tokio::test]
async fn no_source() {
    let mut calendar = Calendar::with_fetcher(Sources::new(), fetcher());
    assert!(matches!(calendar.parse(ParseOptions::default()).await, Err(Error::MissingSource(None))));
}

#[tokio::test]
async fn overwrite_replaces_and_append_accumulates() {
    let mut calendar = xml_calendar();
    calendar.set_ics_file(ICS_PATH);
    let xml = ParseOptions::new().format(Format::Xml);
    let ics = ParseOptions::new().format(Format::Ics);

    calendar.parse_to_list(xml).await.unwrap();
    calendar.parse_to_list(ics).await.unwrap();
    assert_eq!(calendar.len(), 2);
    assert!(!calendar.contains("my birthday"));

    calendar.parse_to_list(xml.overwrite(false)).await.unwrap();
    assert_eq!(calendar.len(), 5);
    // No duplicate detection
    calendar.parse_to_list(xml.overwrite(false)).await.unwrap();
    assert_eq!(calendar.len(), 8);
    assert_eq!(calendar.get_all("Spring cleaning").len(), 2);
}

#[tokio::test]
async fn membership_is_exact() {
    let mut calendar = xml_calendar();
    calendar.parse_to_list(ParseOptions::default()).await.unwrap();

    assert!(calendar.contains("my birthday"));
    assert!(!calendar.contains("My Birthday"));
    assert!(!calendar.contains(" my birthday"));
    assert!(matches!(calendar.get("My birthday"), Err(Error::NoSuchEvent(_))));
}

#[tokio::test]
async fn sorting_depends_only_on_start_times() {
    let mut calendar = xml_calendar();
    calendar.parse_to_list(ParseOptions::default()).await.unwrap();

    let oldest = calendar.sorted(SortOrder::OldestFirst);
    calendar.sort_by_latest(false);
    assert_eq!(calendar.sort_by_oldest(false), oldest);

    // Idempotent
    calendar.sort_by_latest(true);
    let once = calendar.events().to_vec();
    assert_eq!(calendar.sort_by_latest(true), once);
    assert_eq!(names(&once), vec!["Spring cleaning", "my birthday", "New year party"]);
}

#[tokio::test]
async fn failed_parse_leaves_events_untouched() {
    let mut calendar = ics_calendar(BROKEN_PATH);
    calendar.set_xml_file(XML_PATH);
    let broken = ParseOptions::new().format(Format::Ics);

    calendar.parse_to_list(ParseOptions::new().format(Format::Xml)).await.unwrap();
    let before = calendar.events().to_vec();

    let err = calendar.parse_to_list(broken).await.unwrap_err();
    assert!(matches!(err, Error::MalformedCalendar(_)));
    assert_eq!(calendar.events(), &before[..]);

    let err = calendar.parse_to_list(broken.overwrite(false)).await.unwrap_err();
    assert!(err.is_malformed());
    assert_eq!(calendar.events(), &before[..]);

    // Consumed lazily, the first event is still handed out before the failure
    let mut stream = calendar.parse(broken).await.unwrap();
    assert_eq!(stream.next().unwrap().unwrap().name(), "Fine");
    assert!(stream.next().unwrap().is_err());
    assert!(stream.next().is_none());
    drop(stream);
    assert_eq!(calendar.len(), 3);
}

#[tokio::test]
async fn local_files() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut file = tempfile::Builder::new().suffix(".ics").tempfile().unwrap();
    file.write_all(fixtures::WEEKLY_ICS.as_bytes()).unwrap();

    let mut calendar = Calendar::new();
    calendar.set_ics_file(file.path());
    let events = calendar.parse_to_list(ParseOptions::default()).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(calendar[0].name(), "Training");

    let mut missing = Calendar::new();
    missing.set_xml_file(file.path().with_extension("xml"));
    let err = missing.parse_to_list(ParseOptions::default()).await.unwrap_err();
    assert!(err.is_retrieval());
}

#[tokio::test]
async fn malformed_feed_is_reported() {
    let fetcher = MemoryFetcher::new().with_file(XML_PATH, "<feed xmlns='http://www.w3.org/2005/Atom'><entry>");
    let mut calendar = Calendar::with_fetcher(Sources::new(), fetcher);
    calendar.set_xml_file(XML_PATH);

    assert!(matches!(calendar.parse(ParseOptions::default()).await, Err(Error::MalformedFeed(_))));
}

#[tokio::test]
async fn unrepresentable_duration_is_reported() {
    let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nSUMMARY:Forever\r\nDTSTART:20240101T100000Z\r\nDURATION:P999999999999999D\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
    let fetcher = MemoryFetcher::new().with_file(ICS_PATH, ics);
    let mut calendar = Calendar::with_fetcher(Sources::new(), fetcher);
    calendar.set_ics_file(ICS_PATH);

    let err = calendar.parse_to_list(ParseOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::MalformedCalendar(_)));
    assert!(calendar.is_empty());
}

#[test]
fn invalid_url() {
    let mut calendar = Calendar::new();
    assert!(matches!(calendar.set_ics_url("not a url"), Err(Error::InvalidUrl(_))));
}
