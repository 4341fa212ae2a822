//! Parse a calendar and print its events as JSON, oldest first
//!
//! Usage: `calendar-dump <xml|ics> <url-or-path>`

use calendar_feed::{Calendar, Format, ParseOptions};

const USAGE: &str = "Usage: calendar-dump <xml|ics> <url-or-path>";

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (format, resource) = match args.as_slice() {
        [format, resource] => (format.as_str(), resource.as_str()),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    if let Err(err) = run(format, resource).await {
        log::error!("Unable to dump {}: {}", resource, err);
        std::process::exit(1);
    }
}

async fn run(format: &str, resource: &str) -> Result<(), Box<dyn std::error::Error>> {
    let is_url = resource.starts_with("http://") || resource.starts_with("https://");
    let mut calendar = Calendar::new();
    let format = match (format, is_url) {
        ("xml", true) => { calendar.set_xml_url(resource)?; Format::Xml },
        ("xml", false) => { calendar.set_xml_file(resource); Format::Xml },
        ("ics", true) => { calendar.set_ics_url(resource)?; Format::Ics },
        ("ics", false) => { calendar.set_ics_file(resource); Format::Ics },
        (other, _) => return Err(format!("unknown format {:?}. {}", other, USAGE).into()),
    };

    calendar.parse_to_list(ParseOptions::new().format(format)).await?;
    if let Some(title) = &calendar.metadata().title {
        log::info!("Calendar {:?}", title);
    }

    let events = calendar.sort_by_oldest(false);
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}
