//! Some utility functions

use minidom::Element;

/// Returns the first direct child with the given name. Nested elements (e.g. `gd:originalEvent/gd:when`) are not searched
pub fn child<S: AsRef<str>>(parent: &Element, searched_name: S) -> Option<&Element> {
    let searched_name = searched_name.as_ref();
    parent.children().find(|el| el.name() == searched_name)
}

/// The text of an element, or its `value` attribute for the extension elements that carry their data that way
pub fn text_or_value(el: &Element, attr: &str) -> Option<String> {
    match el.attr(attr) {
        Some(value) => Some(value.to_string()),
        None => Some(el.text()),
    }
    .map(|s| normalize(&s))
    .filter(|s| !s.is_empty())
}

/// Remove markup artifacts left in feed text, and collapse its whitespace
pub fn normalize(text: &str) -> String {
    decode_entities(text).split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    let mut decoded = text.to_string();
    for (from, to) in &[
        ("&nbsp;", " "),
        ("&quot;", "\""),
        ("&brvbar;", "|"),
        ("&#39;", "'"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&amp;", "&"),
    ] {
        decoded = decoded.replace(from, to);
    }
    decoded
}

/// Decode the escapes of an iCal TEXT value (RFC 5545, 3.3.11)
pub fn unescape_ical_text(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => unescaped.push('\n'),
            Some(other) => unescaped.push(other),
            None => {},
        }
    }
    decode_entities(&unescaped).trim().to_string()
}
