//! Deutsche Bahn timetable payload parsing.
//!
//! The timetable plan endpoint answers with XML in which each stop is an
//! `<s>` element carrying a departure child like
//! `<dp pt="2608251230" ppth="Neubiberg|Ostbahnhof|M&#252;nchen Hbf"/>`.
//! Only two attributes matter here (`pt`, the planned departure time, and
//! `ppth`, the remaining station path), so a small attribute scanner is
//! used instead of a full XML dependency.

use chrono::NaiveDateTime;

/// Attribute timestamp format used by the timetable API (`yymmddHHMM`).
const TIMETABLE_TIME_FORMAT: &str = "%y%m%d%H%M";

/// A planned departure extracted from one `<dp>` element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Departure {
    /// Planned departure time.
    pub time: NaiveDateTime,
    /// Terminal station, the last entry of the `ppth` path.
    pub destination: String,
}

/// Minutes until the next upcoming departure that is not bound for one of
/// the `outbound` terminal stations.
///
/// Returns `None` when the document contains no usable departure, which
/// callers treat as "no data". Departures in the past are skipped.
pub fn next_departure_minutes(
    xml: &str,
    now: NaiveDateTime,
    outbound: &[String],
) -> Option<u32> {
    departures(xml)
        .into_iter()
        .filter(|d| !outbound.contains(&d.destination))
        .filter(|d| d.time >= now)
        .map(|d| (d.time - now).num_minutes() as u32)
        .min()
}

/// Every well-formed departure in the document; malformed elements are
/// skipped rather than failing the whole payload.
pub fn departures(xml: &str) -> Vec<Departure> {
    departure_tags(xml)
        .into_iter()
        .filter_map(|tag| {
            let time =
                NaiveDateTime::parse_from_str(&attr(tag, "pt")?, TIMETABLE_TIME_FORMAT).ok()?;
            let path = attr(tag, "ppth")?;
            let destination = path.rsplit('|').next()?.to_string();
            Some(Departure { time, destination })
        })
        .collect()
}

/// Slices of every `<dp ...>` start tag in the document.
fn departure_tags(xml: &str) -> Vec<&str> {
    let mut tags = Vec::new();
    let mut rest = xml;
    while let Some(pos) = rest.find("<dp") {
        let after = &rest[pos + 3..];
        // Require a real tag boundary so `<dpx>` never matches.
        if after.starts_with(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>') {
            match after.find('>') {
                Some(end) => {
                    tags.push(&after[..end]);
                    rest = &after[end + 1..];
                }
                None => break,
            }
        } else {
            rest = after;
        }
    }
    tags
}

/// Value of `name="..."` inside a start tag, entity-decoded.
fn attr(tag: &str, name: &str) -> Option<String> {
    let needle = format!(" {name}=\"");
    let start = tag.find(&needle)? + needle.len();
    let end = tag[start..].find('"')?;
    Some(unescape(&tag[start..start + end]))
}

/// Decode the predefined XML entities plus numeric character references.
fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let decoded = rest
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => entity
            .strip_prefix("#x")
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
            .and_then(char::from_u32),
    }
}
