//! Document information dictionary.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::model::Metadata;

use super::backend::decode_text_simple;

/// Read `/Info` into [`Metadata`]. Missing or malformed entries are skipped.
pub fn extract_metadata(doc: &LopdfDocument) -> Metadata {
    let mut metadata = Metadata::with_version(doc.version.to_string());
    metadata.page_count = doc.get_pages().len() as u32;

    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|o| match o {
            Object::Reference(id) => doc.get_dictionary(*id).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        });

    if let Some(info) = info {
        metadata.title = string_entry(info, b"Title");
        metadata.author = string_entry(info, b"Author");
        metadata.subject = string_entry(info, b"Subject");
        metadata.keywords = string_entry(info, b"Keywords");
        metadata.creator = string_entry(info, b"Creator");
        metadata.producer = string_entry(info, b"Producer");
        metadata.created = string_entry(info, b"CreationDate").and_then(|s| parse_pdf_date(&s));
        metadata.modified = string_entry(info, b"ModDate").and_then(|s| parse_pdf_date(&s));
    }

    metadata
}

fn string_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let value = match dict.get(key).ok()? {
        Object::String(bytes, _) => decode_text_simple(bytes),
        Object::Name(bytes) => String::from_utf8_lossy(bytes).to_string(),
        _ => return None,
    };
    let value = value.trim_matches('\0').trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSSOHH'mm'`).
///
/// Every field after the year is optional. The offset suffix is honored;
/// a missing offset is read as UTC.
pub fn parse_pdf_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);

    if s.len() < 4 {
        return None;
    }

    let digits = |range: std::ops::Range<usize>| s.get(range).and_then(|v| v.parse::<u32>().ok());

    let year = s.get(0..4)?.parse::<i32>().ok()?;
    let month = digits(4..6).unwrap_or(1);
    let day = digits(6..8).unwrap_or(1);
    let hour = digits(8..10).unwrap_or(0);
    let minute = digits(10..12).unwrap_or(0);
    let second = digits(12..14).unwrap_or(0);

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;

    let offset_secs = match s.get(14..15) {
        Some(sign @ ("+" | "-")) => {
            let rest: String = s[15..].chars().filter(|c| c.is_ascii_digit()).collect();
            let oh: i32 = rest.get(0..2).and_then(|v| v.parse().ok()).unwrap_or(0);
            let om: i32 = rest.get(2..4).and_then(|v| v.parse().ok()).unwrap_or(0);
            let secs = oh * 3600 + om * 60;
            if sign == "-" {
                -secs
            } else {
                secs
            }
        }
        _ => 0,
    };

    let offset = FixedOffset::east_opt(offset_secs)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_pdf_date() {
        let date = parse_pdf_date("D:20240115103045").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
        assert_eq!(date.hour(), 10);
    }

    #[test]
    fn test_parse_pdf_date_minimal() {
        let date = parse_pdf_date("D:2024").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 1);
    }

    #[test]
    fn test_parse_pdf_date_with_offset() {
        let date = parse_pdf_date("D:20240115103045+02'00'").unwrap();
        assert_eq!(date.hour(), 8);

        let date = parse_pdf_date("D:20240115233000-05'30'").unwrap();
        assert_eq!(date.day(), 16);
        assert_eq!(date.hour(), 5);
    }

    #[test]
    fn test_parse_pdf_date_rejects_garbage() {
        assert!(parse_pdf_date("D:20").is_none());
        assert!(parse_pdf_date("D:20241399").is_none());
    }

    #[test]
    fn test_string_entry_skips_blank() {
        let mut dict = Dictionary::new();
        dict.set("Title", Object::string_literal("  "));
        dict.set("Author", Object::string_literal("Ada"));
        assert_eq!(string_entry(&dict, b"Title"), None);
        assert_eq!(string_entry(&dict, b"Author"), Some("Ada".to_string()));
    }
}
