//! Turning a raw RFC 5322 message into a [`CandidateMessage`].
//!
//! Body text is decoded lossily: the transfer encoding is undone, then the
//! bytes are read as UTF-8 and any invalid sequences are dropped. The body is
//! only ever searched for a code, so exact reproduction does not matter.

use crate::error::{Error, Result};
use crate::model::CandidateMessage;
use chrono::{DateTime, Local};
use mailparse::{parse_mail, MailHeaderMap, ParsedMail};
use tracing::debug;

/// Parses a fetched message into its timestamp and plain-text body.
///
/// # Errors
///
/// Returns [`Error::ParseEmail`] if the message is malformed,
/// [`Error::InvalidDate`] if the `Date` header is missing or unparsable, and
/// [`Error::ExtractBody`] if the body's transfer encoding cannot be undone.
pub fn parse_candidate(uid: u32, raw: &[u8]) -> Result<CandidateMessage> {
    let parsed = parse_mail(raw).map_err(|source| Error::ParseEmail { uid, source })?;
    let timestamp = parse_date(uid, &parsed)?;
    let body = extract_plain_text(&parsed).map_err(|source| Error::ExtractBody { uid, source })?;

    debug!(uid, %timestamp, body_len = body.len(), "Parsed message");

    Ok(CandidateMessage {
        uid,
        timestamp,
        body,
    })
}

/// Reads the `Date` header, honouring its declared zone, and converts it to local time.
fn parse_date(uid: u32, parsed: &ParsedMail<'_>) -> Result<DateTime<Local>> {
    let header = parsed
        .headers
        .get_first_value("Date")
        .ok_or_else(|| Error::InvalidDate {
            uid,
            reason: "missing Date header".into(),
        })?;

    let epoch = mailparse::dateparse(&header).map_err(|reason| Error::InvalidDate {
        uid,
        reason: format!("{reason}: {header}"),
    })?;

    DateTime::from_timestamp(epoch, 0)
        .map(|utc| utc.with_timezone(&Local))
        .ok_or_else(|| Error::InvalidDate {
            uid,
            reason: format!("timestamp out of range: {header}"),
        })
}

/// Multipart messages yield their first `text/plain` leaf (or nothing); anything
/// else yields its single payload.
fn extract_plain_text(
    parsed: &ParsedMail<'_>,
) -> std::result::Result<String, mailparse::MailParseError> {
    if is_multipart(parsed) {
        return match first_plain_part(parsed) {
            Some(part) => Ok(decode_lossy(&part.get_body_raw()?)),
            None => Ok(String::new()),
        };
    }

    Ok(decode_lossy(&parsed.get_body_raw()?))
}

fn is_multipart(part: &ParsedMail<'_>) -> bool {
    !part.subparts.is_empty() || part.ctype.mimetype.starts_with("multipart/")
}

/// Depth-first, document order.
fn first_plain_part<'p, 'a>(part: &'p ParsedMail<'a>) -> Option<&'p ParsedMail<'a>> {
    if part.subparts.is_empty() {
        return part
            .ctype
            .mimetype
            .eq_ignore_ascii_case("text/plain")
            .then_some(part);
    }
    part.subparts.iter().find_map(first_plain_part)
}

/// Decodes UTF-8, discarding invalid byte sequences instead of replacing them.
#[must_use]
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract_code;
    use chrono::{TimeZone, Utc};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
            .with_timezone(&Local)
    }

    #[test]
    fn test_simple_message() {
        let raw = b"From: noreply@ticketmaster.com\r\n\
Date: Mon, 19 Oct 2026 10:00:00 +0000\r\n\
Subject: Your code\r\n\
\r\n\
Your verification code is 654321.";
        let msg = parse_candidate(42, raw).unwrap();
        assert_eq!(msg.uid, 42);
        assert_eq!(msg.timestamp, utc(2026, 10, 19, 10, 0, 0));
        assert_eq!(extract_code(&msg.body), Some("654321"));
    }

    #[test]
    fn test_date_honours_declared_zone() {
        let raw = b"Date: Mon, 19 Oct 2026 12:30:00 +0200\r\n\r\nbody";
        let msg = parse_candidate(1, raw).unwrap();
        assert_eq!(msg.timestamp, utc(2026, 10, 19, 10, 30, 0));
    }

    #[test]
    fn test_missing_date_is_error() {
        let raw = b"From: a@b.c\r\n\r\nYour code is 123456";
        let err = parse_candidate(3, raw).unwrap_err();
        assert!(matches!(err, Error::InvalidDate { uid: 3, .. }));
    }

    #[test]
    fn test_garbage_date_is_error() {
        let raw = b"Date: not a date at all\r\n\r\nYour code is 123456";
        assert!(matches!(
            parse_candidate(4, raw),
            Err(Error::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_multipart_prefers_first_plain_part() {
        let raw = b"Date: Mon, 19 Oct 2026 10:00:00 +0000\r\n\
Content-Type: multipart/alternative; boundary=\"XX\"\r\n\
\r\n\
--XX\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>html 999999</p>\r\n\
--XX\r\n\
Content-Type: text/plain\r\n\
\r\n\
plain 111111\r\n\
--XX\r\n\
Content-Type: text/plain\r\n\
\r\n\
second 222222\r\n\
--XX--\r\n";
        let msg = parse_candidate(5, raw).unwrap();
        assert_eq!(extract_code(&msg.body), Some("111111"));
        assert!(!msg.body.contains("999999"));
    }

    #[test]
    fn test_nested_multipart() {
        let raw = b"Date: Mon, 19 Oct 2026 10:00:00 +0000\r\n\
Content-Type: multipart/mixed; boundary=\"OUT\"\r\n\
\r\n\
--OUT\r\n\
Content-Type: multipart/alternative; boundary=\"IN\"\r\n\
\r\n\
--IN\r\n\
Content-Type: text/plain\r\n\
\r\n\
nested 333333\r\n\
--IN--\r\n\
--OUT--\r\n";
        let msg = parse_candidate(6, raw).unwrap();
        assert_eq!(extract_code(&msg.body), Some("333333"));
    }

    #[test]
    fn test_multipart_without_plain_part_has_empty_body() {
        let raw = b"Date: Mon, 19 Oct 2026 10:00:00 +0000\r\n\
Content-Type: multipart/alternative; boundary=\"XX\"\r\n\
\r\n\
--XX\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>444444</p>\r\n\
--XX--\r\n";
        let msg = parse_candidate(7, raw).unwrap();
        assert!(msg.body.is_empty());
    }

    #[test]
    fn test_base64_body_is_decoded() {
        // "code 555555"
        let raw = b"Date: Mon, 19 Oct 2026 10:00:00 +0000\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
Y29kZSA1NTU1NTU=\r\n";
        let msg = parse_candidate(8, raw).unwrap();
        assert_eq!(extract_code(&msg.body), Some("555555"));
    }

    #[test]
    fn test_decode_lossy_drops_invalid_bytes() {
        assert_eq!(decode_lossy(b"code \xff\xfe123456"), "code 123456");
        assert_eq!(decode_lossy("caf\u{e9}".as_bytes()), "caf\u{e9}");
        assert_eq!(decode_lossy(b""), "");
    }
}
