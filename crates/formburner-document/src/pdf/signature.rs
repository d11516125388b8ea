// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signature fields — reads the signature dictionary behind a `/Sig` field.
//
// Signatures are reported, never verified: a present signature value is
// `SignatureNotVerified`, an absent one `SignatureNotFound`.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use formburner_core::types::{SignatureInfo, SignatureStatus, TextString};

use super::fields::{entry, inherited, string_of};

/// Describe the signature of field `id` in a document of `source_len` bytes.
pub fn read(doc: &Document, id: ObjectId, source_len: usize) -> SignatureInfo {
    let Some(signature) = inherited(doc, id, b"V").and_then(|value| value.as_dict().ok()) else {
        return SignatureInfo {
            status: SignatureStatus::SignatureNotFound,
            signer: TextString::default(),
            time: DateTime::<Utc>::default(),
            location: TextString::default(),
            reason: TextString::default(),
            signs_total_document: false,
        };
    };

    let text = |key: &[u8]| {
        entry(doc, signature, key)
            .and_then(string_of)
            .map(TextString::from_bytes)
            .unwrap_or_default()
    };

    let time = entry(doc, signature, b"M")
        .and_then(string_of)
        .and_then(|raw| std::str::from_utf8(raw).ok())
        .and_then(parse_pdf_date)
        .unwrap_or_default();

    let signs_total_document = entry(doc, signature, b"ByteRange")
        .and_then(byte_range)
        .is_some_and(|range| covers_whole_file(range, source_len));

    debug!(?id, signs_total_document, "signature field read");
    SignatureInfo {
        status: SignatureStatus::SignatureNotVerified,
        signer: text(b"Name"),
        time,
        location: text(b"Location"),
        reason: text(b"Reason"),
        signs_total_document,
    }
}

fn byte_range(object: &Object) -> Option<[i64; 4]> {
    let Object::Array(items) = object else {
        return None;
    };
    let values: Vec<i64> = items.iter().filter_map(|item| item.as_i64().ok()).collect();
    values.try_into().ok()
}

/// The two signed ranges must start at 0 and end at the last byte.
fn covers_whole_file([offset1, _, offset2, length2]: [i64; 4], source_len: usize) -> bool {
    offset1 == 0
        && i64::try_from(source_len).is_ok_and(|len| offset2.checked_add(length2) == Some(len))
}

/// Parse a PDF date (`D:YYYYMMDDHHmmSSOHH'mm'`). Everything after the year
/// is optional; a missing offset means UTC.
pub fn parse_pdf_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    let mut cursor = Cursor {
        rest: trimmed.strip_prefix("D:").unwrap_or(trimmed),
    };

    let year = cursor.digits(4)?;
    let month = cursor.digits(2).unwrap_or(1);
    let day = cursor.digits(2).unwrap_or(1);
    let hour = cursor.digits(2).unwrap_or(0);
    let minute = cursor.digits(2).unwrap_or(0);
    let second = cursor.digits(2).unwrap_or(0);

    let sign = match cursor.rest.chars().next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => 0,
    };
    let offset_seconds = if sign == 0 {
        0
    } else {
        cursor.rest = &cursor.rest[1..];
        let hours = cursor.digits(2).unwrap_or(0);
        cursor.rest = cursor.rest.trim_start_matches('\'');
        let minutes = cursor.digits(2).unwrap_or(0);
        sign * i32::try_from(hours * 3600 + minutes * 60).ok()?
    };

    let naive = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?
        .and_hms_opt(hour, minute, second)?;
    let offset = FixedOffset::east_opt(offset_seconds)?;
    Some(offset.from_local_datetime(&naive).single()?.with_timezone(&Utc))
}

struct Cursor<'a> {
    rest: &'a str,
}

impl Cursor<'_> {
    /// Consume exactly `len` ASCII digits.
    fn digits(&mut self, len: usize) -> Option<u32> {
        let head = self.rest.as_bytes().get(..len)?;
        if !head.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let value = self.rest[..len].parse().ok()?;
        self.rest = &self.rest[len..];
        Some(value)
    }
}
