// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-string codec — converts between Rust strings and the document's
// text-string encoding (UTF-16BE behind a FE FF marker).
//
// Malformed input never aborts a conversion: an offending code point is
// dropped and decoding resumes at the next well-formed sequence.

use tracing::debug;

use crate::types::TextString;

/// Byte-order marker opening every UTF-16BE text string.
pub const UTF16_BE_MARKER: [u8; 2] = [0xFE, 0xFF];

/// Marker of the UTF-8 text strings introduced by PDF 2.0.
pub const UTF8_MARKER: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Stateless converter passed to the components that handle field text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl TextCodec {
    pub fn new() -> Self {
        Self
    }

    /// Decode document text-string bytes into a Rust string.
    ///
    /// Accepts UTF-16BE with its marker, UTF-8 with its marker, and
    /// marker-less PDFDocEncoding. Empty input yields an empty string.
    pub fn decode(&self, bytes: &[u8]) -> String {
        if let Some(body) = bytes.strip_prefix(&UTF16_BE_MARKER) {
            return decode_utf16_be(body);
        }
        if let Some(body) = bytes.strip_prefix(&UTF8_MARKER) {
            return String::from_utf8_lossy(body).into_owned();
        }
        decode_pdf_doc(bytes)
    }

    pub fn decode_text(&self, text: &TextString) -> String {
        self.decode(text.as_bytes())
    }

    /// Encode a string as a marked UTF-16BE text string.
    pub fn encode(&self, text: &str) -> TextString {
        self.encode_bytes(text.as_bytes())
    }

    /// Encode raw UTF-8 bytes, tolerating malformed sequences.
    ///
    /// Truncated or broken multi-byte sequences, surrogate code points and
    /// values above U+10FFFF contribute nothing to the output.
    pub fn encode_bytes(&self, utf8: &[u8]) -> TextString {
        let mut out = Vec::with_capacity(2 + utf8.len() * 2);
        out.extend_from_slice(&UTF16_BE_MARKER);

        let mut dropped = 0usize;
        let mut units = [0u16; 2];
        let mut i = 0;
        while i < utf8.len() {
            let lead = utf8[i];
            let (len, initial) = match lead {
                0x00..=0x7F => (1, u32::from(lead)),
                0xC0..=0xDF => (2, u32::from(lead & 0x1F)),
                0xE0..=0xEF => (3, u32::from(lead & 0x0F)),
                0xF0..=0xF7 => (4, u32::from(lead & 0x07)),
                _ => {
                    // Stray continuation byte or invalid lead.
                    dropped += 1;
                    i += 1;
                    continue;
                }
            };

            let end = i + len;
            let continuation_ok = end <= utf8.len()
                && utf8[i + 1..end].iter().all(|byte| byte & 0xC0 == 0x80);
            if !continuation_ok {
                dropped += 1;
                i += 1;
                while i < utf8.len() && utf8[i] & 0xC0 == 0x80 {
                    i += 1;
                }
                continue;
            }

            let code_point = utf8[i + 1..end]
                .iter()
                .fold(initial, |acc, byte| (acc << 6) | u32::from(byte & 0x3F));
            i = end;

            // `from_u32` rejects exactly the surrogate range and values past U+10FFFF.
            match char::from_u32(code_point) {
                Some(ch) => {
                    for unit in ch.encode_utf16(&mut units) {
                        out.extend_from_slice(&unit.to_be_bytes());
                    }
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!(dropped, "dropped malformed code points while encoding text");
        }
        TextString::from_bytes(out)
    }
}

fn decode_utf16_be(body: &[u8]) -> String {
    let chunks = body.chunks_exact(2);
    let trailing = chunks.remainder().len();
    let units = chunks.map(|pair| u16::from_be_bytes([pair[0], pair[1]]));

    let mut dropped = trailing;
    let text: String = char::decode_utf16(units)
        .filter_map(|unit| match unit {
            Ok(ch) => Some(ch),
            Err(_) => {
                dropped += 1;
                None
            }
        })
        .collect();

    if dropped > 0 {
        debug!(dropped, "dropped malformed units while decoding text");
    }
    text
}

fn decode_pdf_doc(bytes: &[u8]) -> String {
    bytes.iter().filter_map(|&byte| pdf_doc_char(byte)).collect()
}

/// Map one PDFDocEncoding byte to its character; `None` for undefined codes.
fn pdf_doc_char(byte: u8) -> Option<char> {
    let code = match byte {
        0x18 => 0x02D8,
        0x19 => 0x02C7,
        0x1A => 0x02C6,
        0x1B => 0x02D9,
        0x1C => 0x02DD,
        0x1D => 0x02DB,
        0x1E => 0x02DA,
        0x1F => 0x02DC,
        0x7F | 0x9F | 0xAD => return None,
        0x80 => 0x2022,
        0x81 => 0x2020,
        0x82 => 0x2021,
        0x83 => 0x2026,
        0x84 => 0x2014,
        0x85 => 0x2013,
        0x86 => 0x0192,
        0x87 => 0x2044,
        0x88 => 0x2039,
        0x89 => 0x203A,
        0x8A => 0x2212,
        0x8B => 0x2030,
        0x8C => 0x201E,
        0x8D => 0x201C,
        0x8E => 0x201D,
        0x8F => 0x2018,
        0x90 => 0x2019,
        0x91 => 0x201A,
        0x92 => 0x2122,
        0x93 => 0xFB01,
        0x94 => 0xFB02,
        0x95 => 0x0141,
        0x96 => 0x0152,
        0x97 => 0x0160,
        0x98 => 0x0178,
        0x99 => 0x017D,
        0x9A => 0x0131,
        0x9B => 0x0142,
        0x9C => 0x0153,
        0x9D => 0x0161,
        0x9E => 0x017E,
        0xA0 => 0x20AC,
        other => u32::from(other),
    };
    char::from_u32(code)
}
