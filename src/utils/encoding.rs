//! Encoding detection and conversion utilities
//!
//! Uploaded CSV files come from spreadsheets saved in whatever encoding the
//! user's locale defaults to.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

/// Detect the encoding of raw bytes: BOM first, then valid UTF-8, then chardetng
pub fn detect_encoding(data: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(data) {
        return encoding;
    }

    if std::str::from_utf8(data).is_ok() {
        return UTF_8;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(data, true);
    detector.guess(None, true)
}

/// Decode to a `String`, dropping any BOM; returns the encoding used
pub fn decode_to_string(data: &[u8]) -> (String, &'static Encoding) {
    let encoding = detect_encoding(data);
    let (text, actual, _had_errors) = encoding.decode(data);
    (text.into_owned(), actual)
}
