//! Decoding of event object keys and archive-extension detection.

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// The only archive extension the expander handles.
pub const ARCHIVE_EXTENSION: &str = "zip";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyDecodeError {
    #[error("malformed percent escape at byte {0}")]
    MalformedEscape(usize),
    #[error("decoded key is not valid UTF-8")]
    InvalidUtf8,
}

/// Decode a URL-encoded event key into the literal store key.
///
/// `+` becomes a space first, then percent escapes are decoded as UTF-8, so
/// `%2B` still yields a literal `+`. Every `%` must be followed by two hex
/// digits.
pub fn decode_object_key(raw: &str) -> Result<String, KeyDecodeError> {
    let spaced = raw.replace('+', " ");

    let bytes = spaced.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            match escape {
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                _ => return Err(KeyDecodeError::MalformedEscape(i)),
            }
        } else {
            i += 1;
        }
    }

    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|key| key.into_owned())
        .map_err(|_| KeyDecodeError::InvalidUtf8)
}

/// Lower-cased text after the last `.` of the key, or `None` without a dot.
///
/// The whole key is considered, so a dot in a "directory" part counts:
/// `release.v2/readme` yields `v2/readme`.
pub fn key_extension(key: &str) -> Option<String> {
    key.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

pub fn is_archive_key(key: &str) -> bool {
    key_extension(key).as_deref() == Some(ARCHIVE_EXTENSION)
}
