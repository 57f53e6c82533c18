//! Byte-order-mark detection and line splitting.
//!
//! Detection never fails: a buffer with no recognised signature is reported as
//! [`EncodingTag::Unknown`] and treated as UTF-8.

/// Text encoding of a raw log buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingTag {
    /// No signature found; decoded as UTF-8.
    #[default]
    Unknown,
    /// Never produced by detection; BOM-less UTF-8 is reported as [`EncodingTag::Unknown`].
    Utf8,
    Utf8Bom,
    Utf16Be,
    Utf16Le,
}

/// Signatures in match order. The first exact prefix match wins.
const SIGNATURES: [(EncodingTag, &[u8]); 3] = [
    (EncodingTag::Utf8Bom, &[0xEF, 0xBB, 0xBF]),
    (EncodingTag::Utf16Be, &[0xFE, 0xFF]),
    (EncodingTag::Utf16Le, &[0xFF, 0xFE]),
];

/// Inspect the leading bytes of `buf`.
///
/// Returns the detected tag and a view of `buf` past the signature (unchanged when nothing
/// matched).
pub fn detect_encoding(buf: &[u8]) -> (EncodingTag, &[u8]) {
    for (tag, signature) in SIGNATURES {
        if let Some(rest) = buf.strip_prefix(signature) {
            return (tag, rest);
        }
    }
    (EncodingTag::Unknown, buf)
}

/// Decode a signature-stripped body into UTF-8 text.
///
/// Invalid sequences are replaced rather than rejected; an odd trailing byte in UTF-16 input is
/// dropped.
pub fn decode(tag: EncodingTag, body: &[u8]) -> String {
    match tag {
        EncodingTag::Utf16Be => decode_utf16(body, u16::from_be_bytes),
        EncodingTag::Utf16Le => decode_utf16(body, u16::from_le_bytes),
        EncodingTag::Unknown | EncodingTag::Utf8 | EncodingTag::Utf8Bom => {
            String::from_utf8_lossy(body).into_owned()
        }
    }
}

fn decode_utf16(body: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = body.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Split text into lines on `\n`.
///
/// Interior empty lines are kept; a single trailing empty segment (text ending in `\n`) is
/// dropped. A trailing `\r` is not part of the line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}
