//! Best-effort wire-format detection.

use crate::Format;

/// Guess the format of raw bytes with no explicit selector.
///
/// Empty input is treated as generic text. Input leading with `{` or `[`
/// that parses as JSON is JSON. Otherwise the leading byte decides: the
/// RLP list/long-string prefixes occupy `0xc0..=0xff`, the MessagePack
/// fixmap/fixarray and fixstr prefixes occupy the two adjacent ranges
/// `0x80..=0x9f` and `0xa0..=0xbf`. Everything else is assumed to be a
/// length-delimited protobuf payload.
///
/// This is a heuristic, not a guarantee: ambiguous or malformed binary can
/// be misclassified. Callers that need certainty pass an explicit format.
pub fn detect_format(data: &[u8]) -> Format {
    let trimmed = trim_ascii_whitespace(data);
    if trimmed.is_empty() {
        return Format::Generic;
    }
    if (trimmed[0] == b'{' || trimmed[0] == b'[')
        && std::str::from_utf8(trimmed).is_ok()
        && serde_json::from_slice::<serde_json::Value>(trimmed).is_ok()
    {
        return Format::Json;
    }
    match trimmed[0] {
        0xc0..=0xff => Format::Rlp,
        0x80..=0xbf => Format::MsgPack,
        _ => Format::Protobuf,
    }
}

fn trim_ascii_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &data[start..end]
}
