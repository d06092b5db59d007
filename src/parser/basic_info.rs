use byteorder::{ByteOrder, LittleEndian};
use indexmap::IndexMap;

use crate::model::FileInfo;

const MAX_KEY_LEN: usize = 80;
const MAX_RECORD_UNITS: usize = 4096;

/// Decodes the `BasicFileInfo` stream.
///
/// The stream mixes binary fields with UTF-16LE text. Most text is stored as
/// records of a `u32` unit count followed by that many UTF-16 units; those
/// are decoded exactly. Whatever text is not framed that way is recovered by
/// decoding the stream at both byte alignments and splitting on control
/// characters. The first occurrence of a key wins, and framed records are
/// read first.
#[must_use]
pub fn parse_basic_file_info(bytes: &[u8]) -> FileInfo {
    let mut entries = IndexMap::new();

    for record in length_prefixed_records(bytes) {
        collect_pairs(&record, &mut entries);
    }

    for alignment in 0..2 {
        let aligned = bytes.get(alignment..).unwrap_or_default();
        let units: Vec<u16> = aligned
            .chunks_exact(2)
            .map(LittleEndian::read_u16)
            .collect();
        let text: String = char::decode_utf16(units)
            .map(|c| c.unwrap_or('\0'))
            .collect();

        collect_pairs(&text, &mut entries);
    }

    FileInfo { entries }
}

fn collect_pairs(text: &str, entries: &mut IndexMap<String, String>) {
    for segment in text.split(|c: char| c.is_control()) {
        if let Some((key, value)) = split_pair(segment) {
            entries.entry(key).or_insert(value);
        }
    }
}

/// Every `u32 count` + `count` UTF-16 units record holding `Key: Value` text.
fn length_prefixed_records(bytes: &[u8]) -> Vec<String> {
    let mut records = Vec::new();
    let mut offset = 0;

    while offset + 4 <= bytes.len() {
        match record_at(bytes, offset) {
            Some((text, len)) => {
                records.push(text);
                offset += len;
            }
            None => offset += 1,
        }
    }

    records
}

fn record_at(bytes: &[u8], offset: usize) -> Option<(String, usize)> {
    let count = LittleEndian::read_u32(bytes.get(offset..offset + 4)?) as usize;
    if count == 0 || count > MAX_RECORD_UNITS {
        return None;
    }

    let end = offset + 4 + count * 2;
    let units = bytes
        .get(offset + 4..end)?
        .chunks_exact(2)
        .map(LittleEndian::read_u16);
    let text: String = char::decode_utf16(units).collect::<Result<_, _>>().ok()?;

    let printable = text
        .chars()
        .all(|c| !c.is_control() || matches!(c, '\r' | '\n' | '\t'));
    (printable && text.contains(':')).then_some((text, end - offset))
}

fn split_pair(segment: &str) -> Option<(String, String)> {
    let (raw_key, value) = segment.split_once(':')?;
    let raw_key = raw_key.trim_end();

    // Binary fields decode to stray characters glued to the front of a key.
    let start = raw_key
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_label_char(*c))
        .last()
        .map(|(i, _)| i)?;
    let key = raw_key[start..]
        .trim_start_matches(|c: char| !c.is_ascii_alphabetic())
        .trim();

    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '\'' | '_' | '-')
}
