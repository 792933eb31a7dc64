//! The rewriter: a two-pass transform over a whole class file.
//!
//! Pass 1 (discovery) walks the constant pool, scanning every Utf8 entry's payload for
//! mapping matches and recording a [`PatchRecord`] per affected entry. Pass 2
//! (materialization) copies the input into a freshly sized buffer, applying each record's
//! replacements and fixing up the entry's length prefix along the way.

use std::borrow::Cow;

use byteorder::{BigEndian, ByteOrder};

use crate::constant_pool::{self, PoolEntryKind};
use crate::error::{Error, Result};
use crate::mapping::MappingTable;

const HEADER_LEN: usize = 10; // magic(4) + minor(2) + major(2) + constant_pool_count(2)

/// A single `(mapping_index, match_offset)` pair: `match_offset` is a whole-file byte
/// offset, and `mapping_index` indexes into [`MappingTable::entries`].
type Replacement = (usize, usize);

/// The set of replacements found inside one Utf8 constant-pool entry.
#[derive(Debug, Clone)]
struct PatchRecord {
    entry_body_offset: usize,
    net_length_delta: i64,
    replacements: Vec<Replacement>,
}

/// Rewrites `input`'s string-table entries according to `mapping`.
///
/// Returns `Cow::Borrowed(input)` untouched when no entry contains a match, or a freshly
/// allocated `Cow::Owned` buffer with every match applied and length prefixes fixed up.
pub fn transform<'a>(input: &'a [u8], mapping: &MappingTable) -> Result<Cow<'a, [u8]>> {
    if input.len() < HEADER_LEN {
        return Err(Error::MalformedClassFile("buffer shorter than class file header"));
    }

    let pool_size = BigEndian::read_u16(&input[8..10]);

    let utf8_count = {
        let mut count = 0usize;
        constant_pool::walk(input, pool_size, HEADER_LEN, |entry| {
            if entry.kind == PoolEntryKind::Utf8 {
                count += 1;
            }
            Ok(())
        })?;
        count
    };

    let mut plan = Vec::with_capacity(utf8_count);
    let mut total_delta: i64 = 0;
    constant_pool::walk(input, pool_size, HEADER_LEN, |entry| {
        if entry.kind == PoolEntryKind::Utf8 {
            if let Some(record) = scan(
                input,
                entry.payload_offset,
                entry.payload_offset + entry.payload_length,
                mapping,
            ) {
                total_delta += record.net_length_delta;
                plan.push(record);
            }
        }
        Ok(())
    })?;

    if plan.is_empty() {
        return Ok(Cow::Borrowed(input));
    }

    let output_len = (input.len() as i64 + total_delta) as usize;
    let mut output = Vec::with_capacity(output_len);
    output.extend_from_slice(&input[..HEADER_LEN]);
    let mut src = HEADER_LEN;

    for (entry_index, record) in plan.iter().enumerate() {
        output.extend_from_slice(&input[src..record.entry_body_offset]);
        src = record.entry_body_offset;

        patch_length_prefix(&mut output, record.net_length_delta, entry_index as u16)?;

        for &(mapping_index, match_offset) in &record.replacements {
            output.extend_from_slice(&input[src..match_offset]);
            let entry = &mapping.entries()[mapping_index];
            output.extend_from_slice(&entry.to);
            src = match_offset + entry.from.len();
        }
    }
    output.extend_from_slice(&input[src..]);

    debug_assert_eq!(output.len(), output_len);
    Ok(Cow::Owned(output))
}

/// Rewrites the 2-byte big-endian length prefix immediately preceding the bytes just
/// appended to `output`, adding `delta` and failing if the result overflows `u16`.
fn patch_length_prefix(output: &mut [u8], delta: i64, entry_index: u16) -> Result<()> {
    let len_pos = output.len() - 2;
    let original_len = BigEndian::read_u16(&output[len_pos..]);
    let new_len = original_len as i64 + delta;
    if new_len < 0 || new_len > u16::MAX as i64 {
        return Err(Error::LengthOverflow { entry_index });
    }
    BigEndian::write_u16(&mut output[len_pos..len_pos + 2], new_len as u16);
    Ok(())
}

/// Scans `bytes[begin..end)` for non-overlapping mapping matches, left to right,
/// first-match-wins at each position.
fn scan(bytes: &[u8], begin: usize, end: usize, mapping: &MappingTable) -> Option<PatchRecord> {
    let min_from_length = mapping.min_from_length();
    if min_from_length == 0 || end < begin + min_from_length {
        return None;
    }

    let mut record: Option<PatchRecord> = None;
    let mut i = begin;

    while i + min_from_length <= end {
        let found = mapping.entries().iter().enumerate().find_map(|(idx, entry)| {
            let from = &entry.from;
            if end - i < from.len() {
                return None;
            }
            if &bytes[i..i + from.len()] == from.as_slice() {
                Some((idx, from.len()))
            } else {
                None
            }
        });

        match found {
            Some((idx, from_len)) => {
                let entry = &mapping.entries()[idx];
                let delta = entry.to.len() as i64 - entry.from.len() as i64;
                let capacity = (end - i) / min_from_length + 2;
                let record = record.get_or_insert_with(|| PatchRecord {
                    entry_body_offset: begin,
                    net_length_delta: 0,
                    replacements: Vec::with_capacity(capacity),
                });
                record.replacements.push((idx, i));
                record.net_length_delta += delta;
                i += from_len;
            }
            None => i += 1,
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingBuilder;

    fn table(pairs: &[(&str, &str)]) -> MappingTable {
        let mut builder = MappingBuilder::new();
        for (from, to) in pairs {
            builder.add(from, to).unwrap();
        }
        builder.build().unwrap()
    }

    fn class_with_single_utf8(payload: &str) -> Vec<u8> {
        let mut buf = vec![0xCA, 0xFE, 0xBA, 0xBE]; // magic
        buf.extend_from_slice(&[0, 0]); // minor
        buf.extend_from_slice(&[0, 52]); // major
        buf.extend_from_slice(&[0, 2]); // constant_pool_count = 2 (one entry)
        buf.push(1); // Utf8 tag
        buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        buf.extend_from_slice(payload.as_bytes());
        buf.extend_from_slice(&[0xAB, 0xCD]); // trailing "rest of the file"
        buf
    }

    #[test]
    fn no_match_returns_borrowed_input_unchanged() {
        let input = class_with_single_utf8("hello");
        let mapping = table(&[("foo", "bar")]);
        let output = transform(&input, &mapping).unwrap();
        assert!(matches!(output, Cow::Borrowed(_)));
        assert_eq!(&*output, &input[..]);
    }

    #[test]
    fn equal_length_swap_leaves_length_prefix_untouched() {
        let input = class_with_single_utf8("javax/x");
        let mapping = table(&[("javax/", "jakart")]);
        let output = transform(&input, &mapping).unwrap();

        let payload_start = 14;
        assert_eq!(&output[payload_start..payload_start + 7], b"jakartx");
        assert_eq!(&output[12..14], &input[12..14]); // length prefix unchanged
        assert_eq!(output.len(), input.len());
    }

    #[test]
    fn expanding_replacement_grows_length_prefix_and_file() {
        let input = class_with_single_utf8("javax/a");
        let mapping = table(&[("javax/", "jakarta/")]);
        let output = transform(&input, &mapping).unwrap();

        assert_eq!(output.len(), input.len() + 2);
        let new_len = BigEndian::read_u16(&output[12..14]);
        assert_eq!(new_len, 9); // "jakarta/a"
        assert_eq!(&output[14..23], b"jakarta/a");
        // trailing bytes preserved
        assert_eq!(&output[output.len() - 2..], &[0xAB, 0xCD]);
    }

    #[test]
    fn multiple_replacements_in_one_entry() {
        let input = class_with_single_utf8("javax/a;javax/b");
        let mapping = table(&[("javax/", "jakarta/")]);
        let output = transform(&input, &mapping).unwrap();

        let new_len = BigEndian::read_u16(&output[12..14]);
        assert_eq!(new_len, 19); // 15 + 2*2
        assert_eq!(&output[14..33], b"jakarta/a;jakarta/b");
    }

    #[test]
    fn multiple_utf8_entries_mixed_hits() {
        let mut buf = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52];
        buf.extend_from_slice(&[0, 4]); // 3 entries -> count = 4
        for s in ["javax/a", "other", "javax/b"] {
            buf.push(1);
            buf.extend_from_slice(&(s.len() as u16).to_be_bytes());
            buf.extend_from_slice(s.as_bytes());
        }

        let mapping = table(&[("javax/", "jakarta/")]);
        let output = transform(&buf, &mapping).unwrap();

        // "other" entry must be untouched and still present, bracketed by the two rewrites.
        let as_str = String::from_utf8_lossy(&output);
        assert!(as_str.contains("jakarta/a"));
        assert!(as_str.contains("other"));
        assert!(as_str.contains("jakarta/b"));
    }

    #[test]
    fn unknown_tag_rejected_with_no_output() {
        let mut buf = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52, 0, 2];
        buf.push(0x02); // invalid tag
        buf.extend_from_slice(&[0, 0]);

        let mapping = table(&[("foo", "bar")]);
        let err = transform(&buf, &mapping).unwrap_err();
        assert!(matches!(err, Error::UnsupportedClassVersion { tag: 2, .. }));
    }

    #[test]
    fn match_at_exact_start_and_end_of_payload() {
        let input = class_with_single_utf8("javax/");
        let mapping = table(&[("javax/", "x/")]);
        let output = transform(&input, &mapping).unwrap();
        assert_eq!(&output[14..16], b"x/");
    }

    #[test]
    fn partial_trailing_occurrence_is_not_matched() {
        // "javax" (5 bytes) is not a full "javax/" match at the tail.
        let input = class_with_single_utf8("xxjavax");
        let mapping = table(&[("javax/", "jakarta/")]);
        let output = transform(&input, &mapping).unwrap();
        assert!(matches!(output, Cow::Borrowed(_)));
    }

    #[test]
    fn length_prefix_overflow_is_rejected() {
        // A payload of 65534 bytes where a 2-byte match grows to 3 bytes hits 65535 (ok),
        // but growing by 2 would hit 65536 and must fail.
        let base = "a".repeat(65532);
        let payload = format!("{base}zz");
        let input = class_with_single_utf8(&payload);
        let mapping = table(&[("zz", "zzz")]);
        let output = transform(&input, &mapping).unwrap();
        let new_len = BigEndian::read_u16(&output[12..14]);
        assert_eq!(new_len, 65535);

        let mapping_overflow = table(&[("zz", "zzzz")]);
        let err = transform(&input, &mapping_overflow).unwrap_err();
        assert!(matches!(err, Error::LengthOverflow { .. }));
    }

    #[test]
    fn zero_utf8_entries_is_a_no_op() {
        let mut buf = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52, 0, 2];
        buf.push(7); // Class
        buf.extend_from_slice(&[0, 1]);

        let mapping = table(&[("foo", "bar")]);
        let output = transform(&buf, &mapping).unwrap();
        assert!(matches!(output, Cow::Borrowed(_)));
    }

    #[test]
    fn round_trip_with_inverse_mapping() {
        let input = class_with_single_utf8("javax/a;javax/b");
        let forward = table(&[("javax/", "jakarta/")]);
        let backward = table(&[("jakarta/", "javax/")]);

        let once = transform(&input, &forward).unwrap().into_owned();
        let twice = transform(&once, &backward).unwrap();
        assert_eq!(&*twice, &input[..]);
    }
}
