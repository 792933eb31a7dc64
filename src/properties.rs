//! Loads a `key=value` mapping resource in the style of a `java.util.Properties` text
//! file: one pair per line, `#`/`!` prefixed lines are whole-line comments, blank lines are
//! skipped. Continuation lines and `\uXXXX` escapes aren't supported: namespace-migration
//! mappings are flat ASCII package prefixes, not general property values.

use std::io::{self, BufRead};

/// Parses `key=value` pairs from `reader`, preserving file order.
///
/// Lines with no `=` are skipped (mirroring `java.util.Properties`' tolerance for
/// malformed lines rather than failing the whole load).
pub fn parse(reader: impl BufRead) -> io::Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            pairs.push((key.trim().to_string(), value.trim().to_string()));
        }
    }
    Ok(pairs)
}
