//! Hex-dump input parsing
//!
//! Captured frames are stored one per line as hex strings (the form they
//! appear in broker dumps and debug logs). Whitespace inside a line is
//! tolerated; blank lines and `#` comments are skipped by the caller.

use anyhow::{bail, Result};

/// Decode one hex-encoded line into raw bytes
pub fn decode_line(line: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(line.len() / 2);
    let mut high: Option<u8> = None;

    for (pos, ch) in line.char_indices() {
        if ch.is_ascii_whitespace() {
            continue;
        }
        let nibble = match ch.to_digit(16) {
            Some(d) => d as u8,
            None => bail!("invalid hex character {ch:?} at column {pos}"),
        };
        high = match high {
            None => Some(nibble),
            Some(h) => {
                bytes.push(h << 4 | nibble);
                None
            }
        };
    }

    if high.is_some() {
        bail!("odd number of hex digits");
    }
    Ok(bytes)
}
