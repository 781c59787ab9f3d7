//! Wildcard byte signatures and the scan over a raw byte buffer.

use crate::error::{Error, Result};

/// A byte signature where some positions are "don't care".
///
/// The text form is whitespace-separated hex tokens with `??` (or `?`) as
/// the wildcard: `"75 ?? 8B 0D"`. Because wildcards live in the type, every
/// byte value 0x00..=0xFF remains searchable literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytePattern {
    bytes: Vec<Option<u8>>,
}

impl BytePattern {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[Option<u8>] {
        &self.bytes
    }

    /// Find the first occurrence of this pattern in `buffer`.
    ///
    /// Naive left-to-right scan: every candidate offset is compared byte by
    /// byte, stopping at the first non-wildcard mismatch. Candidate windows
    /// that would run past the end of the buffer never match. The smallest
    /// matching offset wins; `None` means no offset matched, so a match at
    /// offset 0 is unambiguous.
    pub fn find_in(&self, buffer: &[u8]) -> Option<usize> {
        if buffer.len() < self.bytes.len() {
            return None;
        }

        let last = buffer.len() - self.bytes.len();
        'outer: for i in 0..=last {
            for (j, byte) in self.bytes.iter().enumerate() {
                if let Some(value) = byte
                    && buffer[i + j] != *value
                {
                    continue 'outer;
                }
            }
            return Some(i);
        }

        None
    }
}

/// Parse the text form of a signature.
pub fn parse_pattern(pattern: &str) -> Result<BytePattern> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "??" || token == "?" {
            bytes.push(None);
            continue;
        }

        let value = u8::from_str_radix(token, 16)
            .map_err(|e| Error::InvalidPattern(format!("invalid token '{}': {}", token, e)))?;
        bytes.push(Some(value));
    }

    if bytes.is_empty() {
        return Err(Error::InvalidPattern("pattern is empty".to_string()));
    }
    if bytes.iter().all(|b| b.is_none()) {
        // matches at offset 0 of anything, encodes no signature at all
        return Err(Error::InvalidPattern(
            "pattern consists only of wildcards".to_string(),
        ));
    }

    Ok(BytePattern { bytes })
}

/// Parse replacement bytes. Same token syntax as patterns, but wildcards
/// make no sense in bytes that are about to be written.
pub fn parse_patch_bytes(patch: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in patch.split_whitespace() {
        if token == "??" || token == "?" {
            return Err(Error::InvalidPatch(
                "replacement bytes cannot contain wildcards".to_string(),
            ));
        }

        let value = u8::from_str_radix(token, 16)
            .map_err(|e| Error::InvalidPatch(format!("invalid token '{}': {}", token, e)))?;
        bytes.push(value);
    }

    if bytes.is_empty() {
        return Err(Error::InvalidPatch("patch is empty".to_string()));
    }

    Ok(bytes)
}

pub fn format_pattern(pattern: &BytePattern) -> String {
    pattern
        .bytes
        .iter()
        .map(|b| match b {
            Some(value) => format!("{:02X}", value),
            None => "??".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern_with_wildcards() {
        let pattern = parse_pattern("75 ?? 8B 0D ?? ?? ?? ??").unwrap();
        assert_eq!(pattern.len(), 8);
        assert_eq!(pattern.bytes()[0], Some(0x75));
        assert_eq!(pattern.bytes()[1], None);
        assert_eq!(pattern.bytes()[2], Some(0x8B));
        assert_eq!(pattern.bytes()[3], Some(0x0D));
    }

    #[test]
    fn test_parse_pattern_rejects_bad_token() {
        assert!(parse_pattern("75 GG").is_err());
        assert!(parse_pattern("").is_err());
        assert!(parse_pattern("?? ?? ??").is_err());
    }

    #[test]
    fn test_format_pattern_roundtrip() {
        let pattern = parse_pattern("48 8D 0D ?? FF").unwrap();
        let formatted = format_pattern(&pattern);
        assert_eq!(formatted, "48 8D 0D ?? FF");
        assert_eq!(parse_pattern(&formatted).unwrap(), pattern);
    }

    #[test]
    fn test_parse_patch_bytes() {
        assert_eq!(parse_patch_bytes("EB").unwrap(), vec![0xEB]);
        assert_eq!(parse_patch_bytes("90 90").unwrap(), vec![0x90, 0x90]);
        assert!(parse_patch_bytes("EB ??").is_err());
        assert!(parse_patch_bytes("").is_err());
    }

    #[test]
    fn test_find_literal_first_index() {
        let buffer = [0x10, 0x75, 0x20, 0x75, 0x30];
        let pattern = parse_pattern("75").unwrap();
        assert_eq!(pattern.find_in(&buffer), Some(1));
    }

    #[test]
    fn test_find_wildcard_matches_any_middle_byte() {
        let pattern = parse_pattern("75 ?? 30").unwrap();
        for middle in [0x00u8, 0x2A, 0xFF] {
            let buffer = [0x75, middle, 0x30];
            assert_eq!(pattern.find_in(&buffer), Some(0));
        }
    }

    #[test]
    fn test_find_match_at_offset_zero_is_not_failure() {
        let pattern = parse_pattern("90 90").unwrap();
        assert_eq!(pattern.find_in(&[0x90, 0x90, 0x00]), Some(0));
        assert_eq!(pattern.find_in(&[0x00, 0x00, 0x00]), None);
    }

    #[test]
    fn test_find_first_match_tie_break() {
        let pattern = parse_pattern("90").unwrap();
        assert_eq!(pattern.find_in(&[0x90, 0x90, 0x90]), Some(0));
    }

    #[test]
    fn test_find_never_matches_past_buffer_end() {
        // Agrees on every compared byte, but the window runs out of buffer.
        let pattern = parse_pattern("75 30 30").unwrap();
        assert_eq!(pattern.find_in(&[0x75, 0x30]), None);

        // Trailing wildcards still need real bytes under them.
        let pattern = parse_pattern("75 ?? ??").unwrap();
        assert_eq!(pattern.find_in(&[0x75, 0x30]), None);
    }

    #[test]
    fn test_find_pattern_longer_than_buffer() {
        let pattern = parse_pattern("75 30").unwrap();
        assert_eq!(pattern.find_in(&[]), None);
        assert_eq!(pattern.find_in(&[0x75]), None);
    }
}
