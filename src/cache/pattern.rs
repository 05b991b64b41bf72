//! Key Pattern Module
//!
//! Glob-style key patterns used for invalidation (`products:list:*`).
//! Only `*` is special; it matches any run of characters, including the
//! empty run and `:` separators. Every other character matches itself.

use crate::error::{CacheError, Result};

// == Key Pattern ==
/// A compiled glob pattern.
///
/// The pattern is split on `*` once at compile time; matching then walks the
/// literal pieces left to right without backtracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    raw: String,
    pieces: Vec<String>,
    anchored_start: bool,
    anchored_end: bool,
}

impl KeyPattern {
    // == Constructor ==
    /// Compiles a pattern, rejecting the empty string.
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(CacheError::InvalidArgument(
                "Pattern cannot be empty".to_string(),
            ));
        }

        let pieces = pattern
            .split('*')
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            raw: pattern.to_string(),
            pieces,
            anchored_start: !pattern.starts_with('*'),
            anchored_end: !pattern.ends_with('*'),
        })
    }

    /// Returns the pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True if the pattern contains no wildcard.
    pub fn is_literal(&self) -> bool {
        !self.raw.contains('*')
    }

    // == Matches ==
    /// Checks whether `key` matches the pattern.
    pub fn matches(&self, key: &str) -> bool {
        if self.is_literal() {
            return key == self.raw;
        }

        let mut rest = key;
        let last = self.pieces.len().saturating_sub(1);

        for (i, piece) in self.pieces.iter().enumerate() {
            if i == 0 && self.anchored_start {
                match rest.strip_prefix(piece.as_str()) {
                    Some(tail) => rest = tail,
                    None => return false,
                }
            } else if i == last && self.anchored_end {
                // The final literal must sit at the very end of what is left.
                return rest.ends_with(piece.as_str());
            } else {
                match rest.find(piece.as_str()) {
                    Some(pos) => rest = &rest[pos + piece.len()..],
                    None => return false,
                }
            }
        }

        // A trailing '*' absorbs whatever is left.
        !self.anchored_end || rest.is_empty()
    }
}

impl std::fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
