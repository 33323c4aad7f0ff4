//! API version numbers used by `since` / `until` bounds.
//!
//! Versions are dot-separated numeric segments with an optional `v` prefix,
//! an optional pre-release suffix after `-` and optional build metadata after
//! `+`. Comparison is semantic, never lexical:
//!
//! - missing trailing segments are zero-filled, so `2` == `2.0` == `2.0.0`
//! - a pre-release sorts before its release (`2.0.0-beta` < `2.0.0`)
//! - build metadata is ignored
//!
//! ```
//! use warden_core::Version;
//!
//! let v2: Version = "2".parse().unwrap();
//! assert_eq!(v2, "2.0.0".parse().unwrap());
//! assert!(v2 > "1.10".parse().unwrap());
//! ```

use crate::error::{Result, WardenError};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed version number.
#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
    pre: Vec<PreIdent>,
    original: String,
}

/// One dot-separated pre-release identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum PreIdent {
    // Numeric identifiers sort before alphanumeric ones.
    Numeric(u64),
    Alpha(String),
}

impl Version {
    /// Parse a version string. Equivalent to `s.parse::<Version>()`.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// Build a `major.minor.patch` version directly.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            segments: vec![major, minor, patch],
            pre: Vec::new(),
            original: format!("{major}.{minor}.{patch}"),
        }
    }

    /// Numeric segments as written (not zero-filled).
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// `true` when the version carries a pre-release suffix.
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    fn segment(&self, i: usize) -> u64 {
        self.segments.get(i).copied().unwrap_or(0)
    }
}

impl FromStr for Version {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || WardenError::InvalidVersion(s.to_string());

        let trimmed = s.trim();
        let body = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let body = match body.split_once('+') {
            Some((head, meta)) if !meta.is_empty() => head,
            Some(_) => return Err(invalid()),
            None => body,
        };
        let (core, pre) = match body.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre)),
            Some(_) => return Err(invalid()),
            None => (body, None),
        };

        if core.is_empty() {
            return Err(invalid());
        }
        let segments = core
            .split('.')
            .map(|seg| {
                if seg.is_empty() || !seg.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                seg.parse::<u64>().map_err(|_| invalid())
            })
            .collect::<Result<Vec<_>>>()?;

        let pre = match pre {
            Some(pre) => pre
                .split('.')
                .map(|ident| {
                    if ident.is_empty() {
                        Err(invalid())
                    } else if ident.bytes().all(|b| b.is_ascii_digit()) {
                        ident
                            .parse::<u64>()
                            .map(PreIdent::Numeric)
                            .map_err(|_| invalid())
                    } else {
                        Ok(PreIdent::Alpha(ident.to_string()))
                    }
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            segments,
            pre,
            original: trimmed.to_string(),
        })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.segments.len().max(other.segments.len());
        for i in 0..width {
            match self.segment(i).cmp(&other.segment(i)) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        match (self.pre.is_empty(), other.pre.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.pre.cmp(&other.pre),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn zero_fills_missing_segments() {
        assert_eq!(v("2"), v("2.0.0"));
        assert_eq!(v("1.2"), v("1.2.0.0"));
        assert!(v("1") < v("1.0.1"));
    }

    #[test]
    fn compares_numerically_not_lexically() {
        assert!(v("1.10.0") > v("1.9.0"));
        assert!(v("10") > v("9.99"));
    }

    #[test]
    fn prerelease_sorts_before_release() {
        assert!(v("2.0.0-beta") < v("2.0.0"));
        assert!(v("2.0.0-alpha") < v("2.0.0-beta"));
        assert!(v("2.0.0-rc.2") < v("2.0.0-rc.10"));
        assert!(v("2.0.0-1") < v("2.0.0-alpha"));
        assert!(v("2.0.0-rc") > v("1.9"));
    }

    #[test]
    fn ignores_prefix_and_build_metadata() {
        assert_eq!(v("v1.4"), v("1.4.0+build.7"));
        assert_eq!(v("v1.4").to_string(), "v1.4");
    }

    #[test]
    fn rejects_malformed_strings() {
        for bad in ["", "v", "1..2", "1.a", "1.0-", "1.0+", "abc", "1.0.0-rc..1", "-1"] {
            assert!(
                matches!(bad.parse::<Version>(), Err(WardenError::InvalidVersion(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
