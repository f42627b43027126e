// src/version.rs

//! Dotted release-string version parsing and comparison.
//!
//! Unlike RPM-style versions, recipe versions carry no epoch. A version is a
//! dot-separated sequence of segments, each either numeric or textual, with
//! an optional `-suffix` marking a pre-release that sorts below the same
//! base version without one.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Numeric(u64),
    Text(String),
}

impl Segment {
    fn parse(s: &str) -> Segment {
        match s.parse::<u64>() {
            Ok(n) => Segment::Numeric(n),
            Err(_) => Segment::Text(s.to_string()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Numeric(n) => write!(f, "{n}"),
            Segment::Text(t) => write!(f, "{t}"),
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            // A numeric segment is considered to precede a textual one at the
            // same position; this only matters for malformed/mixed version
            // strings, which real cookbook authoring should avoid.
            (Segment::Numeric(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Numeric(_)) => Ordering::Greater,
        }
    }
}

/// A parsed recipe/tool version: dotted segments plus an optional pre-release suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    raw: String,
    segments: Vec<Segment>,
    prerelease: Option<String>,
}

impl Version {
    /// Parse a version string such as `1.2.10` or `1.2.9-rc1`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::CatalogParseError {
                path: "<version>".into(),
                reason: "empty version string".to_string(),
            });
        }

        let (base, prerelease) = match s.find('-') {
            Some(idx) => (&s[..idx], Some(s[idx + 1..].to_string())),
            None => (s, None),
        };

        if base.is_empty() {
            return Err(Error::CatalogParseError {
                path: "<version>".into(),
                reason: format!("empty base version in '{s}'"),
            });
        }

        let segments = base.split('.').map(Segment::parse).collect();

        Ok(Version {
            raw: s.to_string(),
            segments,
            prerelease,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn compare(&self, other: &Version) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).cloned().unwrap_or(Segment::Numeric(0));
            let b = other.segments.get(i).cloned().unwrap_or(Segment::Numeric(0));
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }

        match (&self.prerelease, &other.prerelease) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple() {
        let v = Version::parse("1.2.10").unwrap();
        assert_eq!(v.as_str(), "1.2.10");
    }

    #[test]
    fn numeric_segments_compare_numerically() {
        let a = Version::parse("1.2.10").unwrap();
        let b = Version::parse("1.2.9").unwrap();
        assert!(a > b, "1.2.10 should be greater than 1.2.9");
    }

    #[test]
    fn prerelease_sorts_below_base() {
        let base = Version::parse("1.2.9").unwrap();
        let rc = Version::parse("1.2.9-rc1").unwrap();
        assert!(base > rc);
    }

    #[test]
    fn full_chain_from_spec() {
        let a = Version::parse("1.2.10").unwrap();
        let b = Version::parse("1.2.9").unwrap();
        let c = Version::parse("1.2.9-rc1").unwrap();
        assert!(a > b);
        assert!(b > c);
    }

    #[test]
    fn prereleases_compare_lexicographically() {
        let rc1 = Version::parse("1.0.0-rc1").unwrap();
        let rc2 = Version::parse("1.0.0-rc2").unwrap();
        assert!(rc2 > rc1);
    }

    #[test]
    fn shorter_segment_list_treated_as_zero_padded() {
        let a = Version::parse("1.2").unwrap();
        let b = Version::parse("1.2.0").unwrap();
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn rejects_empty_version() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("-rc1").is_err());
    }

    #[test]
    fn total_order_is_consistent() {
        let mut versions: Vec<Version> = ["1.2.9-rc1", "1.2.10", "1.2.9"]
            .iter()
            .map(|s| Version::parse(s).unwrap())
            .collect();
        versions.sort();
        let strs: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
        assert_eq!(strs, vec!["1.2.9-rc1", "1.2.9", "1.2.10"]);
    }
}
