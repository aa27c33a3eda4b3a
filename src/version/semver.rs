use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Numeric `major.minor.patch` version as published by an app store.
///
/// Parsing never fails. Missing trailing segments are zero, segments past
/// the patch are ignored, and a segment contributes only its leading ASCII
/// digits (`"3-beta"` -> 3, `"beta"` -> 0).
///
/// Examples:
/// - "1" -> 1.0.0
/// - "1.2" -> 1.2.0
/// - "1.2.3.4" -> 1.2.3
/// - "10.x.7" -> 10.0.7
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a dotted version string, degrading malformed segments to 0.
    pub fn parse(version: &str) -> Self {
        let mut components = [0u64; 3];
        let mut segments = version.trim().split('.');

        for component in components.iter_mut() {
            let Some(segment) = segments.next() else {
                break;
            };
            *component = parse_segment(segment).unwrap_or_else(|| {
                debug!("Unparseable version segment {:?} in {:?}", segment, version);
                0
            });
        }

        let [major, minor, patch] = components;
        Self::new(major, minor, patch)
    }
}

fn parse_segment(segment: &str) -> Option<u64> {
    let digits_end = segment
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(segment.len());
    segment[..digits_end].parse().ok()
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemanticVersion {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for SemanticVersion {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for SemanticVersion {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<SemanticVersion> for String {
    fn from(value: SemanticVersion) -> Self {
        value.to_string()
    }
}
