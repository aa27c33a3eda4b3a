//! Update severity classification between installed and published versions

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::semver::SemanticVersion;

/// How significant the available update is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateSeverity {
    /// Published version is not newer than the installed one
    None,
    Patch,
    Minor,
    Major,
}

impl UpdateSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateSeverity::None => "none",
            UpdateSeverity::Patch => "patch",
            UpdateSeverity::Minor => "minor",
            UpdateSeverity::Major => "major",
        }
    }

    pub fn is_update(&self) -> bool {
        *self != UpdateSeverity::None
    }
}

impl fmt::Display for UpdateSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the update from `installed` to `remote`.
///
/// A tier only counts when every higher tier is equal, so a remote version
/// that is older never yields a severity.
pub fn classify(installed: &SemanticVersion, remote: &SemanticVersion) -> UpdateSeverity {
    if remote.major > installed.major {
        UpdateSeverity::Major
    } else if remote.major == installed.major && remote.minor > installed.minor {
        UpdateSeverity::Minor
    } else if remote.major == installed.major
        && remote.minor == installed.minor
        && remote.patch > installed.patch
    {
        UpdateSeverity::Patch
    } else {
        UpdateSeverity::None
    }
}
