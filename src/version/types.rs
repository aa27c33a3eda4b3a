use serde::Serialize;

use crate::version::semver::SemanticVersion;

/// Latest published version and the store identifier used to deep-link to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteVersionInfo {
    pub current_version: SemanticVersion,
    pub store_identifier: String,
}

impl RemoteVersionInfo {
    pub fn new(current_version: impl Into<SemanticVersion>, store_identifier: &str) -> Self {
        Self {
            current_version: current_version.into(),
            store_identifier: store_identifier.to_string(),
        }
    }
}
