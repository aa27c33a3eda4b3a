//! Installed application metadata

use serde::Deserialize;

use crate::version::semver::SemanticVersion;

/// Version string formats for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFormat {
    /// `<Version>`: **1.1**
    Short,
    /// `<Name> <Version>`: **App Name 1.1**
    ShortWithName,
    /// `<Version> (<Build>)`: **1.1 (1)**
    Long,
    /// `<Name> <Version> (<Build>)`: **App Name 1.1 (1)**
    LongWithName,
}

/// Read-only provider of the installed bundle's metadata
pub trait BundleInfoProvider: Send + Sync {
    fn name(&self) -> String;
    fn version(&self) -> String;
    fn build(&self) -> String;
    fn bundle_id(&self) -> String;
}

/// Snapshot of the installed application's metadata
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub build: String,
    pub bundle_id: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "App Name".to_string(),
            version: "1.0".to_string(),
            build: "1".to_string(),
            bundle_id: "com.example.app".to_string(),
        }
    }
}

impl AppInfo {
    /// Reads every field from `provider` once.
    pub fn from_provider(provider: &dyn BundleInfoProvider) -> Self {
        Self {
            name: provider.name(),
            version: provider.version(),
            build: provider.build(),
            bundle_id: provider.bundle_id(),
        }
    }

    pub fn semantic_version(&self) -> SemanticVersion {
        SemanticVersion::parse(&self.version)
    }

    pub fn formatted_version(&self, format: VersionFormat) -> String {
        match format {
            VersionFormat::Short => self.version.clone(),
            VersionFormat::ShortWithName => format!("{} {}", self.name, self.version),
            VersionFormat::Long => format!("{} ({})", self.version, self.build),
            VersionFormat::LongWithName => {
                format!("{} {} ({})", self.name, self.version, self.build)
            }
        }
    }
}

impl BundleInfoProvider for AppInfo {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn build(&self) -> String {
        self.build.clone()
    }

    fn bundle_id(&self) -> String {
        self.bundle_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn app() -> AppInfo {
        AppInfo {
            name: "Weather".to_string(),
            version: "3.1".to_string(),
            build: "42".to_string(),
            bundle_id: "com.example.weather".to_string(),
        }
    }

    #[rstest]
    #[case(VersionFormat::Short, "3.1")]
    #[case(VersionFormat::ShortWithName, "Weather 3.1")]
    #[case(VersionFormat::Long, "3.1 (42)")]
    #[case(VersionFormat::LongWithName, "Weather 3.1 (42)")]
    fn formatted_version_renders_each_format(
        #[case] format: VersionFormat,
        #[case] expected: &str,
    ) {
        assert_eq!(app().formatted_version(format), expected);
    }

    #[test]
    fn semantic_version_pads_short_version() {
        assert_eq!(app().semantic_version(), SemanticVersion::new(3, 1, 0));
    }

    #[test]
    fn from_provider_snapshots_all_fields() {
        let source = app();
        assert_eq!(AppInfo::from_provider(&source), source);
    }

    #[test]
    fn default_matches_placeholder_bundle() {
        let info = AppInfo::default();
        assert_eq!(info.formatted_version(VersionFormat::LongWithName), "App Name 1.0 (1)");
    }
}
