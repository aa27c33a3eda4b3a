use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::version::classifier::UpdateSeverity;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default update check frequency in days (0 = check on every launch)
pub const DEFAULT_UPDATE_FREQUENCY_DAYS: u32 = 0;

/// How strongly an update prompt constrains the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum AlertPolicy {
    /// Offers "Skip This Version" in addition to dismissing
    Skippable,
    /// Can be dismissed for now but not skipped
    #[default]
    Unskippable,
    /// Only path forward is updating
    Blocking,
}

impl AlertPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertPolicy::Skippable => "skippable",
            AlertPolicy::Unskippable => "unskippable",
            AlertPolicy::Blocking => "blocking",
        }
    }
}

/// Update prompt configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Days between store lookups
    pub update_frequency_days: u32,
    pub alerts_enabled: bool,
    pub minor_alerts_disabled: bool,
    pub patch_alerts_disabled: bool,
    /// Offers "Never Suggest to Update" on non-blocking prompts
    pub never_option_enabled: bool,
    pub default_alert_policy: AlertPolicy,
    pub per_severity_policy: HashMap<UpdateSeverity, AlertPolicy>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            update_frequency_days: DEFAULT_UPDATE_FREQUENCY_DAYS,
            alerts_enabled: false,
            minor_alerts_disabled: false,
            patch_alerts_disabled: false,
            never_option_enabled: false,
            default_alert_policy: AlertPolicy::default(),
            per_severity_policy: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Set the blanket policy, overwriting every per-severity override.
    pub fn set_alert_policy(&mut self, policy: AlertPolicy) {
        self.default_alert_policy = policy;
        for severity in [
            UpdateSeverity::Major,
            UpdateSeverity::Minor,
            UpdateSeverity::Patch,
        ] {
            self.per_severity_policy.insert(severity, policy);
        }
    }

    pub fn set_severity_policy(&mut self, severity: UpdateSeverity, policy: AlertPolicy) {
        self.per_severity_policy.insert(severity, policy);
    }

    pub fn policy_for(&self, severity: UpdateSeverity) -> AlertPolicy {
        self.per_severity_policy
            .get(&severity)
            .copied()
            .unwrap_or(self.default_alert_policy)
    }

    /// Whether alerts of `severity` are switched off by the tier flags
    pub fn severity_disabled(&self, severity: UpdateSeverity) -> bool {
        match severity {
            UpdateSeverity::Minor => self.minor_alerts_disabled,
            UpdateSeverity::Patch => self.patch_alerts_disabled,
            UpdateSeverity::Major | UpdateSeverity::None => false,
        }
    }
}

/// Returns the path to the data directory for app-update.
/// Uses $XDG_DATA_HOME/app-update if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/app-update,
/// or ./app-update if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the state database file.
pub fn db_path() -> PathBuf {
    data_dir().join("state.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("app-update.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("app-update")
}
