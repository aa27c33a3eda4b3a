//! Update prompt description and the presenter that renders it

use std::fmt;

#[cfg(test)]
use mockall::automock;
use serde::Serialize;

use crate::config::AlertPolicy;
use crate::version::classifier::UpdateSeverity;
use crate::version::semver::SemanticVersion;

/// Base URL for deep-linking into the App Store app
const STORE_URL_BASE: &str = "itms-apps://itunes.apple.com/app";

/// What the presenter should show for an available update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAction {
    pub severity: UpdateSeverity,
    pub policy: AlertPolicy,
    pub version: SemanticVersion,
    pub store_identifier: String,
    /// Whether "Never Suggest to Update" is enabled in configuration
    pub never_enabled: bool,
}

impl UpdateAction {
    pub fn allows_skip(&self) -> bool {
        self.policy == AlertPolicy::Skippable
    }

    pub fn allows_never(&self) -> bool {
        self.never_enabled && self.policy != AlertPolicy::Blocking
    }

    pub fn allows_dismiss(&self) -> bool {
        self.policy != AlertPolicy::Blocking
    }

    /// Responses the prompt should offer, in display order
    pub fn offered_intents(&self) -> Vec<UserIntent> {
        let mut intents = vec![UserIntent::Update];
        if self.allows_skip() {
            intents.push(UserIntent::Skip);
        }
        if self.allows_never() {
            intents.push(UserIntent::Never);
        }
        if self.allows_dismiss() {
            intents.push(UserIntent::Dismiss);
        }
        intents
    }

    pub fn offers(&self, intent: UserIntent) -> bool {
        self.offered_intents().contains(&intent)
    }

    pub fn title(&self) -> &'static str {
        "Update Available"
    }

    pub fn message(&self) -> String {
        format!("Please update to version {} now.", self.version)
    }

    /// Deep link that opens the app's store page
    pub fn store_url(&self) -> String {
        format!("{}/{}", STORE_URL_BASE, self.store_identifier)
    }
}

/// Button the user pressed on the update prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserIntent {
    Update,
    Skip,
    Never,
    Dismiss,
}

impl UserIntent {
    pub fn label(&self) -> &'static str {
        match self {
            UserIntent::Update => "Update",
            UserIntent::Skip => "Skip This Version",
            UserIntent::Never => "Never Suggest to Update",
            UserIntent::Dismiss => "Next Time",
        }
    }
}

impl fmt::Display for UserIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Renders an update prompt and reports the user's choice
///
/// Implementations dispatch onto their own UI context; the engine makes no
/// assumption about which thread it runs on.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Presenter: Send + Sync {
    async fn present(&self, action: &UpdateAction) -> UserIntent;
}
