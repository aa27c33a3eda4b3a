//! Update check cycle: due check, fetch, classify, decide, present

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::app_info::{AppInfo, BundleInfoProvider};
use crate::config::{AlertPolicy, EngineConfig};
use crate::update::clock::{Clock, SystemClock, days_between};
use crate::update::presenter::{Presenter, UpdateAction, UserIntent};
use crate::update::store::{LaunchHistory, StateStore};
use crate::version::classifier::{UpdateSeverity, classify};
use crate::version::error::{StoreError, UpdateError};
use crate::version::semver::SemanticVersion;
use crate::version::source::RemoteVersionSource;
use crate::version::types::RemoteVersionInfo;

type PresentationGate = Box<dyn Fn() -> bool + Send + Sync>;

/// Why an available update was not presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// User chose "Never Suggest to Update"
    NeverShowAgain,
    /// Host vetoed presentation
    PresentationGate,
    AlertsDisabled,
    SeverityDisabled(UpdateSeverity),
    /// Remote version is not newer than the version the user skipped
    SkippedVersion,
}

/// Policy decision for a fetched remote version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    UpToDate,
    Suppress(SuppressReason),
    Present(UpdateAction),
}

/// Result of one check cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Frequency throttle skipped the lookup
    NotDue,
    UpToDate,
    Suppressed(SuppressReason),
    Presented {
        action: UpdateAction,
        intent: UserIntent,
    },
}

/// Decides whether and how to prompt for an app update
///
/// Collaborators are injected so several engines can coexist, e.g. in tests.
/// A cycle borrows the engine for its whole duration, so dropping the
/// returned future cancels the fetch and nothing runs against a dropped
/// engine.
pub struct UpdateEngine<S: StateStore> {
    store: Arc<S>,
    source: Arc<dyn RemoteVersionSource>,
    presenter: Arc<dyn Presenter>,
    clock: Arc<dyn Clock>,
    app_info: AppInfo,
    installed_version: SemanticVersion,
    config: EngineConfig,
    presentation_gate: PresentationGate,
}

impl<S: StateStore> UpdateEngine<S> {
    /// Build an engine, reading bundle metadata once
    pub fn new(
        bundle: &dyn BundleInfoProvider,
        config: EngineConfig,
        store: Arc<S>,
        source: Arc<dyn RemoteVersionSource>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        let app_info = AppInfo::from_provider(bundle);
        let installed_version = app_info.semantic_version();
        debug!(
            "Update engine for {} installed version {}",
            app_info.bundle_id, installed_version
        );

        Self {
            store,
            source,
            presenter,
            clock: Arc::new(SystemClock),
            app_info,
            installed_version,
            config,
            presentation_gate: Box::new(|| true),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Host check run right before presenting; returning false suppresses the prompt
    pub fn with_presentation_gate<F>(mut self, gate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.presentation_gate = Box::new(gate);
        self
    }

    pub fn app_info(&self) -> &AppInfo {
        &self.app_info
    }

    pub fn installed_version(&self) -> SemanticVersion {
        self.installed_version
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Blanket policy; overwrites the major, minor and patch overrides
    pub fn set_alert_policy(&mut self, policy: AlertPolicy) {
        self.config.set_alert_policy(policy);
    }

    pub fn set_severity_policy(&mut self, severity: UpdateSeverity, policy: AlertPolicy) {
        self.config.set_severity_policy(severity, policy);
    }

    /// Record this launch, then run a regular (throttled) check
    pub async fn on_launch(&self) -> Result<CheckOutcome, UpdateError> {
        let launches = self.store.record_launch(&self.installed_version)?;
        info!("Launch {} of version {}", launches, self.installed_version);

        self.check(false).await
    }

    /// Check ignoring the update frequency
    pub async fn check_now(&self) -> Result<CheckOutcome, UpdateError> {
        self.check(true).await
    }

    /// Run one check cycle
    ///
    /// A failed fetch leaves the stored state untouched; the last check date
    /// only advances after a successful lookup.
    pub async fn check(&self, force: bool) -> Result<CheckOutcome, UpdateError> {
        if !self.is_check_due(force)? {
            debug!("Too early to check for updates");
            return Ok(CheckOutcome::NotDue);
        }

        let remote = self
            .source
            .fetch_latest()
            .await
            .inspect_err(|e| error!("Failed to fetch latest version: {}", e))?;

        self.store.set_last_check_date(self.clock.now())?;
        info!(
            "Latest published version {} (installed {})",
            remote.current_version, self.installed_version
        );

        let severity = classify(&self.installed_version, &remote.current_version);

        let action = match self.decide(severity, &remote)? {
            Decision::UpToDate => return Ok(CheckOutcome::UpToDate),
            Decision::Suppress(reason) => {
                debug!("Not presenting {} update: {:?}", severity, reason);
                return Ok(CheckOutcome::Suppressed(reason));
            }
            Decision::Present(action) => action,
        };

        let answer = self.presenter.present(&action).await;
        let intent = self.apply_intent(&action, answer)?;

        Ok(CheckOutcome::Presented { action, intent })
    }

    /// Whether a lookup should happen now
    pub fn is_check_due(&self, force: bool) -> Result<bool, StoreError> {
        if force || self.config.update_frequency_days == 0 {
            return Ok(true);
        }

        let Some(last_check) = self.store.last_check_date()? else {
            return Ok(true);
        };

        let elapsed = days_between(last_check, self.clock.now());
        Ok(elapsed >= u64::from(self.config.update_frequency_days))
    }

    /// Apply prompt policy to a classified remote version
    pub fn decide(
        &self,
        severity: UpdateSeverity,
        remote: &RemoteVersionInfo,
    ) -> Result<Decision, StoreError> {
        if !severity.is_update() {
            return Ok(Decision::UpToDate);
        }

        if self.store.never_flag()? {
            return Ok(Decision::Suppress(SuppressReason::NeverShowAgain));
        }
        if !(self.presentation_gate)() {
            return Ok(Decision::Suppress(SuppressReason::PresentationGate));
        }
        if !self.config.alerts_enabled {
            return Ok(Decision::Suppress(SuppressReason::AlertsDisabled));
        }
        if self.config.severity_disabled(severity) {
            return Ok(Decision::Suppress(SuppressReason::SeverityDisabled(
                severity,
            )));
        }

        let policy = self.config.policy_for(severity);

        // Skipping is only ever offered on skippable prompts
        let skipped = if policy == AlertPolicy::Skippable {
            self.store.skipped_version()?
        } else {
            None
        };
        if skipped.is_some_and(|skipped| remote.current_version <= skipped) {
            return Ok(Decision::Suppress(SuppressReason::SkippedVersion));
        }

        Ok(Decision::Present(UpdateAction {
            severity,
            policy,
            version: remote.current_version,
            store_identifier: remote.store_identifier.clone(),
            never_enabled: self.config.never_option_enabled,
        }))
    }

    /// Persist the user's response to a presented prompt
    ///
    /// Returns the intent that took effect. An answer the prompt did not
    /// offer changes nothing and is reported as `Dismiss`.
    pub fn apply_intent(
        &self,
        action: &UpdateAction,
        intent: UserIntent,
    ) -> Result<UserIntent, StoreError> {
        if !action.offers(intent) {
            warn!(
                "Ignoring {:?}: not offered on a {} prompt",
                intent,
                action.policy.as_str()
            );
            return Ok(UserIntent::Dismiss);
        }

        match intent {
            UserIntent::Update => {
                info!("User chose to update, store page {}", action.store_url());
            }
            UserIntent::Skip => {
                info!("Skipping version {}", action.version);
                self.store.set_skipped_version(&action.version)?;
            }
            UserIntent::Never => {
                info!("Update prompts silenced");
                self.store.set_never_flag(true)?;
            }
            UserIntent::Dismiss => {
                debug!("Update prompt dismissed");
            }
        }

        Ok(intent)
    }

    /// Clear last check date, skipped version, launch history and never flag
    pub fn reset(&self) -> Result<(), StoreError> {
        self.store.reset_all()
    }

    pub fn last_check_date(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.store.last_check_date()
    }

    pub fn skipped_version(&self) -> Result<Option<SemanticVersion>, StoreError> {
        self.store.skipped_version()
    }

    pub fn launch_history(&self) -> Result<LaunchHistory, StoreError> {
        self.store.launch_history()
    }

    /// Launches recorded for the installed version (0 before the first launch)
    pub fn launches_for_this_version(&self) -> Result<u32, StoreError> {
        Ok(self
            .store
            .launch_history()?
            .get(&self.installed_version)
            .copied()
            .unwrap_or(0))
    }

    pub fn never_show_again(&self) -> Result<bool, StoreError> {
        self.store.never_flag()
    }
}
