//! Engine test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use app_update::app_info::AppInfo;
use app_update::config::EngineConfig;
use app_update::update::clock::Clock;
use app_update::update::engine::UpdateEngine;
use app_update::update::presenter::{Presenter, UpdateAction, UserIntent};
use app_update::update::store::SqliteStore;
use app_update::version::error::FetchError;
use app_update::version::source::RemoteVersionSource;
use app_update::version::types::RemoteVersionInfo;

/// Source that answers with queued results, repeating the last one
pub struct FakeSource {
    responses: Mutex<VecDeque<Result<RemoteVersionInfo, String>>>,
    calls: Mutex<usize>,
}

impl FakeSource {
    pub fn returning(version: &str) -> Self {
        Self::new(vec![Ok(RemoteVersionInfo::new(version, "1234"))])
    }

    pub fn failing(message: &str) -> Self {
        Self::new(vec![Err(message.to_string())])
    }

    pub fn new(responses: Vec<Result<RemoteVersionInfo, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl RemoteVersionSource for FakeSource {
    async fn fetch_latest(&self) -> Result<RemoteVersionInfo, FetchError> {
        *self.calls.lock().unwrap() += 1;

        let mut responses = self.responses.lock().unwrap();
        let response = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };

        match response {
            Some(Ok(info)) => Ok(info),
            Some(Err(message)) => Err(FetchError::InvalidResponse(message)),
            None => Err(FetchError::NotFound("no response queued".to_string())),
        }
    }
}

/// Presenter that records every action and answers with a fixed intent
pub struct RecordingPresenter {
    intent: UserIntent,
    presented: Mutex<Vec<UpdateAction>>,
}

impl RecordingPresenter {
    pub fn answering(intent: UserIntent) -> Self {
        Self {
            intent,
            presented: Mutex::new(Vec::new()),
        }
    }

    pub fn presented(&self) -> Vec<UpdateAction> {
        self.presented.lock().unwrap().clone()
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn present(&self, action: &UpdateAction) -> UserIntent {
        self.presented.lock().unwrap().push(action.clone());
        self.intent
    }
}

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Everything an engine scenario needs, kept alive together
pub struct Harness {
    pub temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    pub source: Arc<FakeSource>,
    pub presenter: Arc<RecordingPresenter>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(source: FakeSource, presenter: RecordingPresenter) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::new(&temp_dir.path().join("state.db")).unwrap());
        Self {
            temp_dir,
            store,
            source: Arc::new(source),
            presenter: Arc::new(presenter),
            clock: Arc::new(ManualClock::new()),
        }
    }

    pub fn engine(&self, installed: &str, config: EngineConfig) -> UpdateEngine<SqliteStore> {
        let app = AppInfo {
            name: "Example".to_string(),
            version: installed.to_string(),
            build: "100".to_string(),
            bundle_id: "com.example.app".to_string(),
        };

        UpdateEngine::new(
            &app,
            config,
            Arc::clone(&self.store),
            self.source.clone(),
            self.presenter.clone(),
        )
        .with_clock(self.clock.clone())
    }
}

pub fn alerts_enabled() -> EngineConfig {
    EngineConfig {
        alerts_enabled: true,
        ..EngineConfig::default()
    }
}
