//! Source trait for fetching the latest published app version

#[cfg(test)]
use mockall::automock;

use crate::version::error::FetchError;
use crate::version::types::RemoteVersionInfo;

/// Trait for looking up the latest version published in an app store
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RemoteVersionSource: Send + Sync {
    /// Fetches the latest published version of the app
    ///
    /// # Returns
    /// * `Ok(RemoteVersionInfo)` - Latest version and its store identifier
    /// * `Err(FetchError)` - Network failure, malformed response or unknown app
    async fn fetch_latest(&self) -> Result<RemoteVersionInfo, FetchError>;
}
