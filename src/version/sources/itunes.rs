//! App Store lookup API implementation

use serde::Deserialize;
use tracing::{debug, warn};

use crate::version::error::FetchError;
use crate::version::source::RemoteVersionSource;
use crate::version::types::RemoteVersionInfo;

/// Default base URL for the iTunes lookup API
const DEFAULT_BASE_URL: &str = "https://itunes.apple.com";

/// Response from the lookup API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    result_count: usize,
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResult {
    version: String,
    track_id: u64,
}

/// Remote source backed by the App Store lookup endpoint
pub struct ItunesLookup {
    client: reqwest::Client,
    base_url: String,
    bundle_id: String,
    country: Option<String>,
}

impl ItunesLookup {
    /// Creates a lookup for `bundle_id` against a custom base URL
    pub fn new(base_url: &str, bundle_id: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("app-update")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bundle_id: bundle_id.to_string(),
            country: None,
        })
    }

    /// Creates a lookup for `bundle_id` against the public App Store
    pub fn for_bundle(bundle_id: &str) -> Result<Self, FetchError> {
        Self::new(DEFAULT_BASE_URL, bundle_id)
    }

    /// Restricts the lookup to a storefront (two-letter country code)
    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_lowercase());
        self
    }

    fn query(&self) -> Vec<(&'static str, &str)> {
        let mut query = vec![("bundleId", self.bundle_id.as_str())];
        if let Some(country) = &self.country {
            query.push(("country", country.as_str()));
        }
        query
    }
}

#[async_trait::async_trait]
impl RemoteVersionSource for ItunesLookup {
    async fn fetch_latest(&self) -> Result<RemoteVersionInfo, FetchError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/lookup", self.base_url),
            self.query(),
        )
        .map_err(|e| FetchError::InvalidResponse(format!("Invalid lookup URL: {}", e)))?;

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(self.bundle_id.clone()));
        }

        if !status.is_success() {
            warn!("App Store lookup returned status {}: {}", status, url);
            return Err(FetchError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let lookup: LookupResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse App Store lookup response: {}", e);
            FetchError::InvalidResponse(e.to_string())
        })?;

        let Some(result) = lookup.results.into_iter().next() else {
            debug!(
                "Lookup for {} returned {} results",
                self.bundle_id, lookup.result_count
            );
            return Err(FetchError::NotFound(self.bundle_id.clone()));
        };

        debug!(
            "App Store has {} version {} (id {})",
            self.bundle_id, result.version, result.track_id
        );

        Ok(RemoteVersionInfo::new(
            result.version.as_str(),
            &result.track_id.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::semver::SemanticVersion;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn fetch_latest_returns_version_and_track_id() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/lookup")
            .match_query(Matcher::UrlEncoded(
                "bundleId".into(),
                "com.example.app".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "resultCount": 1,
                    "results": [
                        {
                            "version": "2.4.1",
                            "trackId": 1234567890,
                            "trackName": "Example"
                        }
                    ]
                }"#,
            )
            .create_async()
            .await;

        let source = ItunesLookup::new(&server.url(), "com.example.app").unwrap();
        let result = source.fetch_latest().await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.current_version, SemanticVersion::new(2, 4, 1));
        assert_eq!(result.store_identifier, "1234567890");
    }

    #[tokio::test]
    async fn fetch_latest_passes_country_code() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/lookup")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("bundleId".into(), "com.example.app".into()),
                Matcher::UrlEncoded("country".into(), "jp".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"resultCount": 1, "results": [{"version": "1.0", "trackId": 1}]}"#)
            .create_async()
            .await;

        let source = ItunesLookup::new(&server.url(), "com.example.app")
            .unwrap()
            .with_country("JP");
        let result = source.fetch_latest().await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.current_version, SemanticVersion::new(1, 0, 0));
    }

    #[tokio::test]
    async fn fetch_latest_returns_not_found_for_empty_results() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/lookup")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"resultCount": 0, "results": []}"#)
            .create_async()
            .await;

        let source = ItunesLookup::new(&server.url(), "com.example.missing").unwrap();
        let result = source.fetch_latest().await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn fetch_latest_returns_not_found_for_404() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/lookup")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let source = ItunesLookup::new(&server.url(), "com.example.app").unwrap();
        let result = source.fetch_latest().await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn fetch_latest_returns_invalid_response_for_server_error() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/lookup")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let source = ItunesLookup::new(&server.url(), "com.example.app").unwrap();
        let result = source.fetch_latest().await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn fetch_latest_returns_invalid_response_for_malformed_body() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/lookup")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results": "nope"}"#)
            .create_async()
            .await;

        let source = ItunesLookup::new(&server.url(), "com.example.app").unwrap();
        let result = source.fetch_latest().await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
    }
}
