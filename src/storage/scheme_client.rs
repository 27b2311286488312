// src/storage/scheme_client.rs
//! HTTP client for published scheme descriptions.
//!
//! A scheme is published at `<base url>/scheme.json`. The client fetches
//! and parses that document; it never writes to disk itself.

use crate::models::scheme::{SchemeDescription, SCHEME_FILE};
use crate::storage::StorageError;
use crate::utils::serialization::deserialize;
use std::time::Duration;

/// Thread-safe scheme download client.
///
/// Wraps a `reqwest::Client`, which pools connections and is cheap to clone.
#[derive(Clone, Debug)]
pub struct SchemeClient {
    client: reqwest::Client,
}

impl SchemeClient {
    /// Creates a client whose requests time out after `timeout`.
    ///
    /// # Errors
    /// Returns `Err` if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sigverify/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(SchemeClient { client })
    }

    /// URL of the description published under `base_url`.
    pub fn scheme_url(base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), SCHEME_FILE)
    }

    /// Downloads and parses the scheme description published under `base_url`.
    ///
    /// # Errors
    /// - Connection or timeout failure
    /// - Non-success HTTP status
    /// - Body is not a valid scheme description
    pub async fn fetch(&self, base_url: &str) -> Result<SchemeDescription, StorageError> {
        let url = Self::scheme_url(base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Remote { url, status });
        }

        let body = response.bytes().await?;
        deserialize(&body).map_err(|source| StorageError::Parse { origin: url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{mock, server_url};

    fn client() -> SchemeClient {
        SchemeClient::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_scheme_url() {
        assert_eq!(
            SchemeClient::scheme_url("https://example.com/schemes/pbdf/"),
            "https://example.com/schemes/pbdf/scheme.json"
        );
        assert_eq!(
            SchemeClient::scheme_url("https://example.com/pbdf"),
            "https://example.com/pbdf/scheme.json"
        );
    }

    #[tokio::test]
    async fn test_fetch_parses_description() {
        let _m = mock("GET", "/client-ok/scheme.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"client-ok","timestamp":42,"issuers":[]}"#)
            .create();

        let scheme = client()
            .fetch(&format!("{}/client-ok", server_url()))
            .await
            .unwrap();
        assert_eq!(scheme.id, "client-ok");
        assert_eq!(scheme.timestamp, 42);
    }

    #[tokio::test]
    async fn test_fetch_reports_status() {
        let _m = mock("GET", "/client-missing/scheme.json")
            .with_status(404)
            .create();

        let result = client()
            .fetch(&format!("{}/client-missing", server_url()))
            .await;
        match result {
            Err(StorageError::Remote { status, .. }) => assert_eq!(status.as_u16(), 404),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_body() {
        let _m = mock("GET", "/client-garbage/scheme.json")
            .with_status(200)
            .with_body("<xml/>")
            .create();

        let result = client()
            .fetch(&format!("{}/client-garbage", server_url()))
            .await;
        assert!(matches!(result, Err(StorageError::Parse { .. })));
    }
}
