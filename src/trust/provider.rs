// src/trust/provider.rs
//! Scheme-directory trust provider.
//!
//! Trust material lives in a local [`SchemeFolder`]; newer descriptions
//! are pulled over HTTP with a [`SchemeClient`]. Every download is
//! persisted first and only becomes active when the folder is parsed again.

use crate::models::scheme::SchemeDescription;
use crate::models::signed_message::SignedMessage;
use crate::storage::scheme_client::SchemeClient;
use crate::storage::scheme_folder::SchemeFolder;
use crate::storage::StorageError;
use crate::trust::configuration::SchemeConfiguration;
use crate::trust::verification::verify_message;
use crate::trust::{TrustError, TrustProvider, VerificationOutcome};
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, info, warn};

pub struct SchemeProvider {
    folder: SchemeFolder,
    client: SchemeClient,
    /// Base URLs of the schemes installed when the folder is empty
    default_scheme_urls: Vec<String>,
}

impl SchemeProvider {
    pub fn new(
        folder: SchemeFolder,
        client: SchemeClient,
        default_scheme_urls: Vec<String>,
    ) -> Self {
        SchemeProvider {
            folder,
            client,
            default_scheme_urls,
        }
    }

    #[cfg(test)]
    pub fn folder(&self) -> &SchemeFolder {
        &self.folder
    }

    /// Downloads the scheme published at `url` and stores it.
    ///
    /// A description without its own update URL remembers `url`, so the
    /// scheme is refreshed from where it was installed.
    async fn install_scheme(&self, url: &str) -> Result<String, StorageError> {
        let mut scheme = self.client.fetch(url).await?;
        if scheme.url.is_none() {
            scheme.url = Some(url.to_string());
        }
        self.folder.write_scheme(&scheme).await?;
        Ok(scheme.id)
    }

    /// Fetches the remote version of `current` and stores it if newer.
    ///
    /// # Returns
    /// - `Ok(true)` if a newer description was written
    /// - `Ok(false)` if the stored description is current
    async fn update_scheme(
        &self,
        current: &SchemeDescription,
        url: &str,
    ) -> Result<bool, StorageError> {
        let mut remote = self.client.fetch(url).await?;
        if remote.id != current.id {
            return Err(StorageError::SchemeMismatch {
                expected: current.id.clone(),
                found: remote.id,
            });
        }
        if remote.timestamp <= current.timestamp {
            return Ok(false);
        }
        if remote.url.is_none() {
            remote.url = Some(url.to_string());
        }

        self.folder.write_scheme(&remote).await?;
        info!(
            "scheme {} updated from version {} to {}",
            current.id, current.timestamp, remote.timestamp
        );
        Ok(true)
    }
}

#[async_trait]
impl TrustProvider for SchemeProvider {
    type Configuration = SchemeConfiguration;
    type Message = SignedMessage;

    async fn parse_configuration(&self) -> Result<SchemeConfiguration, TrustError> {
        debug!("parsing schemes in {}", self.folder.root().display());
        let stored = self.folder.read_all().await?;
        Ok(SchemeConfiguration::from_stored(stored))
    }

    async fn download_default_schemes(&self) -> Result<usize, TrustError> {
        if self.default_scheme_urls.is_empty() {
            return Err(TrustError::Download("no default scheme URLs configured".into()));
        }

        let results = join_all(
            self.default_scheme_urls
                .iter()
                .map(|url| self.install_scheme(url)),
        )
        .await;

        let mut installed = 0;
        let mut failures = Vec::new();
        for (url, result) in self.default_scheme_urls.iter().zip(results) {
            match result {
                Ok(id) => {
                    info!("installed default scheme {} from {}", id, url);
                    installed += 1;
                }
                Err(e) => {
                    warn!("failed to install default scheme from {}: {}", url, e);
                    failures.push(format!("{}: {}", url, e));
                }
            }
        }

        if installed == 0 {
            return Err(TrustError::Download(failures.join("; ")));
        }
        Ok(installed)
    }

    async fn update_schemes(&self, current: &SchemeConfiguration) -> Result<bool, TrustError> {
        let candidates: Vec<(&SchemeDescription, &str)> = current
            .schemes()
            .filter_map(|scheme| scheme.url.as_deref().map(|url| (scheme, url)))
            .collect();
        if candidates.is_empty() {
            return Ok(false);
        }

        let results = join_all(
            candidates
                .iter()
                .map(|(scheme, url)| self.update_scheme(scheme, url)),
        )
        .await;

        let mut changed = false;
        let mut failures = Vec::new();
        for ((scheme, _), result) in candidates.iter().zip(results) {
            match result {
                Ok(updated) => changed |= updated,
                Err(e) => {
                    warn!("failed to update scheme {}: {}", scheme.id, e);
                    failures.push(format!("{}: {}", scheme.id, e));
                }
            }
        }

        if failures.len() == candidates.len() {
            return Err(TrustError::Download(failures.join("; ")));
        }
        Ok(changed)
    }

    fn scheme_count(&self, configuration: &SchemeConfiguration) -> usize {
        configuration.scheme_count()
    }

    fn verify(
        &self,
        configuration: &SchemeConfiguration,
        message: &SignedMessage,
    ) -> VerificationOutcome {
        verify_message(configuration, message, chrono::Utc::now().timestamp())
    }
}
