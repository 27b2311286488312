// src/storage/mod.rs
//! Scheme storage.
//!
//! - [`scheme_folder`]: the local scheme directory (`<root>/<scheme>/scheme.json`)
//! - [`scheme_client`]: HTTP retrieval of published scheme descriptions

pub mod scheme_client;
pub mod scheme_folder;

use std::path::PathBuf;
use thiserror::Error;

/// Error type for scheme storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scheme description from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Remote {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid scheme identifier {0:?}")]
    InvalidSchemeId(String),

    #[error("expected scheme {expected:?}, found {found:?}")]
    SchemeMismatch { expected: String, found: String },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Checks that a scheme identifier is usable as a single directory name.
pub fn validate_scheme_id(id: &str) -> Result<(), StorageError> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidSchemeId(id.to_string()))
    }
}
