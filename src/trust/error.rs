// src/trust/error.rs
//! Trust provider error type.

use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("scheme storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("scheme download failed: {0}")]
    Download(String),

    #[error("no usable trust schemes available")]
    NoSchemes,

    #[error("unknown identifier {0}")]
    UnknownIdentifier(String),

    #[error("internal verification error: {0}")]
    Internal(String),
}
