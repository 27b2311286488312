// src/trust/mod.rs
//! Trust provider boundary.
//!
//! Everything cryptographic sits behind [`TrustProvider`]: how a signed
//! message is decoded, how it is checked against a trust configuration,
//! and how that configuration is loaded and kept up to date. The trust
//! store and the API server are generic over the provider, so they can be
//! exercised with a fake one.
//!
//! [`provider::SchemeProvider`] is the implementation backed by a local
//! scheme directory.

pub mod configuration;
pub mod error;
pub mod provider;
#[cfg(test)]
pub mod testing;
pub mod verification;

pub use error::TrustError;

use crate::models::attribute::AttributeList;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;

/// Why a message was judged invalid.
///
/// Only ever logged; callers see the same rejection for every status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofStatus {
    /// No credentials or no disclosures
    Empty,
    /// A signature is malformed or does not verify
    InvalidSignature,
    /// A credential or issuer key was not valid at signing time
    Expired,
    /// Signing time is unacceptable
    InvalidTimestamp,
    /// Disclosed attributes do not match the presented credentials
    UnmatchedDisclosure,
}

impl fmt::Display for ProofStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            ProofStatus::Empty => "empty",
            ProofStatus::InvalidSignature => "invalid signature",
            ProofStatus::Expired => "expired",
            ProofStatus::InvalidTimestamp => "invalid timestamp",
            ProofStatus::UnmatchedDisclosure => "unmatched disclosure",
        };
        f.write_str(status)
    }
}

/// Result of verifying one signed message.
#[derive(Debug)]
pub enum VerificationOutcome {
    Valid(AttributeList),
    Invalid(ProofStatus),
    Error(TrustError),
}

/// Capability interface of a trust-verification library.
///
/// # Concerns
/// 1. Message decoding: `Message` is deserialized with serde
/// 2. Verification: [`TrustProvider::verify`] against one configuration
/// 3. Configuration lifecycle: parse, download defaults, update
///
/// `verify` is synchronous and may be CPU heavy; callers run it off the
/// async workers.
#[async_trait]
pub trait TrustProvider: Send + Sync + 'static {
    /// Immutable trust material used for verification
    type Configuration: Send + Sync + 'static;

    /// Wire representation of a signed message
    type Message: DeserializeOwned + Send + 'static;

    /// Builds a configuration from the provider's storage.
    async fn parse_configuration(&self) -> Result<Self::Configuration, TrustError>;

    /// Installs the default scheme set into storage.
    ///
    /// Returns the number of schemes installed.
    async fn download_default_schemes(&self) -> Result<usize, TrustError>;

    /// Fetches newer versions of the schemes in `current` into storage.
    ///
    /// Returns `true` when storage changed and should be parsed again.
    async fn update_schemes(&self, current: &Self::Configuration) -> Result<bool, TrustError>;

    fn scheme_count(&self, configuration: &Self::Configuration) -> usize;

    /// Verifies `message` using the library's default disclosure policy.
    fn verify(
        &self,
        configuration: &Self::Configuration,
        message: &Self::Message,
    ) -> VerificationOutcome;
}
