// src/trust/verification.rs
//! Signed message verification for the scheme-directory provider.
//!
//! # Process Flow
//! 1. Reject messages without credentials or disclosures
//! 2. Reject signing times too far in the future or in the past
//! 3. Per credential: resolve type and issuer key, check both signatures,
//!    then check validity at signing time and that it has not expired since
//! 4. Resolve disclosure groups into attributes
//!
//! Cryptographic checks come before validity checks, so a forged expired
//! credential reports an invalid signature rather than expiry.

use crate::models::attribute::{AttributeIdentifier, AttributeList, DisclosedAttribute};
use crate::models::signed_message::{CredentialProof, SignedMessage};
use crate::trust::configuration::SchemeConfiguration;
use crate::trust::{ProofStatus, TrustError, VerificationOutcome};
use crate::utils::crypto::{decode_public_key, verify_signature};
use crate::utils::serialization::canonical_bytes;
use std::collections::BTreeSet;

/// Allowed clock difference between signer and verifier, in seconds.
pub const MAX_CLOCK_SKEW: i64 = 300;

/// Oldest accepted signing time, in seconds before verification.
///
/// The signing time is chosen by the holder, so without a bound an old
/// timestamp would move an expired credential back into its validity window.
pub const MAX_MESSAGE_AGE: i64 = 600;

/// Internal short-circuit for a failed check.
enum Rejection {
    Status(ProofStatus),
    Error(TrustError),
}

impl From<Rejection> for VerificationOutcome {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Status(status) => VerificationOutcome::Invalid(status),
            Rejection::Error(e) => VerificationOutcome::Error(e),
        }
    }
}

/// Verifies `message` against `configuration` at time `now` (Unix seconds).
pub fn verify_message(
    configuration: &SchemeConfiguration,
    message: &SignedMessage,
    now: i64,
) -> VerificationOutcome {
    match check_message(configuration, message, now) {
        Ok(attributes) => VerificationOutcome::Valid(attributes),
        Err(rejection) => rejection.into(),
    }
}

fn check_message(
    configuration: &SchemeConfiguration,
    message: &SignedMessage,
    now: i64,
) -> Result<AttributeList, Rejection> {
    if message.credentials.is_empty() || message.disclosed.is_empty() {
        return Err(Rejection::Status(ProofStatus::Empty));
    }
    if message.timestamp > now.saturating_add(MAX_CLOCK_SKEW)
        || message.timestamp < now.saturating_sub(MAX_MESSAGE_AGE)
    {
        return Err(Rejection::Status(ProofStatus::InvalidTimestamp));
    }

    for credential in &message.credentials {
        check_credential(configuration, message, credential, now)?;
    }

    disclosed_attributes(message)
}

fn check_credential(
    configuration: &SchemeConfiguration,
    message: &SignedMessage,
    credential: &CredentialProof,
    now: i64,
) -> Result<(), Rejection> {
    let credential_type = configuration
        .credential_type(&credential.credential_type)
        .ok_or_else(|| {
            Rejection::Error(TrustError::UnknownIdentifier(
                credential.credential_type.clone(),
            ))
        })?;

    let declared: BTreeSet<&str> = credential_type.attributes.iter().map(String::as_str).collect();
    let presented: BTreeSet<&str> = credential.attributes.keys().map(String::as_str).collect();
    if declared != presented {
        return Err(Rejection::Status(ProofStatus::UnmatchedDisclosure));
    }

    let issuer_key = configuration
        .issuer_key(&credential_type.issuer, credential.key_counter)
        .ok_or_else(|| {
            Rejection::Error(TrustError::UnknownIdentifier(format!(
                "{}-{}",
                credential_type.issuer, credential.key_counter
            )))
        })?;

    let issued = canonical_bytes(&credential.issued_payload())
        .map_err(|e| Rejection::Error(TrustError::Internal(e.to_string())))?;
    if !signature_holds(&issuer_key.key, &issued, &credential.issuer_signature) {
        return Err(Rejection::Status(ProofStatus::InvalidSignature));
    }

    let holder_key = decode_public_key(&credential.holder_key)
        .map_err(|_| Rejection::Status(ProofStatus::InvalidSignature))?;
    let session = canonical_bytes(&message.session_payload(credential))
        .map_err(|e| Rejection::Error(TrustError::Internal(e.to_string())))?;
    if !signature_holds(&holder_key, &session, &credential.holder_signature) {
        return Err(Rejection::Status(ProofStatus::InvalidSignature));
    }

    if !credential.is_valid_at(message.timestamp)
        || credential.expires_at < now
        || !issuer_key.is_valid_at(message.timestamp)
    {
        return Err(Rejection::Status(ProofStatus::Expired));
    }

    Ok(())
}

fn signature_holds(key: &k256::ecdsa::VerifyingKey, payload: &[u8], signature: &str) -> bool {
    verify_signature(key, payload, signature).unwrap_or(false)
}

fn disclosed_attributes(message: &SignedMessage) -> Result<AttributeList, Rejection> {
    let unmatched = || Rejection::Status(ProofStatus::UnmatchedDisclosure);

    let mut groups = Vec::with_capacity(message.disclosed.len());
    for indices in &message.disclosed {
        if indices.is_empty() {
            return Err(unmatched());
        }

        let mut group = Vec::with_capacity(indices.len());
        for index in indices {
            let credential = message.credentials.get(index.credential).ok_or_else(unmatched)?;
            let value = credential.attributes.get(&index.attribute).ok_or_else(unmatched)?;
            group.push(DisclosedAttribute::new(
                AttributeIdentifier::new(&credential.credential_type, &index.attribute),
                value.as_deref(),
            ));
        }
        groups.push(group);
    }

    Ok(AttributeList::new(groups))
}
