// src/trust/testing.rs
//! Test fixtures: signing issuers for the scheme provider and a fake
//! provider for exercising the trust store and the API server.

use crate::models::attribute::{AttributeList, DisclosedAttribute};
use crate::models::scheme::{
    CredentialTypeDescription, IssuerDescription, IssuerPublicKey, SchemeDescription,
};
use crate::models::signed_message::{AttributeIndex, CredentialProof, SignedMessage};
use crate::trust::{ProofStatus, TrustError, TrustProvider, VerificationOutcome};
use crate::utils::crypto::{encode_public_key, sign_message};
use crate::utils::serialization::canonical_bytes;
use async_trait::async_trait;
use k256::ecdsa::{SigningKey, VerifyingKey};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// An issuer holding a fresh signing key with counter 0.
pub struct TestIssuer {
    pub scheme: String,
    pub issuer: String,
    pub key: SigningKey,
}

impl TestIssuer {
    pub fn new(scheme: &str, issuer: &str) -> Self {
        TestIssuer {
            scheme: scheme.to_string(),
            issuer: issuer.to_string(),
            key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.key.verifying_key().clone()
    }

    pub fn credential_type(&self, credential: &str) -> String {
        format!("{}.{}.{}", self.scheme, self.issuer, credential)
    }

    /// A scheme containing only this issuer and the given credential types.
    pub fn scheme_description(
        &self,
        credentials: &[(&str, &[&str])],
        timestamp: i64,
    ) -> SchemeDescription {
        SchemeDescription {
            id: self.scheme.clone(),
            url: None,
            timestamp,
            issuers: vec![IssuerDescription {
                id: self.issuer.clone(),
                name: Some(format!("{} test issuer", self.issuer)),
                public_keys: vec![IssuerPublicKey {
                    counter: 0,
                    key: encode_public_key(self.key.verifying_key()),
                    expires_at: None,
                }],
                credentials: credentials
                    .iter()
                    .map(|(id, attributes)| CredentialTypeDescription {
                        id: id.to_string(),
                        attributes: attributes.iter().map(|a| a.to_string()).collect(),
                    })
                    .collect(),
            }],
        }
    }

    /// Issues a credential to `holder`; the holder signature is left empty.
    pub fn issue(
        &self,
        credential: &str,
        attributes: &[(&str, Option<&str>)],
        holder: &SigningKey,
        issued_at: i64,
        expires_at: i64,
    ) -> CredentialProof {
        let mut proof = CredentialProof {
            credential_type: self.credential_type(credential),
            key_counter: 0,
            issued_at,
            expires_at,
            attributes: attributes
                .iter()
                .map(|(name, value)| (name.to_string(), value.map(str::to_string)))
                .collect::<BTreeMap<_, _>>(),
            holder_key: encode_public_key(holder.verifying_key()),
            issuer_signature: String::new(),
            holder_signature: String::new(),
        };
        let payload = canonical_bytes(&proof.issued_payload()).unwrap();
        proof.issuer_signature = sign_message(&self.key, &payload);
        proof
    }
}

pub fn holder_key() -> SigningKey {
    SigningKey::random(&mut rand::thread_rng())
}

/// Assembles a message and signs every credential with its holder key.
pub fn signed_message(
    credentials: Vec<CredentialProof>,
    holders: &[&SigningKey],
    disclosed: Vec<Vec<(usize, &str)>>,
    timestamp: i64,
) -> SignedMessage {
    let mut message = SignedMessage {
        message: "I agree to the terms".to_string(),
        nonce: "bm9uY2U=".to_string(),
        context: "AQ==".to_string(),
        timestamp,
        credentials,
        disclosed: disclosed
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .map(|(credential, attribute)| AttributeIndex {
                        credential,
                        attribute: attribute.to_string(),
                    })
                    .collect()
            })
            .collect(),
    };

    let signatures: Vec<String> = message
        .credentials
        .iter()
        .zip(holders)
        .map(|(credential, holder)| {
            let payload = canonical_bytes(&message.session_payload(credential)).unwrap();
            sign_message(holder, &payload)
        })
        .collect();
    for (credential, signature) in message.credentials.iter_mut().zip(signatures) {
        credential.holder_signature = signature;
    }
    message
}

/// Configuration of the fake provider.
///
/// `checksum` is always `generation * 2` in a well-formed value, so a
/// verification that saw a torn configuration would notice.
#[derive(Debug)]
pub struct FakeConfiguration {
    pub generation: u64,
    pub checksum: u64,
    pub schemes: usize,
}

/// Outcome a fake message asks for.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FakeResult {
    Valid,
    Invalid,
    Expired,
    Error,
    Panic,
    /// Valid, disclosing the configuration generation
    Generation,
    /// Valid, after blocking for a while
    Slow,
}

#[derive(Deserialize, Debug)]
pub struct FakeMessage {
    pub result: FakeResult,
    #[serde(default)]
    pub groups: Vec<Vec<DisclosedAttribute>>,
}

/// Provider whose storage is a few counters.
#[derive(Default)]
pub struct FakeProvider {
    generation: AtomicU64,
    schemes: AtomicUsize,
    default_schemes: usize,
    pending_update: AtomicBool,
    fail_parse: AtomicBool,
    fail_download: AtomicBool,
    fail_update: AtomicBool,
    pub downloads: AtomicUsize,
}

impl FakeProvider {
    /// Storage already holds `schemes` schemes.
    pub fn with_schemes(schemes: usize) -> Self {
        FakeProvider {
            schemes: AtomicUsize::new(schemes),
            default_schemes: 2,
            ..Default::default()
        }
    }

    /// Storage is empty; downloading defaults installs `default_schemes`.
    pub fn empty(default_schemes: usize) -> Self {
        FakeProvider {
            default_schemes,
            ..Default::default()
        }
    }

    /// Makes the next update find a newer generation.
    pub fn publish_update(&self) {
        self.pending_update.store(true, Ordering::SeqCst);
    }

    pub fn set_schemes(&self, schemes: usize) {
        self.schemes.store(schemes, Ordering::SeqCst);
    }

    pub fn set_fail_parse(&self, fail: bool) {
        self.fail_parse.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_download(&self, fail: bool) {
        self.fail_download.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TrustProvider for FakeProvider {
    type Configuration = FakeConfiguration;
    type Message = FakeMessage;

    async fn parse_configuration(&self) -> Result<FakeConfiguration, TrustError> {
        if self.fail_parse.load(Ordering::SeqCst) {
            return Err(TrustError::Internal("parse failed".into()));
        }
        let generation = self.generation.load(Ordering::SeqCst);
        Ok(FakeConfiguration {
            generation,
            checksum: generation * 2,
            schemes: self.schemes.load(Ordering::SeqCst),
        })
    }

    async fn download_default_schemes(&self) -> Result<usize, TrustError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_download.load(Ordering::SeqCst) {
            return Err(TrustError::Download("unreachable".into()));
        }
        self.schemes.store(self.default_schemes, Ordering::SeqCst);
        Ok(self.default_schemes)
    }

    async fn update_schemes(&self, _current: &FakeConfiguration) -> Result<bool, TrustError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(TrustError::Download("update failed".into()));
        }
        if self.pending_update.swap(false, Ordering::SeqCst) {
            self.generation.fetch_add(1, Ordering::SeqCst);
            return Ok(true);
        }
        Ok(false)
    }

    fn scheme_count(&self, configuration: &FakeConfiguration) -> usize {
        configuration.schemes
    }

    fn verify(
        &self,
        configuration: &FakeConfiguration,
        message: &FakeMessage,
    ) -> VerificationOutcome {
        match message.result {
            FakeResult::Valid => {
                VerificationOutcome::Valid(AttributeList::new(message.groups.clone()))
            }
            FakeResult::Invalid => VerificationOutcome::Invalid(ProofStatus::InvalidSignature),
            FakeResult::Expired => VerificationOutcome::Invalid(ProofStatus::Expired),
            FakeResult::Error => {
                VerificationOutcome::Error(TrustError::UnknownIdentifier("fake.unknown".into()))
            }
            FakeResult::Panic => panic!("verification blew up"),
            FakeResult::Slow => {
                std::thread::sleep(std::time::Duration::from_millis(500));
                VerificationOutcome::Valid(AttributeList::new(Vec::new()))
            }
            FakeResult::Generation => {
                let generation = configuration.generation;
                std::thread::yield_now();
                if configuration.checksum != generation * 2 {
                    let torn = TrustError::Internal("torn configuration".into());
                    return VerificationOutcome::Error(torn);
                }
                VerificationOutcome::Valid(AttributeList::new(vec![vec![DisclosedAttribute::new(
                    "fake.config.generation",
                    Some(generation.to_string().as_str()),
                )]]))
            }
        }
    }
}
