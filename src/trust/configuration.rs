// src/trust/configuration.rs
//! Parsed trust configuration of the scheme-directory provider.
//!
//! Built once from the scheme descriptions on disk and never modified
//! afterwards; a refresh produces a whole new value.

use crate::models::scheme::SchemeDescription;
use crate::storage::scheme_folder::StoredScheme;
use crate::storage::validate_scheme_id;
use crate::utils::crypto::{decode_public_key, CryptoError};
use k256::ecdsa::VerifyingKey;
use log::warn;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Why a scheme description was left out of the configuration.
#[derive(Debug, Error)]
pub enum SchemeError {
    #[error("scheme {found:?} stored in directory {directory:?}")]
    DirectoryMismatch { directory: String, found: String },

    #[error("invalid scheme identifier {0:?}")]
    InvalidId(String),

    #[error("issuer {issuer}: key {counter} is invalid: {source}")]
    InvalidKey {
        issuer: String,
        counter: u32,
        #[source]
        source: CryptoError,
    },

    #[error("duplicate identifier {0}")]
    Duplicate(String),
}

/// A usable issuer verification key.
#[derive(Debug, Clone)]
pub struct IssuerKey {
    pub key: VerifyingKey,
    pub expires_at: Option<i64>,
}

impl IssuerKey {
    /// Whether signatures made at `timestamp` are still accepted.
    pub fn is_valid_at(&self, timestamp: i64) -> bool {
        self.expires_at.map_or(true, |expiry| timestamp <= expiry)
    }
}

/// A credential type with its issuer and declared attributes.
#[derive(Debug, Clone)]
pub struct CredentialType {
    /// Qualified issuer identifier (`scheme.issuer`)
    pub issuer: String,
    pub attributes: Vec<String>,
}

#[derive(Debug, Default)]
pub struct SchemeConfiguration {
    schemes: BTreeMap<String, SchemeDescription>,
    issuer_keys: HashMap<String, HashMap<u32, IssuerKey>>,
    credential_types: HashMap<String, CredentialType>,
}

impl SchemeConfiguration {
    /// Builds a configuration from the stored schemes.
    ///
    /// Schemes that failed to load, or that fail validation, are logged and
    /// skipped; the remaining schemes are still usable.
    pub fn from_stored(stored: Vec<StoredScheme>) -> Self {
        let mut configuration = SchemeConfiguration::default();
        for (directory, result) in stored {
            match result {
                Ok(scheme) => {
                    if let Err(e) = configuration.add_scheme(&directory, scheme) {
                        warn!("skipping scheme in {:?}: {}", directory, e);
                    }
                }
                Err(e) => warn!("skipping scheme in {:?}: {}", directory, e),
            }
        }
        configuration
    }

    /// Validates one scheme and adds it to the indexes.
    ///
    /// Nothing is added unless the whole scheme is valid.
    pub fn add_scheme(
        &mut self,
        directory: &str,
        scheme: SchemeDescription,
    ) -> Result<(), SchemeError> {
        if scheme.id != directory {
            return Err(SchemeError::DirectoryMismatch {
                directory: directory.to_string(),
                found: scheme.id,
            });
        }
        validate_scheme_id(&scheme.id).map_err(|_| SchemeError::InvalidId(scheme.id.clone()))?;
        if self.schemes.contains_key(&scheme.id) {
            return Err(SchemeError::Duplicate(scheme.id));
        }

        let mut issuer_keys = HashMap::new();
        let mut credential_types = HashMap::new();
        for issuer in &scheme.issuers {
            let issuer_id = scheme.issuer_identifier(issuer);
            if issuer_keys.contains_key(&issuer_id) {
                return Err(SchemeError::Duplicate(issuer_id));
            }

            let mut keys = HashMap::new();
            for public_key in &issuer.public_keys {
                let key = decode_public_key(&public_key.key).map_err(|source| {
                    SchemeError::InvalidKey {
                        issuer: issuer_id.clone(),
                        counter: public_key.counter,
                        source,
                    }
                })?;
                keys.insert(
                    public_key.counter,
                    IssuerKey {
                        key,
                        expires_at: public_key.expires_at,
                    },
                );
            }

            for credential in &issuer.credentials {
                let credential_id = format!("{}.{}", issuer_id, credential.id);
                let previous = credential_types.insert(
                    credential_id.clone(),
                    CredentialType {
                        issuer: issuer_id.clone(),
                        attributes: credential.attributes.clone(),
                    },
                );
                if previous.is_some() {
                    return Err(SchemeError::Duplicate(credential_id));
                }
            }

            issuer_keys.insert(issuer_id, keys);
        }

        self.issuer_keys.extend(issuer_keys);
        self.credential_types.extend(credential_types);
        self.schemes.insert(scheme.id.clone(), scheme);
        Ok(())
    }

    pub fn scheme_count(&self) -> usize {
        self.schemes.len()
    }

    /// Loaded scheme descriptions, ordered by identifier.
    pub fn schemes(&self) -> impl Iterator<Item = &SchemeDescription> {
        self.schemes.values()
    }

    #[cfg(test)]
    pub fn scheme(&self, id: &str) -> Option<&SchemeDescription> {
        self.schemes.get(id)
    }

    pub fn credential_type(&self, id: &str) -> Option<&CredentialType> {
        self.credential_types.get(id)
    }

    pub fn issuer_key(&self, issuer: &str, counter: u32) -> Option<&IssuerKey> {
        self.issuer_keys.get(issuer)?.get(&counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use crate::trust::testing::TestIssuer;

    #[test]
    fn test_indexes_scheme() {
        let issuer = TestIssuer::new("demo", "Gov");
        let scheme = issuer.scheme_description(&[("fullName", &["first", "last"])], 1);

        let configuration = SchemeConfiguration::from_stored(vec![("demo".into(), Ok(scheme))]);
        assert_eq!(configuration.scheme_count(), 1);

        let credential = configuration.credential_type("demo.Gov.fullName").unwrap();
        assert_eq!(credential.issuer, "demo.Gov");
        assert_eq!(credential.attributes, vec!["first", "last"]);
        assert!(configuration.issuer_key("demo.Gov", 0).is_some());
        assert!(configuration.issuer_key("demo.Gov", 1).is_none());
        assert!(configuration.issuer_key("demo.Other", 0).is_none());
    }

    #[test]
    fn test_invalid_schemes_are_skipped() {
        let good = TestIssuer::new("good", "Gov").scheme_description(&[("c", &["a"])], 1);
        let misplaced = TestIssuer::new("other", "Gov").scheme_description(&[("c", &["a"])], 1);
        let mut bad_key = TestIssuer::new("badkey", "Gov").scheme_description(&[("c", &["a"])], 1);
        bad_key.issuers[0].public_keys[0].key = base64::encode([7u8; 12]);

        let stored = vec![
            ("good".to_string(), Ok(good)),
            ("wrong-dir".to_string(), Ok(misplaced)),
            ("badkey".to_string(), Ok(bad_key)),
            (
                "unreadable".to_string(),
                Err(StorageError::InvalidSchemeId("unreadable".into())),
            ),
        ];

        let configuration = SchemeConfiguration::from_stored(stored);
        assert_eq!(configuration.scheme_count(), 1);
        assert!(configuration.scheme("good").is_some());
        assert!(configuration.credential_type("badkey.Gov.c").is_none());
    }

    #[test]
    fn test_rejected_scheme_leaves_no_partial_state() {
        let mut scheme = TestIssuer::new("demo", "Gov").scheme_description(&[("c", &["a"])], 1);
        let duplicate = scheme.issuers[0].credentials[0].clone();
        scheme.issuers[0].credentials.push(duplicate);

        let mut configuration = SchemeConfiguration::default();
        let result = configuration.add_scheme("demo", scheme);
        assert!(matches!(result, Err(SchemeError::Duplicate(_))));
        assert_eq!(configuration.scheme_count(), 0);
        assert!(configuration.issuer_key("demo.Gov", 0).is_none());
    }

    #[test]
    fn test_key_expiry() {
        let key = TestIssuer::new("demo", "Gov").public_key();
        let expiring = IssuerKey {
            key: key.clone(),
            expires_at: Some(100),
        };
        assert!(expiring.is_valid_at(100));
        assert!(!expiring.is_valid_at(101));

        let forever = IssuerKey {
            key,
            expires_at: None,
        };
        assert!(forever.is_valid_at(i64::MAX));
    }
}
