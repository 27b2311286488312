// src/utils/crypto.rs
//! Cryptographic helpers for scheme keys and message signatures.
//!
//! All keys are secp256k1 (via the `k256` crate) and all signatures are
//! ECDSA over SHA-256, exchanged as base64:
//! - public keys as SEC1 points (compressed or uncompressed)
//! - signatures as the 64-byte `r || s` encoding

use k256::ecdsa::signature::Verifier;
use k256::ecdsa::{Signature, VerifyingKey};
#[cfg(test)]
use k256::ecdsa::{signature::Signer, SigningKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("invalid public key")]
    PublicKey,

    #[error("invalid signature encoding")]
    SignatureEncoding,
}

/// Decodes a base64 SEC1 public key.
pub fn decode_public_key(encoded: &str) -> Result<VerifyingKey, CryptoError> {
    let bytes = base64::decode(encoded)?;
    VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| CryptoError::PublicKey)
}

/// Encodes a public key as base64 compressed SEC1.
#[cfg(test)]
pub fn encode_public_key(key: &VerifyingKey) -> String {
    base64::encode(key.to_encoded_point(true).as_bytes())
}

/// Decodes a base64 `r || s` signature.
pub fn decode_signature(encoded: &str) -> Result<Signature, CryptoError> {
    let bytes = base64::decode(encoded)?;
    Signature::from_slice(&bytes).map_err(|_| CryptoError::SignatureEncoding)
}

/// Checks `signature` over `message` with `key`.
///
/// # Returns
/// - `Ok(true)` if the signature is valid
/// - `Ok(false)` if it is well-formed but does not verify
/// - `Err` if the signature cannot be decoded
pub fn verify_signature(
    key: &VerifyingKey,
    message: &[u8],
    signature: &str,
) -> Result<bool, CryptoError> {
    let signature = decode_signature(signature)?;
    Ok(key.verify(message, &signature).is_ok())
}

/// Signs `message` and returns the base64 `r || s` encoding.
#[cfg(test)]
pub fn sign_message(key: &SigningKey, message: &[u8]) -> String {
    let signature: Signature = key.sign(message);
    base64::encode(signature.to_bytes())
}
