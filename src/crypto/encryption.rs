//! AES-256-GCM envelope encryption
//!
//! Every sensitive value is stored as a self-contained envelope: a fresh
//! 96-bit nonce followed by the ciphertext and its 128-bit authentication
//! tag, rendered as standard base64 text. No associated data is bound.

use std::fmt;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{ExpenseError, ExpenseResult};

use super::DataKey;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Opaque base64 text holding `nonce || ciphertext || tag`
///
/// Persistence stores and returns this text verbatim.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedEnvelope(String);

impl EncryptedEnvelope {
    /// Wrap envelope text loaded from storage
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The base64 text of this envelope
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode into the raw nonce and ciphertext+tag
    fn decode(&self) -> ExpenseResult<(Vec<u8>, Vec<u8>)> {
        let mut bytes = STANDARD.decode(&self.0).map_err(|e| {
            ExpenseError::Authentication(format!("Invalid envelope encoding: {}", e))
        })?;

        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(ExpenseError::Authentication(format!(
                "Envelope too short: expected at least {} bytes, got {}",
                NONCE_SIZE + TAG_SIZE,
                bytes.len()
            )));
        }

        let ciphertext = bytes.split_off(NONCE_SIZE);
        Ok((bytes, ciphertext))
    }
}

impl fmt::Debug for EncryptedEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EncryptedEnvelope").field(&self.0).finish()
    }
}

impl fmt::Display for EncryptedEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn cipher_for(key: &DataKey) -> ExpenseResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ExpenseError::Crypto(format!("Failed to create cipher: {}", e)))
}

/// Seal a plaintext payload under a key
///
/// Generates a random nonce for every call; callers cannot supply one.
pub fn seal(plaintext: &[u8], key: &DataKey) -> ExpenseResult<EncryptedEnvelope> {
    let cipher = cipher_for(key)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| ExpenseError::Crypto(format!("Encryption failed: {}", e)))?;

    let mut envelope = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&ciphertext);

    Ok(EncryptedEnvelope(STANDARD.encode(envelope)))
}

/// Open an envelope, verifying its authentication tag
///
/// Any tampering, corruption or wrong key yields `ExpenseError::Authentication`.
pub fn open(envelope: &EncryptedEnvelope, key: &DataKey) -> ExpenseResult<Vec<u8>> {
    let cipher = cipher_for(key)?;
    let (nonce_bytes, ciphertext) = envelope.decode()?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    cipher.decrypt(nonce, ciphertext.as_ref()).map_err(|_| {
        tracing::warn!("envelope failed authentication");
        ExpenseError::Authentication("invalid key or corrupted data".to_string())
    })
}

/// Seal a UTF-8 string
pub fn seal_str(plaintext: &str, key: &DataKey) -> ExpenseResult<EncryptedEnvelope> {
    seal(plaintext.as_bytes(), key)
}

/// Open an envelope holding a UTF-8 string
pub fn open_str(envelope: &EncryptedEnvelope, key: &DataKey) -> ExpenseResult<String> {
    let plaintext = open(envelope, key)?;
    String::from_utf8(plaintext).map_err(|e| {
        ExpenseError::Authentication(format!("Invalid UTF-8 in decrypted data: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn test_key() -> DataKey {
        DataKey::from_bytes([0x42; 32])
    }

    #[test]
    fn test_seal_open() {
        let key = test_key();
        let plaintext = b"Lunch at the corner cafe";

        let envelope = seal(plaintext, &key).unwrap();
        let opened = open(&envelope, &key).unwrap();

        assert_eq!(plaintext, opened.as_slice());
    }

    #[test]
    fn test_seal_open_str() {
        let key = DataKey::generate();
        let envelope = seal_str("Groceries", &key).unwrap();
        assert_eq!(open_str(&envelope, &key).unwrap(), "Groceries");
    }

    #[test]
    fn test_envelope_layout() {
        let key = test_key();
        let envelope = seal(b"abc", &key).unwrap();
        let raw = STANDARD.decode(envelope.as_str()).unwrap();
        assert_eq!(raw.len(), NONCE_SIZE + 3 + TAG_SIZE);
    }

    #[test]
    fn test_nonces_unique_across_many_seals() {
        let key = test_key();
        let mut nonces = HashSet::new();

        for _ in 0..10_000 {
            let envelope = seal(b"12.50", &key).unwrap();
            let raw = STANDARD.decode(envelope.as_str()).unwrap();
            nonces.insert(raw[..NONCE_SIZE].to_vec());
        }

        assert_eq!(nonces.len(), 10_000);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = DataKey::generate();
        let key2 = DataKey::generate();

        let envelope = seal(b"secret", &key1).unwrap();
        let err = open(&envelope, &key2).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_every_bit_flip_is_detected() {
        let key = test_key();
        let envelope = seal(b"42.00", &key).unwrap();
        let raw = STANDARD.decode(envelope.as_str()).unwrap();

        for byte in 0..raw.len() {
            for bit in 0..8 {
                let mut tampered = raw.clone();
                tampered[byte] ^= 1 << bit;
                let tampered = EncryptedEnvelope::from_encoded(STANDARD.encode(&tampered));

                let err = open(&tampered, &key).unwrap_err();
                assert!(err.is_authentication(), "byte {} bit {}", byte, bit);
            }
        }
    }

    #[test]
    fn test_garbage_text_is_authentication_error() {
        let key = test_key();
        let err = open(&EncryptedEnvelope::from_encoded("not base64 !!"), &key).unwrap_err();
        assert!(err.is_authentication());

        let short = EncryptedEnvelope::from_encoded(STANDARD.encode([0u8; 10]));
        assert!(open(&short, &key).unwrap_err().is_authentication());
    }

    #[test]
    fn test_empty_plaintext() {
        let key = test_key();
        let envelope = seal(b"", &key).unwrap();
        assert!(open(&envelope, &key).unwrap().is_empty());
    }

    #[test]
    fn test_envelope_serializes_as_plain_string() {
        let key = test_key();
        let envelope = seal(b"x", &key).unwrap();
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, format!("\"{}\"", envelope.as_str()));
    }
}
