//! Wrapping-key derivation using PBKDF2-HMAC-SHA256
//!
//! The master key is a configured secret string, not key material. It is
//! stretched once into a 256-bit wrapping key that protects per-user data
//! keys and is never applied to user data directly.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{ExpenseError, ExpenseResult};

use super::{DataKey, MasterKey, KEY_SIZE};

/// Minimum accepted PBKDF2 iteration count
pub const MIN_ITERATIONS: u32 = 100_000;

/// Size of the per-deployment salt in bytes
pub const SALT_SIZE: usize = 16;

/// Parameters for deriving the wrapping key from the master key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyWrappingParams {
    /// Per-deployment salt (base64 encoded); empty until first start
    #[serde(default)]
    pub salt: String,
    /// PBKDF2 iteration count
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

fn default_iterations() -> u32 {
    MIN_ITERATIONS
}

impl Default for KeyWrappingParams {
    fn default() -> Self {
        Self {
            salt: String::new(),
            iterations: default_iterations(),
        }
    }
}

impl KeyWrappingParams {
    /// Create new params with a random salt
    pub fn new() -> Self {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        Self {
            salt: STANDARD.encode(salt),
            ..Default::default()
        }
    }

    /// Whether a salt has been generated yet
    pub fn has_salt(&self) -> bool {
        !self.salt.is_empty()
    }

    /// Check the params are usable for derivation
    pub fn validate(&self) -> ExpenseResult<()> {
        if self.iterations < MIN_ITERATIONS {
            return Err(ExpenseError::Config(format!(
                "Key wrapping iterations must be at least {}, got {}",
                MIN_ITERATIONS, self.iterations
            )));
        }
        self.decode_salt().map(|_| ())
    }

    fn decode_salt(&self) -> ExpenseResult<Vec<u8>> {
        let salt = STANDARD
            .decode(&self.salt)
            .map_err(|e| ExpenseError::Config(format!("Invalid key wrapping salt: {}", e)))?;
        if salt.len() != SALT_SIZE {
            return Err(ExpenseError::Config(format!(
                "Key wrapping salt must be {} bytes, got {}",
                SALT_SIZE,
                salt.len()
            )));
        }
        Ok(salt)
    }
}

/// Derive the wrapping key from the master key
///
/// Deliberately slow; call once per process, not per field.
pub fn derive_wrapping_key(
    master_key: &MasterKey,
    params: &KeyWrappingParams,
) -> ExpenseResult<DataKey> {
    params.validate()?;
    let salt = params.decode_salt()?;

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2::pbkdf2_hmac::<Sha256>(
        master_key.expose().as_bytes(),
        &salt,
        params.iterations,
        &mut *key,
    );

    Ok(DataKey::from_bytes(*key))
}
