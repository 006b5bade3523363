//! Two-tier key hierarchy
//!
//! master key --PBKDF2--> wrapping key --AES-GCM--> per-user data key
//! --AES-GCM--> field envelopes.
//!
//! Only the wrapped form of a data key is ever stored on the user record.
//! Unwrapped keys are returned by value and zeroed when the caller drops
//! them, so they live no longer than the operation that needed them.

use zeroize::Zeroizing;

use crate::error::{ExpenseError, ExpenseResult};
use crate::models::User;

use super::encryption::{open, seal, EncryptedEnvelope};
use super::key_derivation::{derive_wrapping_key, KeyWrappingParams};
use super::{DataKey, MasterKey};

/// Wraps, unwraps and provisions per-user data keys
pub struct KeyManager {
    wrapping_key: DataKey,
}

impl KeyManager {
    /// Derive the wrapping key from the master key
    ///
    /// This runs the PBKDF2 stretch exactly once; build one manager per
    /// process and share it.
    pub fn new(master_key: &MasterKey, params: &KeyWrappingParams) -> ExpenseResult<Self> {
        let wrapping_key = derive_wrapping_key(master_key, params)?;
        Ok(Self { wrapping_key })
    }

    /// Encrypt a data key under the wrapping key
    pub fn wrap_key(&self, key: &DataKey) -> ExpenseResult<EncryptedEnvelope> {
        seal(key.as_bytes(), &self.wrapping_key)
    }

    /// Recover a data key from its wrapped form
    pub fn unwrap_key(&self, wrapped: &EncryptedEnvelope) -> ExpenseResult<DataKey> {
        let raw = Zeroizing::new(open(wrapped, &self.wrapping_key)?);
        DataKey::from_slice(&raw)
    }

    /// Generate and attach a data key to a freshly registered user
    ///
    /// Refuses to overwrite an existing wrapped key, since that would orphan
    /// every field already encrypted under it.
    pub fn provision_user_key(&self, user: &mut User) -> ExpenseResult<DataKey> {
        if user.wrapped_key.is_some() {
            return Err(ExpenseError::KeyAlreadyProvisioned(user.id.to_string()));
        }

        let key = DataKey::generate();
        user.wrapped_key = Some(self.wrap_key(&key)?);
        user.touch();

        tracing::info!(user_id = %user.id, "provisioned data key");
        Ok(key)
    }

    /// Unwrap the data key of a user
    ///
    /// Never provisions on the fly: a user without a key is a registration
    /// bug and is reported as `KeyNotProvisioned`.
    pub fn user_key(&self, user: &User) -> ExpenseResult<DataKey> {
        let wrapped = user
            .wrapped_key
            .as_ref()
            .ok_or_else(|| ExpenseError::KeyNotProvisioned(user.id.to_string()))?;
        self.unwrap_key(wrapped)
    }
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager").finish_non_exhaustive()
    }
}
