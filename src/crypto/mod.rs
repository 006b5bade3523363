//! Cryptographic functions for expense-vault
//!
//! Provides the AES-256-GCM envelope cipher, the master-key -> data-key
//! hierarchy (PBKDF2-HMAC-SHA256 wrapping), the encrypted field adapter and
//! Argon2id password hashing.

pub mod encryption;
pub mod fields;
pub mod key_derivation;
pub mod key_hierarchy;
pub mod master_key;
pub mod password;
pub mod secure_memory;

pub use encryption::{open, open_str, seal, seal_str, EncryptedEnvelope};
pub use fields::FieldCipher;
pub use key_derivation::{derive_wrapping_key, KeyWrappingParams};
pub use key_hierarchy::KeyManager;
pub use master_key::MasterKey;
pub use secure_memory::{DataKey, SecureString, KEY_SIZE};
