//! Encrypted field adapter
//!
//! Exposes plaintext-typed get/set for the sensitive columns of an expense.
//! Every call unwraps the owner's data key afresh and performs exactly one
//! AEAD operation; the unwrapped key is dropped (and zeroed) before the call
//! returns. Failures propagate as typed errors so "no description" and
//! "description failed to decrypt" stay distinguishable.

use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{Expense, Money, User};

use super::encryption::{open, seal, EncryptedEnvelope};
use super::key_hierarchy::KeyManager;

/// Field-level cipher bound to one principal
pub struct FieldCipher<'a> {
    keys: &'a KeyManager,
    owner: &'a User,
}

impl<'a> FieldCipher<'a> {
    /// Bind the adapter to the authenticated user
    pub fn new(keys: &'a KeyManager, owner: &'a User) -> Self {
        Self { keys, owner }
    }

    /// Seal an amount as its fixed two-decimal text
    pub fn seal_amount(&self, amount: Money) -> ExpenseResult<EncryptedEnvelope> {
        let payload = serde_json::to_vec(&amount.to_decimal_string())?;
        let key = self.keys.user_key(self.owner)?;
        seal(&payload, &key)
    }

    /// Open a sealed amount
    ///
    /// Accepts a JSON string ("12.50") or a JSON number (12.5) as payload.
    pub fn open_amount(&self, envelope: &EncryptedEnvelope) -> ExpenseResult<Money> {
        let key = self.keys.user_key(self.owner)?;
        let payload = open(envelope, &key)?;
        drop(key);

        let text = match serde_json::from_slice::<serde_json::Value>(&payload)? {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(ExpenseError::Validation(format!(
                    "Decrypted amount is not numeric: {}",
                    other
                )))
            }
        };

        Money::parse(&text)
            .map_err(|e| ExpenseError::Validation(format!("Decrypted amount: {}", e)))
    }

    /// Seal an optional description; `None` stays `None`
    pub fn seal_description(
        &self,
        description: Option<&str>,
    ) -> ExpenseResult<Option<EncryptedEnvelope>> {
        let Some(text) = description else {
            return Ok(None);
        };
        let payload = serde_json::to_vec(text)?;
        let key = self.keys.user_key(self.owner)?;
        seal(&payload, &key).map(Some)
    }

    /// Open an optional description
    pub fn open_description(
        &self,
        envelope: Option<&EncryptedEnvelope>,
    ) -> ExpenseResult<Option<String>> {
        let Some(envelope) = envelope else {
            return Ok(None);
        };
        let key = self.keys.user_key(self.owner)?;
        let payload = open(envelope, &key)?;
        drop(key);

        match serde_json::from_slice::<serde_json::Value>(&payload)? {
            serde_json::Value::String(s) => Ok(Some(s)),
            other => Ok(Some(other.to_string())),
        }
    }

    /// Set the plaintext amount of an expense owned by this principal
    pub fn set_amount(&self, expense: &mut Expense, amount: Money) -> ExpenseResult<()> {
        self.ensure_owner(expense)?;
        expense.amount = self.seal_amount(amount)?;
        expense.touch();
        Ok(())
    }

    /// Read the plaintext amount of an expense owned by this principal
    pub fn amount(&self, expense: &Expense) -> ExpenseResult<Money> {
        self.ensure_owner(expense)?;
        self.open_amount(&expense.amount)
    }

    /// Set or clear the plaintext description of an expense
    pub fn set_description(
        &self,
        expense: &mut Expense,
        description: Option<&str>,
    ) -> ExpenseResult<()> {
        self.ensure_owner(expense)?;
        expense.description = self.seal_description(description)?;
        expense.touch();
        Ok(())
    }

    /// Read the plaintext description of an expense
    pub fn description(&self, expense: &Expense) -> ExpenseResult<Option<String>> {
        self.ensure_owner(expense)?;
        self.open_description(expense.description.as_ref())
    }

    fn ensure_owner(&self, expense: &Expense) -> ExpenseResult<()> {
        if expense.is_owned_by(self.owner.id) {
            Ok(())
        } else {
            Err(ExpenseError::expense_not_found(expense.id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key_hierarchy::tests::test_manager;
    use crate::crypto::DataKey;
    use crate::models::ExpenseCategory;
    use chrono::NaiveDate;

    fn provisioned_user(keys: &KeyManager, name: &str) -> User {
        let mut user = User::new(name, format!("{}@example.com", name));
        keys.provision_user_key(&mut user).unwrap();
        user
    }

    fn blank_expense(cipher: &FieldCipher, owner: &User) -> Expense {
        let sealed = cipher.seal_amount(Money::zero()).unwrap();
        Expense::new(
            owner.id,
            NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
            ExpenseCategory::Food,
            sealed,
        )
    }

    #[test]
    fn test_amount_keeps_two_decimal_fidelity() {
        let keys = test_manager();
        let user = provisioned_user(&keys, "alice");
        let cipher = FieldCipher::new(&keys, &user);

        let mut expense = blank_expense(&cipher, &user);
        cipher.set_amount(&mut expense, Money::parse("12.5").unwrap()).unwrap();

        let amount = cipher.amount(&expense).unwrap();
        assert_eq!(amount.cents(), 1250);
        assert_eq!(amount.to_decimal_string(), "12.50");
    }

    #[test]
    fn test_amount_payload_is_decimal_text() {
        let keys = test_manager();
        let user = provisioned_user(&keys, "alice");
        let cipher = FieldCipher::new(&keys, &user);

        let envelope = cipher.seal_amount(Money::from_cents(1250)).unwrap();
        let key = keys.user_key(&user).unwrap();
        let raw = open(&envelope, &key).unwrap();
        assert_eq!(raw, b"\"12.50\"");
    }

    #[test]
    fn test_amount_accepts_numeric_payload() {
        let keys = test_manager();
        let user = provisioned_user(&keys, "alice");
        let cipher = FieldCipher::new(&keys, &user);
        let key = keys.user_key(&user).unwrap();

        let integer = seal(b"300", &key).unwrap();
        assert_eq!(cipher.open_amount(&integer).unwrap().cents(), 30000);

        let float = seal(b"12.5", &key).unwrap();
        assert_eq!(cipher.open_amount(&float).unwrap().cents(), 1250);
    }

    #[test]
    fn test_description_round_trip_and_absence() {
        let keys = test_manager();
        let user = provisioned_user(&keys, "alice");
        let cipher = FieldCipher::new(&keys, &user);

        let mut expense = blank_expense(&cipher, &user);
        assert_eq!(cipher.description(&expense).unwrap(), None);

        cipher.set_description(&mut expense, Some("Lunch")).unwrap();
        assert_eq!(cipher.description(&expense).unwrap().as_deref(), Some("Lunch"));

        cipher.set_description(&mut expense, None).unwrap();
        assert!(expense.description.is_none());
    }

    #[test]
    fn test_tampered_amount_is_an_error_not_zero() {
        let keys = test_manager();
        let user = provisioned_user(&keys, "alice");
        let cipher = FieldCipher::new(&keys, &user);

        let mut expense = blank_expense(&cipher, &user);
        cipher.set_amount(&mut expense, Money::from_cents(999)).unwrap();

        let foreign = DataKey::generate();
        expense.amount = seal(b"\"1.00\"", &foreign).unwrap();

        let err = cipher.amount(&expense).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_tampered_description_is_an_error_not_placeholder() {
        let keys = test_manager();
        let user = provisioned_user(&keys, "alice");
        let cipher = FieldCipher::new(&keys, &user);

        let mut expense = blank_expense(&cipher, &user);
        cipher.set_description(&mut expense, Some("Rent")).unwrap();

        let mut text = expense.description.as_ref().unwrap().as_str().to_string();
        let flipped = if text.starts_with('A') { "B" } else { "A" };
        text.replace_range(0..1, flipped);
        expense.description = Some(EncryptedEnvelope::from_encoded(text));

        assert!(cipher.description(&expense).unwrap_err().is_authentication());
    }

    #[test]
    fn test_other_users_expense_rejected() {
        let keys = test_manager();
        let alice = provisioned_user(&keys, "alice");
        let bob = provisioned_user(&keys, "bob");

        let alice_cipher = FieldCipher::new(&keys, &alice);
        let expense = blank_expense(&alice_cipher, &alice);

        let bob_cipher = FieldCipher::new(&keys, &bob);
        assert!(bob_cipher.amount(&expense).unwrap_err().is_not_found());
    }

    #[test]
    fn test_unprovisioned_owner_fails_loudly() {
        let keys = test_manager();
        let user = User::new("carol", "carol@example.com");
        let cipher = FieldCipher::new(&keys, &user);

        let err = cipher.seal_amount(Money::from_cents(100)).unwrap_err();
        assert!(matches!(err, ExpenseError::KeyNotProvisioned(_)));
    }
}
