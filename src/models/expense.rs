//! Expense model
//!
//! The amount and description are held only as encrypted envelopes. There
//! are deliberately no plaintext accessors here; reading or writing them goes
//! through `crypto::FieldCipher` so the cost and failure modes of decryption
//! stay visible at the call site.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::category::ExpenseCategory;
use super::ids::{ExpenseId, UserId};
use crate::crypto::EncryptedEnvelope;

/// A single recorded expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,

    /// Owning user
    pub user_id: UserId,

    pub date: NaiveDate,

    pub category: ExpenseCategory,

    /// Sealed two-decimal amount text
    pub amount: EncryptedEnvelope,

    /// Sealed free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<EncryptedEnvelope>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Create an expense from an already-sealed amount
    pub fn new(
        user_id: UserId,
        date: NaiveDate,
        category: ExpenseCategory,
        amount: EncryptedEnvelope,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ExpenseId::new(),
            user_id,
            date,
            category,
            amount,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this expense belongs to the given user
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Plaintext projection of an expense, produced by decryption
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseView {
    pub id: ExpenseId,
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    pub amount: super::Money,
    pub description: Option<String>,
}
