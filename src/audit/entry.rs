//! Audit entry data structures
//!
//! Defines the operations and entity types that can be audited and the
//! entry format itself. Snapshots of expenses are taken from the stored
//! record, so encrypted fields only ever appear as envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::UserId;

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Delete,
    /// A data key was generated and wrapped for a user
    ProvisionKey,
    LoginSuccess,
    LoginFailure,
    /// The failure threshold was reached
    Lockout,
    PasswordResetRequested,
    PasswordChanged,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Operation::Create => "CREATE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::ProvisionKey => "PROVISION_KEY",
            Operation::LoginSuccess => "LOGIN",
            Operation::LoginFailure => "LOGIN_FAILED",
            Operation::Lockout => "LOCKOUT",
            Operation::PasswordResetRequested => "RESET_REQUESTED",
            Operation::PasswordChanged => "PASSWORD_CHANGED",
        };
        write!(f, "{}", label)
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Expense,
    Budget,
    DataKey,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::User => write!(f, "User"),
            EntityType::Expense => write!(f, "Expense"),
            EntityType::Budget => write!(f, "Budget"),
            EntityType::DataKey => write!(f, "DataKey"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    pub entity_type: EntityType,

    /// ID of the affected entity, or the login identifier for login events
    pub entity_id: String,

    /// Human-readable label (username, category)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    /// Stored form of the entity before the operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    /// Stored form of the entity after the operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Full ID of the user whose account or data the entry concerns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

impl AuditEntry {
    fn bare(operation: Operation, entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id: entity_id.into(),
            entity_name: None,
            before: None,
            after: None,
            summary: None,
            actor: None,
        }
    }

    /// Entry for a newly stored entity
    pub fn create<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            entity_name,
            after: serde_json::to_value(entity).ok(),
            ..Self::bare(Operation::Create, entity_type, entity_id)
        }
    }

    /// Entry for a changed entity
    pub fn update<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> Self {
        Self {
            entity_name,
            before: serde_json::to_value(before).ok(),
            after: serde_json::to_value(after).ok(),
            ..Self::bare(Operation::Update, entity_type, entity_id)
        }
    }

    /// Entry for a removed entity
    pub fn delete<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            entity_name,
            before: serde_json::to_value(entity).ok(),
            ..Self::bare(Operation::Delete, entity_type, entity_id)
        }
    }

    /// Entry for a security event that carries no entity snapshot
    pub fn event(
        operation: Operation,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            summary: Some(summary.into()),
            ..Self::bare(operation, entity_type, entity_id)
        }
    }

    /// Attach a human-readable label
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.entity_name = Some(name.into());
        self
    }

    /// Attribute the entry to a user
    pub fn by(mut self, user_id: UserId) -> Self {
        self.actor = Some(user_id.full());
        self
    }

    /// Whether the entry is attributed to `user_id`
    pub fn concerns(&self, user_id: UserId) -> bool {
        self.actor.as_deref() == Some(user_id.full().as_str())
    }

    /// Format the entry as a single line for the `audit` command
    pub fn format_human_readable(&self) -> String {
        let mut line = format!(
            "{} {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.operation,
            self.entity_type,
            self.entity_id
        );
        if let Some(name) = &self.entity_name {
            line.push_str(&format!(" ({})", name));
        }
        if let Some(summary) = &self.summary {
            line.push_str(&format!(": {}", summary));
        }
        line
    }
}
