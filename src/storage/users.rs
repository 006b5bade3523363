//! User repository for JSON storage
//!
//! Manages loading and saving users to users.json. Usernames and emails are
//! unique case-insensitively; both are kept in a lowercased lookup index.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{User, UserId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable user data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct UserData {
    users: Vec<User>,
}

#[derive(Default)]
struct UserTable {
    by_id: HashMap<UserId, User>,
    /// Lowercased username or email -> id
    index: HashMap<String, UserId>,
}

impl UserTable {
    fn index_user(&mut self, user: &User) {
        self.index.insert(user.username.to_lowercase(), user.id);
        self.index.insert(user.email.to_lowercase(), user.id);
    }

    fn unindex_user(&mut self, user: &User) {
        self.index.remove(&user.username.to_lowercase());
        self.index.remove(&user.email.to_lowercase());
    }

    /// First handle of `user` already claimed by somebody else
    fn conflict(&self, user: &User) -> Option<&'static str> {
        let taken = |key: &str| {
            self.index
                .get(&key.to_lowercase())
                .is_some_and(|owner| *owner != user.id)
        };
        if taken(&user.username) {
            Some("username")
        } else if taken(&user.email) {
            Some("email")
        } else {
            None
        }
    }
}

/// Repository for user persistence
pub struct UserRepository {
    path: PathBuf,
    data: RwLock<UserTable>,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(UserTable::default()),
        }
    }

    /// Load users from disk
    pub fn load(&self) -> ExpenseResult<()> {
        let file_data: UserData = read_json(&self.path)?;

        let mut table = self.data.write().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        *table = UserTable::default();
        for user in file_data.users {
            table.index_user(&user);
            table.by_id.insert(user.id, user);
        }

        Ok(())
    }

    /// Save users to disk
    pub fn save(&self) -> ExpenseResult<()> {
        let table = self.data.read().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut users: Vec<User> = table.by_id.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        write_json_atomic(&self.path, &UserData { users })
    }

    /// Get a user by ID
    pub fn get(&self, id: UserId) -> ExpenseResult<Option<User>> {
        let table = self.data.read().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(table.by_id.get(&id).cloned())
    }

    /// Find a user by username or email (case-insensitive)
    pub fn find_by_identifier(&self, identifier: &str) -> ExpenseResult<Option<User>> {
        let table = self.data.read().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let key = identifier.trim().to_lowercase();
        Ok(table
            .index
            .get(&key)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    /// Insert or update a user, rejecting a username or email held by another
    pub fn upsert(&self, user: User) -> ExpenseResult<()> {
        let mut table = self.data.write().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if let Some(field) = table.conflict(&user) {
            let identifier = if field == "username" {
                user.username.clone()
            } else {
                user.email.clone()
            };
            return Err(ExpenseError::Duplicate {
                entity_type: "User",
                identifier,
            });
        }

        if let Some(previous) = table.by_id.remove(&user.id) {
            table.unindex_user(&previous);
        }
        table.index_user(&user);
        table.by_id.insert(user.id, user);
        Ok(())
    }

    /// Count users
    pub fn count(&self) -> ExpenseResult<usize> {
        let table = self.data.read().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(table.by_id.len())
    }

    /// Count users holding a wrapped data key
    pub fn count_with_keys(&self) -> ExpenseResult<usize> {
        let table = self.data.read().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(table.by_id.values().filter(|u| u.wrapped_key.is_some()).count())
    }
}
