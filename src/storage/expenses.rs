//! Expense repository for JSON storage
//!
//! Manages loading and saving expenses to expenses.json. Records are stored
//! exactly as held in memory: amount and description stay sealed.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{Expense, ExpenseId, UserId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable expense data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ExpenseData {
    expenses: Vec<Expense>,
}

/// Repository for expense persistence
pub struct ExpenseRepository {
    path: PathBuf,
    data: RwLock<HashMap<ExpenseId, Expense>>,
}

impl ExpenseRepository {
    /// Create a new expense repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load expenses from disk
    pub fn load(&self) -> ExpenseResult<()> {
        let file_data: ExpenseData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for expense in file_data.expenses {
            data.insert(expense.id, expense);
        }

        Ok(())
    }

    /// Save expenses to disk, oldest first
    pub fn save(&self) -> ExpenseResult<()> {
        let data = self.data.read().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut expenses: Vec<Expense> = data.values().cloned().collect();
        expenses.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));

        write_json_atomic(&self.path, &ExpenseData { expenses })
    }

    /// Get an expense by ID
    pub fn get(&self, id: ExpenseId) -> ExpenseResult<Option<Expense>> {
        let data = self.data.read().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// All expenses of one user, newest first
    pub fn get_by_user(&self, user_id: UserId) -> ExpenseResult<Vec<Expense>> {
        let data = self.data.read().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut expenses: Vec<Expense> = data
            .values()
            .filter(|e| e.is_owned_by(user_id))
            .cloned()
            .collect();
        expenses.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(expenses)
    }

    /// Find a user's expense by full ID or short prefix
    pub fn find_for_user(&self, user_id: UserId, reference: &str) -> ExpenseResult<Option<Expense>> {
        let data = self.data.read().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut matches = data
            .values()
            .filter(|e| e.is_owned_by(user_id) && e.id.matches(reference));

        match (matches.next(), matches.next()) {
            (Some(expense), None) => Ok(Some(expense.clone())),
            (None, _) => Ok(None),
            (Some(_), Some(_)) => Err(ExpenseError::Validation(format!(
                "Expense reference '{}' is ambiguous; use more characters",
                reference
            ))),
        }
    }

    /// Insert or update an expense
    pub fn upsert(&self, expense: Expense) -> ExpenseResult<()> {
        let mut data = self.data.write().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(expense.id, expense);
        Ok(())
    }

    /// Delete an expense
    pub fn delete(&self, id: ExpenseId) -> ExpenseResult<bool> {
        let mut data = self.data.write().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(data.remove(&id).is_some())
    }

    /// Count expenses
    pub fn count(&self) -> ExpenseResult<usize> {
        let data = self.data.read().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::EncryptedEnvelope;
    use crate::models::ExpenseCategory;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, ExpenseRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("expenses.json");
        let repo = ExpenseRepository::new(path);
        (temp_dir, repo)
    }

    fn expense(user_id: UserId, day: u32) -> Expense {
        Expense::new(
            user_id,
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            ExpenseCategory::Food,
            EncryptedEnvelope::from_encoded("c2VhbGVk"),
        )
    }

    #[test]
    fn test_get_by_user_newest_first() {
        let (_temp_dir, repo) = create_test_repo();
        let alice = UserId::new();
        let bob = UserId::new();

        repo.upsert(expense(alice, 3)).unwrap();
        repo.upsert(expense(alice, 10)).unwrap();
        repo.upsert(expense(bob, 5)).unwrap();

        let mine = repo.get_by_user(alice).unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].date.to_string(), "2025-01-10");
        assert_eq!(mine[1].date.to_string(), "2025-01-03");
    }

    #[test]
    fn test_find_for_user_by_prefix() {
        let (_temp_dir, repo) = create_test_repo();
        let alice = UserId::new();
        let e = expense(alice, 1);
        let id = e.id;
        repo.upsert(e).unwrap();

        let short = id.to_string();
        assert_eq!(repo.find_for_user(alice, &short).unwrap().unwrap().id, id);
        assert!(repo.find_for_user(UserId::new(), &short).unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, repo) = create_test_repo();
        let e = expense(UserId::new(), 1);
        let id = e.id;
        repo.upsert(e).unwrap();

        assert!(repo.delete(id).unwrap());
        assert!(!repo.delete(id).unwrap());
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_saved_file_holds_only_envelopes() {
        let (temp_dir, repo) = create_test_repo();
        let e = expense(UserId::new(), 1);
        let id = e.id;
        repo.upsert(e).unwrap();
        repo.save().unwrap();

        let raw = std::fs::read_to_string(temp_dir.path().join("expenses.json")).unwrap();
        assert!(raw.contains("c2VhbGVk"));

        let repo2 = ExpenseRepository::new(temp_dir.path().join("expenses.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.get(id).unwrap().unwrap().amount.as_str(), "c2VhbGVk");
    }
}
