//! Budget repository for JSON storage
//!
//! Manages loading and saving budgets to budgets.json. At most one budget
//! exists per (user, category, period) slot.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{Budget, BudgetId, BudgetPeriod, ExpenseCategory, UserId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable budget data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct BudgetData {
    budgets: Vec<Budget>,
}

/// Repository for budget persistence
pub struct BudgetRepository {
    path: PathBuf,
    data: RwLock<HashMap<BudgetId, Budget>>,
}

impl BudgetRepository {
    /// Create a new budget repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load budgets from disk
    pub fn load(&self) -> ExpenseResult<()> {
        let file_data: BudgetData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for budget in file_data.budgets {
            data.insert(budget.id, budget);
        }

        Ok(())
    }

    /// Save budgets to disk
    pub fn save(&self) -> ExpenseResult<()> {
        let data = self.data.read().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut budgets: Vec<Budget> = data.values().cloned().collect();
        budgets.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        write_json_atomic(&self.path, &BudgetData { budgets })
    }

    /// The budget occupying a slot, if any
    pub fn get_for_slot(
        &self,
        user_id: UserId,
        category: ExpenseCategory,
        period: BudgetPeriod,
    ) -> ExpenseResult<Option<Budget>> {
        let data = self.data.read().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data
            .values()
            .find(|b| b.slot() == (user_id, category, period))
            .cloned())
    }

    /// All budgets of one user, ordered by category then period
    pub fn get_by_user(&self, user_id: UserId) -> ExpenseResult<Vec<Budget>> {
        let data = self.data.read().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut budgets: Vec<Budget> = data
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        budgets.sort_by_key(|b| (b.category, b.period));
        Ok(budgets)
    }

    /// Insert or update a budget
    ///
    /// Fails with `Duplicate` if a different budget already holds the slot.
    pub fn upsert(&self, budget: Budget) -> ExpenseResult<()> {
        let mut data = self.data.write().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let slot = budget.slot();
        if data.values().any(|b| b.slot() == slot && b.id != budget.id) {
            return Err(ExpenseError::Duplicate {
                entity_type: "Budget",
                identifier: format!("{} ({})", budget.category, budget.period),
            });
        }

        data.insert(budget.id, budget);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, BudgetRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("budgets.json");
        let repo = BudgetRepository::new(path);
        (temp_dir, repo)
    }

    #[test]
    fn test_slot_is_unique() {
        let (_temp_dir, repo) = create_test_repo();
        let user = UserId::new();

        let food = Budget::new(user, ExpenseCategory::Food, BudgetPeriod::Monthly, Money::from_cents(30000));
        repo.upsert(food).unwrap();

        let clash = Budget::new(user, ExpenseCategory::Food, BudgetPeriod::Monthly, Money::from_cents(100));
        let err = repo.upsert(clash).unwrap_err();
        assert!(matches!(err, ExpenseError::Duplicate { .. }));

        let weekly = Budget::new(user, ExpenseCategory::Food, BudgetPeriod::Weekly, Money::from_cents(100));
        repo.upsert(weekly).unwrap();
        assert_eq!(repo.get_by_user(user).unwrap().len(), 2);
    }

    #[test]
    fn test_update_in_place() {
        let (_temp_dir, repo) = create_test_repo();
        let user = UserId::new();
        let mut budget = Budget::new(user, ExpenseCategory::Food, BudgetPeriod::Monthly, Money::from_cents(100));
        repo.upsert(budget.clone()).unwrap();

        budget.set_amount(Money::from_cents(250));
        repo.upsert(budget).unwrap();

        let stored = repo
            .get_for_slot(user, ExpenseCategory::Food, BudgetPeriod::Monthly)
            .unwrap()
            .unwrap();
        assert_eq!(stored.amount.cents(), 250);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let user = UserId::new();
        repo.upsert(Budget::new(user, ExpenseCategory::Housing, BudgetPeriod::Monthly, Money::from_cents(120000)))
            .unwrap();
        repo.save().unwrap();

        let repo2 = BudgetRepository::new(temp_dir.path().join("budgets.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.get_by_user(user).unwrap().len(), 1);
    }
}
