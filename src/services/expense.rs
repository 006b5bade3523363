//! Expense service
//!
//! CRUD, listing and search over a user's expenses. Every operation is
//! scoped to the authenticated user; another user's expense is reported as
//! not found. Amount and description go through `FieldCipher`, and a record
//! that fails to decrypt fails the whole call.

use chrono::NaiveDate;

use crate::audit::{AuditEntry, EntityType};
use crate::crypto::{FieldCipher, KeyManager};
use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{Expense, ExpenseCategory, ExpenseView, Money, User};
use crate::storage::Storage;

/// Service for expense management
pub struct ExpenseService<'a> {
    storage: &'a Storage,
    keys: &'a KeyManager,
}

/// Input for recording a new expense
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    pub amount: Money,
    pub description: Option<String>,
}

/// Fields to change on an existing expense; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    pub date: Option<NaiveDate>,
    pub category: Option<ExpenseCategory>,
    pub amount: Option<Money>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
}

impl ExpenseUpdate {
    fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.category.is_none()
            && self.amount.is_none()
            && self.description.is_none()
    }
}

/// Options for searching expenses
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub category: Option<ExpenseCategory>,
    /// Inclusive
    pub start_date: Option<NaiveDate>,
    /// Inclusive
    pub end_date: Option<NaiveDate>,
    pub min_amount: Option<Money>,
    pub max_amount: Option<Money>,
    /// Case-insensitive substring of the description
    pub text: Option<String>,
    pub limit: Option<usize>,
}

impl ExpenseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: ExpenseCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn amount_range(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.min_amount = min;
        self.max_amount = max;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filters that only need the plaintext columns
    fn matches_record(&self, expense: &Expense) -> bool {
        self.category.map_or(true, |c| expense.category == c)
            && self.start_date.map_or(true, |d| expense.date >= d)
            && self.end_date.map_or(true, |d| expense.date <= d)
    }

    /// Filters over the decrypted fields
    fn matches_view(&self, view: &ExpenseView) -> bool {
        let text_ok = match &self.text {
            Some(needle) if !needle.is_empty() => view
                .description
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        };

        self.min_amount.map_or(true, |min| view.amount >= min)
            && self.max_amount.map_or(true, |max| view.amount <= max)
            && text_ok
    }
}

impl<'a> ExpenseService<'a> {
    pub fn new(storage: &'a Storage, keys: &'a KeyManager) -> Self {
        Self { storage, keys }
    }

    /// Record a new expense for `user`
    pub fn add(&self, user: &User, input: NewExpense) -> ExpenseResult<Expense> {
        validate_amount(input.amount)?;
        let cipher = FieldCipher::new(self.keys, user);

        let mut expense = Expense::new(
            user.id,
            input.date,
            input.category,
            cipher.seal_amount(input.amount)?,
        );
        expense.description = cipher.seal_description(normalize(input.description.as_deref()))?;

        self.storage.expenses.upsert(expense.clone())?;
        self.storage.expenses.save()?;

        self.storage.log_audit(
            &AuditEntry::create(
                EntityType::Expense,
                expense.id.full(),
                Some(expense.category.to_string()),
                &expense,
            )
            .by(user.id),
        )?;

        Ok(expense)
    }

    /// Get one of the user's expenses by ID or short reference
    pub fn get(&self, user: &User, reference: &str) -> ExpenseResult<Expense> {
        self.storage
            .expenses
            .find_for_user(user.id, reference)?
            .ok_or_else(|| ExpenseError::expense_not_found(reference))
    }

    /// Change fields of an expense
    pub fn update(&self, user: &User, reference: &str, changes: ExpenseUpdate) -> ExpenseResult<Expense> {
        if changes.is_empty() {
            return Err(ExpenseError::Validation("Nothing to update".into()));
        }

        let before = self.get(user, reference)?;
        let mut expense = before.clone();
        let cipher = FieldCipher::new(self.keys, user);

        if let Some(date) = changes.date {
            expense.date = date;
        }
        if let Some(category) = changes.category {
            expense.category = category;
        }
        if let Some(amount) = changes.amount {
            validate_amount(amount)?;
            cipher.set_amount(&mut expense, amount)?;
        }
        if let Some(description) = changes.description {
            cipher.set_description(&mut expense, normalize(description.as_deref()))?;
        }
        expense.touch();

        self.storage.expenses.upsert(expense.clone())?;
        self.storage.expenses.save()?;

        self.storage.log_audit(
            &AuditEntry::update(
                EntityType::Expense,
                expense.id.full(),
                Some(expense.category.to_string()),
                &before,
                &expense,
            )
            .by(user.id),
        )?;

        Ok(expense)
    }

    /// Delete an expense, returning the removed record
    pub fn delete(&self, user: &User, reference: &str) -> ExpenseResult<Expense> {
        let expense = self.get(user, reference)?;

        self.storage.expenses.delete(expense.id)?;
        self.storage.expenses.save()?;

        self.storage.log_audit(
            &AuditEntry::delete(
                EntityType::Expense,
                expense.id.full(),
                Some(expense.category.to_string()),
                &expense,
            )
            .by(user.id),
        )?;

        Ok(expense)
    }

    /// Decrypt an expense into its plaintext view
    pub fn decrypt(&self, user: &User, expense: &Expense) -> ExpenseResult<ExpenseView> {
        let cipher = FieldCipher::new(self.keys, user);
        Ok(ExpenseView {
            id: expense.id,
            date: expense.date,
            category: expense.category,
            amount: cipher.amount(expense)?,
            description: cipher.description(expense)?,
        })
    }

    /// The most recent expenses, newest first
    pub fn recent(&self, user: &User, limit: usize) -> ExpenseResult<Vec<ExpenseView>> {
        self.search(user, &ExpenseFilter::new().limit(limit))
    }

    /// Search the user's expenses, newest first
    ///
    /// Amount and text filters are evaluated on decrypted values.
    pub fn search(&self, user: &User, filter: &ExpenseFilter) -> ExpenseResult<Vec<ExpenseView>> {
        let mut results = Vec::new();

        for expense in self.storage.expenses.get_by_user(user.id)? {
            if filter.limit.is_some_and(|limit| results.len() >= limit) {
                break;
            }
            if !filter.matches_record(&expense) {
                continue;
            }
            let view = self.decrypt(user, &expense)?;
            if filter.matches_view(&view) {
                results.push(view);
            }
        }

        Ok(results)
    }
}

fn validate_amount(amount: Money) -> ExpenseResult<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(ExpenseError::Validation(format!(
            "Expense amount must be positive, got {}",
            amount
        )))
    }
}

fn normalize(description: Option<&str>) -> Option<&str> {
    description.map(str::trim).filter(|d| !d.is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::crypto::key_hierarchy::tests::test_manager;
    use crate::crypto::EncryptedEnvelope;
    use crate::services::account::tests::create_test_storage;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn registered_user(storage: &Storage, keys: &KeyManager, name: &str) -> User {
        let mut user = User::new(name, format!("{}@example.com", name));
        keys.provision_user_key(&mut user).unwrap();
        storage.users.upsert(user.clone()).unwrap();
        user
    }

    pub(crate) fn new_expense(day: NaiveDate, category: ExpenseCategory, cents: i64, description: Option<&str>) -> NewExpense {
        NewExpense {
            date: day,
            category,
            amount: Money::from_cents(cents),
            description: description.map(String::from),
        }
    }

    #[test]
    fn test_add_stores_only_ciphertext() {
        let (temp_dir, storage) = create_test_storage();
        let keys = test_manager();
        let alice = registered_user(&storage, &keys, "alice");
        let service = ExpenseService::new(&storage, &keys);

        let expense = service
            .add(&alice, new_expense(date(2025, 1, 15), ExpenseCategory::Food, 1250, Some("Groceries at Mercado")))
            .unwrap();

        let raw = std::fs::read_to_string(temp_dir.path().join("data").join("expenses.json")).unwrap();
        assert!(!raw.contains("12.50"));
        assert!(!raw.contains("Mercado"));

        let audit = std::fs::read_to_string(temp_dir.path().join("audit.log")).unwrap();
        assert!(!audit.contains("Mercado"));

        let view = service.decrypt(&alice, &expense).unwrap();
        assert_eq!(view.amount, Money::from_cents(1250));
        assert_eq!(view.description.as_deref(), Some("Groceries at Mercado"));
    }

    #[test]
    fn test_add_rejects_non_positive_amount() {
        let (_temp_dir, storage) = create_test_storage();
        let keys = test_manager();
        let alice = registered_user(&storage, &keys, "alice");
        let service = ExpenseService::new(&storage, &keys);

        let err = service
            .add(&alice, new_expense(date(2025, 1, 1), ExpenseCategory::Food, 0, None))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_other_users_expense_is_not_found() {
        let (_temp_dir, storage) = create_test_storage();
        let keys = test_manager();
        let alice = registered_user(&storage, &keys, "alice");
        let bob = registered_user(&storage, &keys, "bob");
        let service = ExpenseService::new(&storage, &keys);

        let expense = service
            .add(&alice, new_expense(date(2025, 1, 1), ExpenseCategory::Food, 500, None))
            .unwrap();
        let reference = expense.id.full();

        assert!(service.get(&bob, &reference).unwrap_err().is_not_found());
        assert!(service.delete(&bob, &reference).unwrap_err().is_not_found());
        assert!(service.get(&alice, &reference).is_ok());
    }

    #[test]
    fn test_update_reseals_and_clears_description() {
        let (_temp_dir, storage) = create_test_storage();
        let keys = test_manager();
        let alice = registered_user(&storage, &keys, "alice");
        let service = ExpenseService::new(&storage, &keys);

        let expense = service
            .add(&alice, new_expense(date(2025, 1, 1), ExpenseCategory::Food, 500, Some("lunch")))
            .unwrap();

        let updated = service
            .update(
                &alice,
                &expense.id.full(),
                ExpenseUpdate {
                    amount: Some(Money::from_cents(725)),
                    category: Some(ExpenseCategory::Entertainment),
                    description: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_ne!(updated.amount, expense.amount);
        let view = service.decrypt(&alice, &updated).unwrap();
        assert_eq!(view.amount, Money::from_cents(725));
        assert_eq!(view.category, ExpenseCategory::Entertainment);
        assert_eq!(view.description, None);

        assert!(service
            .update(&alice, &expense.id.full(), ExpenseUpdate::default())
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, storage) = create_test_storage();
        let keys = test_manager();
        let alice = registered_user(&storage, &keys, "alice");
        let service = ExpenseService::new(&storage, &keys);

        let expense = service
            .add(&alice, new_expense(date(2025, 1, 1), ExpenseCategory::Food, 500, None))
            .unwrap();
        service.delete(&alice, &expense.id.to_string()).unwrap();

        assert!(service.recent(&alice, 10).unwrap().is_empty());
    }

    #[test]
    fn test_search_filters() {
        let (_temp_dir, storage) = create_test_storage();
        let keys = test_manager();
        let alice = registered_user(&storage, &keys, "alice");
        let bob = registered_user(&storage, &keys, "bob");
        let service = ExpenseService::new(&storage, &keys);

        service.add(&alice, new_expense(date(2025, 1, 5), ExpenseCategory::Food, 1200, Some("Weekly groceries"))).unwrap();
        service.add(&alice, new_expense(date(2025, 1, 20), ExpenseCategory::Food, 4500, Some("Dinner out"))).unwrap();
        service.add(&alice, new_expense(date(2025, 2, 1), ExpenseCategory::Utilities, 9000, Some("Power bill"))).unwrap();
        service.add(&bob, new_expense(date(2025, 1, 6), ExpenseCategory::Food, 1500, Some("groceries"))).unwrap();

        let food = service
            .search(&alice, &ExpenseFilter::new().category(ExpenseCategory::Food))
            .unwrap();
        assert_eq!(food.len(), 2);
        assert_eq!(food[0].date, date(2025, 1, 20));

        let january = service
            .search(&alice, &ExpenseFilter::new().date_range(Some(date(2025, 1, 1)), Some(date(2025, 1, 20))))
            .unwrap();
        assert_eq!(january.len(), 2);

        let mid = service
            .search(
                &alice,
                &ExpenseFilter::new().amount_range(Some(Money::from_cents(1200)), Some(Money::from_cents(4500))),
            )
            .unwrap();
        assert_eq!(mid.len(), 2);

        let groceries = service.search(&alice, &ExpenseFilter::new().text("GROCER")).unwrap();
        assert_eq!(groceries.len(), 1);
        assert_eq!(groceries[0].amount, Money::from_cents(1200));

        assert_eq!(service.recent(&alice, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_zero_limit_returns_nothing() {
        let (_temp_dir, storage) = create_test_storage();
        let keys = test_manager();
        let alice = registered_user(&storage, &keys, "alice");
        let service = ExpenseService::new(&storage, &keys);

        service.add(&alice, new_expense(date(2025, 1, 5), ExpenseCategory::Food, 1200, None)).unwrap();
        service.add(&alice, new_expense(date(2025, 1, 6), ExpenseCategory::Food, 1300, None)).unwrap();

        assert!(service.recent(&alice, 0).unwrap().is_empty());
        let none = service
            .search(&alice, &ExpenseFilter::new().category(ExpenseCategory::Food).limit(0))
            .unwrap();
        assert!(none.is_empty());
        assert_eq!(service.recent(&alice, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_tampered_record_fails_search() {
        let (_temp_dir, storage) = create_test_storage();
        let keys = test_manager();
        let alice = registered_user(&storage, &keys, "alice");
        let service = ExpenseService::new(&storage, &keys);

        let mut expense = service
            .add(&alice, new_expense(date(2025, 1, 1), ExpenseCategory::Food, 500, None))
            .unwrap();
        let other = service
            .add(&alice, new_expense(date(2025, 1, 2), ExpenseCategory::Food, 600, None))
            .unwrap();
        // Swap one base64 character of a valid envelope
        let mut encoded: Vec<char> = other.amount.as_str().chars().collect();
        encoded[20] = if encoded[20] == 'A' { 'B' } else { 'A' };
        expense.amount = EncryptedEnvelope::from_encoded(encoded.into_iter().collect::<String>());
        storage.expenses.upsert(expense).unwrap();

        assert!(service.recent(&alice, 10).is_err());
    }
}
