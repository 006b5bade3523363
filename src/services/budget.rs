//! Budget service
//!
//! Setting per-category budgets and comparing them with a month's decrypted
//! spending.

use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};

use crate::audit::{AuditEntry, EntityType};
use crate::crypto::{FieldCipher, KeyManager};
use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{Budget, BudgetPeriod, ExpenseCategory, Money, User};
use crate::storage::Storage;

/// Longest spending trend, in months
pub const MAX_TREND_MONTHS: u32 = 120;

/// Service for budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
    keys: &'a KeyManager,
}

/// Budget against spending for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryStatus {
    pub category: ExpenseCategory,
    /// Zero when no budget is set
    pub budget_amount: Money,
    pub spent: Money,
    /// Zero when no budget is set; negative when overspent
    pub remaining: Money,
    pub has_budget: bool,
}

impl CategoryStatus {
    pub fn is_over_budget(&self) -> bool {
        self.has_budget && self.remaining.is_negative()
    }
}

/// Budget status of every category for one calendar month
#[derive(Debug, Clone)]
pub struct BudgetReport {
    /// First day of the month
    pub month: NaiveDate,
    pub categories: Vec<CategoryStatus>,
    pub total_budget: Money,
    pub total_spent: Money,
}

impl BudgetReport {
    /// Spending as a percentage of the total budget, if any budget is set
    pub fn utilization_percent(&self) -> Option<f64> {
        if self.total_budget.is_positive() {
            Some(self.total_spent.cents() as f64 / self.total_budget.cents() as f64 * 100.0)
        } else {
            None
        }
    }
}

impl<'a> BudgetService<'a> {
    pub fn new(storage: &'a Storage, keys: &'a KeyManager) -> Self {
        Self { storage, keys }
    }

    /// Create or replace the budget for a category and period
    pub fn set(
        &self,
        user: &User,
        category: ExpenseCategory,
        period: BudgetPeriod,
        amount: Money,
    ) -> ExpenseResult<Budget> {
        if amount.is_negative() {
            return Err(ExpenseError::Validation(format!(
                "Budget amount cannot be negative, got {}",
                amount
            )));
        }

        let existing = self.storage.budgets.get_for_slot(user.id, category, period)?;
        let (budget, entry) = match existing {
            Some(before) => {
                let mut budget = before.clone();
                budget.set_amount(amount);
                self.storage.budgets.upsert(budget.clone())?;
                let entry = AuditEntry::update(
                    EntityType::Budget,
                    budget.id.full(),
                    Some(category.to_string()),
                    &before,
                    &budget,
                );
                (budget, entry)
            }
            None => {
                let budget = Budget::new(user.id, category, period, amount);
                self.storage.budgets.upsert(budget.clone())?;
                let entry = AuditEntry::create(
                    EntityType::Budget,
                    budget.id.full(),
                    Some(category.to_string()),
                    &budget,
                );
                (budget, entry)
            }
        };

        self.storage.budgets.save()?;
        self.storage.log_audit(&entry.by(user.id))?;

        Ok(budget)
    }

    /// All budgets of the user
    pub fn list(&self, user: &User) -> ExpenseResult<Vec<Budget>> {
        self.storage.budgets.get_by_user(user.id)
    }

    /// Monthly budgets against spending for the month containing `day`
    pub fn status(&self, user: &User, day: NaiveDate) -> ExpenseResult<BudgetReport> {
        let (month, next_month) = month_bounds(day)?;
        let spent_by_category = self.spending_between(user, month, next_month)?;

        let budgets: HashMap<ExpenseCategory, Money> = self
            .list(user)?
            .into_iter()
            .filter(|b| b.period == BudgetPeriod::Monthly)
            .map(|b| (b.category, b.amount))
            .collect();

        let categories: Vec<CategoryStatus> = ExpenseCategory::all()
            .iter()
            .map(|&category| {
                let spent = spent_by_category.get(&category).copied().unwrap_or_default();
                match budgets.get(&category) {
                    Some(&budget_amount) => CategoryStatus {
                        category,
                        budget_amount,
                        spent,
                        remaining: budget_amount - spent,
                        has_budget: true,
                    },
                    None => CategoryStatus {
                        category,
                        budget_amount: Money::zero(),
                        spent,
                        remaining: Money::zero(),
                        has_budget: false,
                    },
                }
            })
            .collect();

        Ok(BudgetReport {
            month,
            total_budget: total(budgets.values().copied())?,
            total_spent: total(spent_by_category.values().copied())?,
            categories,
        })
    }

    /// Total spending per month for `months` months ending with the month of `day`
    pub fn monthly_totals(
        &self,
        user: &User,
        day: NaiveDate,
        months: u32,
    ) -> ExpenseResult<Vec<(NaiveDate, Money)>> {
        if months == 0 || months > MAX_TREND_MONTHS {
            return Err(ExpenseError::Validation(format!(
                "Months must be between 1 and {}, got {}",
                MAX_TREND_MONTHS, months
            )));
        }

        let (last_month, _) = month_bounds(day)?;
        let mut totals = Vec::with_capacity(months as usize);

        for back in (0..months).rev() {
            let start = last_month
                .checked_sub_months(Months::new(back))
                .ok_or_else(|| ExpenseError::Validation("Month out of range".into()))?;
            let (start, end) = month_bounds(start)?;
            let spent = self.spending_between(user, start, end)?;
            totals.push((start, total(spent.values().copied())?));
        }

        Ok(totals)
    }

    /// Decrypted spending per category in `[start, end)`
    fn spending_between(
        &self,
        user: &User,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ExpenseResult<HashMap<ExpenseCategory, Money>> {
        let cipher = FieldCipher::new(self.keys, user);
        let mut totals: HashMap<ExpenseCategory, Money> = HashMap::new();

        for expense in self.storage.expenses.get_by_user(user.id)? {
            if expense.date < start || expense.date >= end {
                continue;
            }
            let amount = cipher.amount(&expense)?;
            let spent = totals.entry(expense.category).or_default();
            *spent = spent.checked_add(amount).ok_or_else(out_of_range)?;
        }

        Ok(totals)
    }
}

fn out_of_range() -> ExpenseError {
    ExpenseError::Validation("Total amount out of range".into())
}

fn total(amounts: impl IntoIterator<Item = Money>) -> ExpenseResult<Money> {
    Money::checked_sum(amounts).ok_or_else(out_of_range)
}

/// First day of the month containing `day` and first day of the next month
fn month_bounds(day: NaiveDate) -> ExpenseResult<(NaiveDate, NaiveDate)> {
    let start = day
        .with_day(1)
        .ok_or_else(|| ExpenseError::Validation(format!("Invalid date: {}", day)))?;
    let end = start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| ExpenseError::Validation("Month out of range".into()))?;
    Ok((start, end))
}
