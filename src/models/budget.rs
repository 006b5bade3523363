//! Budget model
//!
//! At most one budget exists per (user, category, period). Budget amounts
//! are stored in plaintext, unlike expense amounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::category::ExpenseCategory;
use super::ids::{BudgetId, UserId};
use super::money::Money;
use crate::error::ExpenseError;

/// How often a budget amount applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    #[default]
    Monthly,
    Weekly,
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Weekly => write!(f, "weekly"),
        }
    }
}

impl FromStr for BudgetPeriod {
    type Err = ExpenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" => Ok(Self::Monthly),
            "weekly" | "week" => Ok(Self::Weekly),
            other => Err(ExpenseError::Validation(format!(
                "Budget period must be 'monthly' or 'weekly', got '{}'",
                other
            ))),
        }
    }
}

/// A spending limit for one category and period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,

    pub user_id: UserId,

    pub category: ExpenseCategory,

    #[serde(default)]
    pub period: BudgetPeriod,

    pub amount: Money,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(
        user_id: UserId,
        category: ExpenseCategory,
        period: BudgetPeriod,
        amount: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            user_id,
            category,
            period,
            amount,
            created_at: now,
            updated_at: now,
        }
    }

    /// Change the amount in place
    pub fn set_amount(&mut self, amount: Money) {
        self.amount = amount;
        self.updated_at = Utc::now();
    }

    /// The uniqueness key of this budget
    pub fn slot(&self) -> (UserId, ExpenseCategory, BudgetPeriod) {
        (self.user_id, self.category, self.period)
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} per {}", self.category, self.amount, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parse() {
        assert_eq!("Monthly".parse::<BudgetPeriod>().unwrap(), BudgetPeriod::Monthly);
        assert_eq!("weekly".parse::<BudgetPeriod>().unwrap(), BudgetPeriod::Weekly);
        assert!("yearly".parse::<BudgetPeriod>().unwrap_err().is_validation());
    }

    #[test]
    fn test_period_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&BudgetPeriod::Weekly).unwrap(), "\"weekly\"");
    }

    #[test]
    fn test_display() {
        let budget = Budget::new(
            UserId::new(),
            ExpenseCategory::Food,
            BudgetPeriod::Monthly,
            Money::from_cents(30000),
        );
        assert_eq!(budget.to_string(), "Food: $300.00 per monthly");
    }
}
