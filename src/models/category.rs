//! Expense categories
//!
//! Expenses and budgets draw from one fixed set of categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ExpenseError;

/// A fixed spending category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Housing,
    Transportation,
    Food,
    Utilities,
    Insurance,
    Healthcare,
    Savings,
    Entertainment,
    Shopping,
    Other,
}

impl ExpenseCategory {
    /// All categories in display order
    pub fn all() -> &'static [ExpenseCategory] {
        &[
            Self::Housing,
            Self::Transportation,
            Self::Food,
            Self::Utilities,
            Self::Insurance,
            Self::Healthcare,
            Self::Savings,
            Self::Entertainment,
            Self::Shopping,
            Self::Other,
        ]
    }

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Housing => "Housing",
            Self::Transportation => "Transportation",
            Self::Food => "Food",
            Self::Utilities => "Utilities",
            Self::Insurance => "Insurance",
            Self::Healthcare => "Healthcare",
            Self::Savings => "Savings",
            Self::Entertainment => "Entertainment",
            Self::Shopping => "Shopping",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExpenseCategory {
    type Err = ExpenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<_> = Self::all().iter().map(|c| c.name()).collect();
                ExpenseError::Validation(format!(
                    "Category must be one of: {}",
                    names.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("food".parse::<ExpenseCategory>().unwrap(), ExpenseCategory::Food);
        assert_eq!(
            " HEALTHCARE ".parse::<ExpenseCategory>().unwrap(),
            ExpenseCategory::Healthcare
        );
    }

    #[test]
    fn test_unknown_category_rejected() {
        let err = "Crypto".parse::<ExpenseCategory>().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Housing, Transportation"));
    }

    #[test]
    fn test_all_has_ten_categories() {
        assert_eq!(ExpenseCategory::all().len(), 10);
    }
}
