//! Core budget domain types.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    auth::UserID,
    category::{Category, CategoryId},
};

/// Database identifier for a budget.
pub type BudgetId = i64;

/// A spending cap for one category over one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserID,
    pub category_id: CategoryId,
    /// The first day of the month the budget covers.
    pub month: Date,
    /// The most the user wants to spend in the month. Always greater than zero.
    pub limit: f64,
}

/// How far through its limit a budget is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    UnderBudget,
    NearLimit,
    OverBudget,
}

impl BudgetStatus {
    /// Budgets at or above this percentage of their limit are near the limit.
    pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

    pub fn label(self) -> &'static str {
        match self {
            BudgetStatus::UnderBudget => "Under budget",
            BudgetStatus::NearLimit => "Near limit",
            BudgetStatus::OverBudget => "Over budget",
        }
    }

    /// The tailwind background class for progress bars.
    pub fn bar_class(self) -> &'static str {
        match self {
            BudgetStatus::UnderBudget => "bg-green-500",
            BudgetStatus::NearLimit => "bg-yellow-400",
            BudgetStatus::OverBudget => "bg-red-600",
        }
    }
}

/// A budget alongside how much of it has been spent.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetUtilization {
    pub budget: Budget,
    pub category: Category,
    /// The sum of expense magnitudes in the category for the month.
    pub spent: f64,
    /// `limit - spent`, negative when over budget.
    pub remaining: f64,
    pub percent_used: f64,
    pub status: BudgetStatus,
}

/// The form data for creating a budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetFormData {
    pub category_id: CategoryId,
    /// A month of the form "2025-03".
    pub month: String,
    pub limit: f64,
}

/// The form data for changing a budget's limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetLimitFormData {
    pub limit: f64,
}
