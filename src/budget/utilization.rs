//! Compares budgets against what was actually spent.

use std::collections::HashMap;

use time::Date;

use crate::{
    budget::{Budget, BudgetStatus, BudgetUtilization},
    category::{Category, CategoryId},
    month::start_of_month,
    transaction::Transaction,
};

impl BudgetStatus {
    /// Classify spending against a limit.
    ///
    /// Spending exactly the limit counts as near the limit, not over it.
    pub fn classify(spent: f64, limit: f64) -> Self {
        if spent > limit {
            BudgetStatus::OverBudget
        } else if percent_of(spent, limit) >= Self::NEAR_LIMIT_PERCENT {
            BudgetStatus::NearLimit
        } else {
            BudgetStatus::UnderBudget
        }
    }
}

fn percent_of(spent: f64, limit: f64) -> f64 {
    if limit > 0.0 {
        spent / limit * 100.0
    } else {
        0.0
    }
}

/// Work out how much of each budget has been spent.
///
/// Only expenses dated in a budget's month and in its category count towards
/// it; income is ignored. Budgets whose category is not in `categories` are
/// skipped. The output keeps the order of `budgets`.
pub fn calculate_utilization(
    budgets: &[Budget],
    categories: &[Category],
    transactions: &[Transaction],
) -> Vec<BudgetUtilization> {
    let mut spent_by_month: HashMap<(CategoryId, Date), f64> = HashMap::new();

    for transaction in transactions.iter().filter(|t| t.amount < 0.0) {
        *spent_by_month
            .entry((transaction.category_id, start_of_month(transaction.date)))
            .or_default() += transaction.amount.abs();
    }

    let categories_by_id: HashMap<CategoryId, &Category> = categories
        .iter()
        .map(|category| (category.id, category))
        .collect();

    budgets
        .iter()
        .filter_map(|budget| {
            let category = categories_by_id.get(&budget.category_id)?;
            let spent = spent_by_month
                .get(&(budget.category_id, budget.month))
                .copied()
                .unwrap_or(0.0);

            Some(BudgetUtilization {
                budget: budget.clone(),
                category: (*category).clone(),
                spent,
                remaining: budget.limit - spent,
                percent_used: percent_of(spent, budget.limit),
                status: BudgetStatus::classify(spent, budget.limit),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        auth::UserID,
        budget::{Budget, BudgetStatus},
        category::{Category, CategoryName},
        color::Color,
        transaction::Transaction,
    };

    use super::calculate_utilization;

    fn category(id: i64, name: &str) -> Category {
        Category {
            id,
            user_id: UserID::new(1),
            name: CategoryName::new_unchecked(name),
            color: Color::default(),
        }
    }

    fn budget(id: i64, category_id: i64, limit: f64) -> Budget {
        Budget {
            id,
            user_id: UserID::new(1),
            category_id,
            month: date!(2025 - 03 - 01),
            limit,
        }
    }

    fn transaction(category_id: i64, amount: f64, date: time::Date) -> Transaction {
        Transaction {
            id: 0,
            user_id: UserID::new(1),
            wallet_id: 1,
            category_id,
            amount,
            date,
            description: String::new(),
        }
    }

    #[test]
    fn classify_thresholds() {
        assert_eq!(BudgetStatus::classify(0.0, 100.0), BudgetStatus::UnderBudget);
        assert_eq!(BudgetStatus::classify(79.99, 100.0), BudgetStatus::UnderBudget);
        assert_eq!(BudgetStatus::classify(80.0, 100.0), BudgetStatus::NearLimit);
        assert_eq!(BudgetStatus::classify(100.0, 100.0), BudgetStatus::NearLimit);
        assert_eq!(BudgetStatus::classify(100.01, 100.0), BudgetStatus::OverBudget);
    }

    #[test]
    fn sums_expenses_in_category_and_month() {
        let budgets = [budget(1, 10, 200.0), budget(2, 20, 50.0)];
        let categories = [category(10, "Food"), category(20, "Transport")];
        let transactions = [
            transaction(10, -120.0, date!(2025 - 03 - 02)),
            transaction(10, -40.0, date!(2025 - 03 - 31)),
            // Income, other months and other categories do not count.
            transaction(10, 500.0, date!(2025 - 03 - 15)),
            transaction(10, -99.0, date!(2025 - 04 - 01)),
            transaction(30, -99.0, date!(2025 - 03 - 10)),
            transaction(20, -60.0, date!(2025 - 03 - 10)),
        ];

        let got = calculate_utilization(&budgets, &categories, &transactions);

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].category.name.as_ref(), "Food");
        assert_eq!(got[0].spent, 160.0);
        assert_eq!(got[0].remaining, 40.0);
        assert_eq!(got[0].percent_used, 80.0);
        assert_eq!(got[0].status, BudgetStatus::NearLimit);
        assert_eq!(got[1].spent, 60.0);
        assert_eq!(got[1].remaining, -10.0);
        assert_eq!(got[1].status, BudgetStatus::OverBudget);
    }

    #[test]
    fn budget_without_spending_is_unused() {
        let got = calculate_utilization(&[budget(1, 10, 200.0)], &[category(10, "Food")], &[]);

        assert_eq!(got[0].spent, 0.0);
        assert_eq!(got[0].percent_used, 0.0);
        assert_eq!(got[0].status, BudgetStatus::UnderBudget);
    }
}
