//! Pure aggregation functions over an in-memory list of transactions.
//!
//! Every function here takes the transactions already loaded for a date range
//! and does a single pass over them, so the same list can feed the summary
//! cards, the charts and the tables of a report.

use std::collections::HashMap;

use time::Date;

use crate::{
    color::Color,
    month::{months_in_range, start_of_month},
    transaction::TransactionType,
};

/// The fields of a transaction a report needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTransaction {
    /// Positive for income, negative for expenses.
    pub amount: f64,
    pub date: Date,
    pub category_name: String,
    pub category_color: Color,
    pub wallet_name: String,
}

/// Totals over a set of transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub income: f64,
    /// The sum of expense magnitudes.
    pub expenses: f64,
    /// `income - expenses`.
    pub net: f64,
    pub transaction_count: usize,
    /// The share of income that was not spent, as a percentage.
    ///
    /// `None` when there was no income.
    pub savings_rate: Option<f64>,
}

/// The total for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub color: Color,
    /// The sum of magnitudes, always positive.
    pub total: f64,
    /// The share of the grand total for the transaction type, as a percentage.
    pub percent: f64,
}

/// Income and expenses for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket {
    /// The first day of the month.
    pub month: Date,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

/// Money in and out of one wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletTotal {
    pub name: String,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

pub fn summarize(transactions: &[ReportTransaction]) -> Summary {
    let (income, expenses) =
        transactions
            .iter()
            .fold((0.0, 0.0), |(income, expenses), transaction| {
                if transaction.amount > 0.0 {
                    (income + transaction.amount, expenses)
                } else {
                    (income, expenses - transaction.amount)
                }
            });
    let net = income - expenses;

    Summary {
        income,
        expenses,
        net,
        transaction_count: transactions.len(),
        savings_rate: (income > 0.0).then(|| net / income * 100.0),
    }
}

/// Total the transactions of `transaction_type` per category.
///
/// Sorted by total, largest first, with ties broken by name.
pub fn group_by_category(
    transactions: &[ReportTransaction],
    transaction_type: TransactionType,
) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, (&Color, f64)> = HashMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| TransactionType::of(transaction.amount) == transaction_type)
    {
        let entry = totals
            .entry(&transaction.category_name)
            .or_insert((&transaction.category_color, 0.0));
        entry.1 += transaction.amount.abs();
    }

    let grand_total: f64 = totals.values().map(|(_, total)| total).sum();

    let mut grouped = totals
        .into_iter()
        .map(|(name, (color, total))| CategoryTotal {
            name: name.to_owned(),
            color: color.clone(),
            total,
            percent: if grand_total > 0.0 {
                total / grand_total * 100.0
            } else {
                0.0
            },
        })
        .collect::<Vec<_>>();

    grouped.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    grouped
}

/// Income and expenses for every month overlapping `from..=to`.
///
/// Months without transactions are included with zero totals. Transactions
/// outside the range are ignored.
pub fn monthly_trend(transactions: &[ReportTransaction], from: Date, to: Date) -> Vec<MonthBucket> {
    let mut buckets = months_in_range(from, to)
        .into_iter()
        .map(|month| MonthBucket {
            month,
            income: 0.0,
            expenses: 0.0,
            net: 0.0,
        })
        .collect::<Vec<_>>();

    let index_by_month: HashMap<Date, usize> = buckets
        .iter()
        .enumerate()
        .map(|(index, bucket)| (bucket.month, index))
        .collect();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.date >= from && transaction.date <= to)
    {
        let Some(&index) = index_by_month.get(&start_of_month(transaction.date)) else {
            continue;
        };
        let bucket = &mut buckets[index];

        if transaction.amount > 0.0 {
            bucket.income += transaction.amount;
        } else {
            bucket.expenses -= transaction.amount;
        }

        bucket.net += transaction.amount;
    }

    buckets
}

/// The net flow of each wallet, sorted by wallet name.
pub fn group_by_wallet(transactions: &[ReportTransaction]) -> Vec<WalletTotal> {
    let mut totals: HashMap<&str, WalletTotal> = HashMap::new();

    for transaction in transactions {
        let total = totals
            .entry(&transaction.wallet_name)
            .or_insert_with(|| WalletTotal {
                name: transaction.wallet_name.clone(),
                income: 0.0,
                expenses: 0.0,
                net: 0.0,
            });

        if transaction.amount > 0.0 {
            total.income += transaction.amount;
        } else {
            total.expenses -= transaction.amount;
        }

        total.net += transaction.amount;
    }

    let mut grouped = totals.into_values().collect::<Vec<_>>();
    grouped.sort_by(|a, b| a.name.cmp(&b.name));

    grouped
}

#[cfg(test)]
mod tests {
    use time::{Date, macros::date};

    use crate::{color::Color, transaction::TransactionType};

    use super::{
        ReportTransaction, group_by_category, group_by_wallet, monthly_trend, summarize,
    };

    fn transaction(amount: f64, date: Date, category: &str, wallet: &str) -> ReportTransaction {
        ReportTransaction {
            amount,
            date,
            category_name: category.to_owned(),
            category_color: Color::default(),
            wallet_name: wallet.to_owned(),
        }
    }

    fn sample() -> Vec<ReportTransaction> {
        vec![
            transaction(3000.0, date!(2025 - 01 - 25), "Salary", "Bank"),
            transaction(-150.0, date!(2025 - 01 - 03), "Food", "Cash"),
            transaction(-50.0, date!(2025 - 01 - 20), "Transport", "Bank"),
            transaction(-250.0, date!(2025 - 03 - 02), "Food", "Bank"),
            transaction(-50.0, date!(2025 - 03 - 09), "Bills", "Bank"),
        ]
    }

    #[test]
    fn summarize_totals_and_savings_rate() {
        let summary = summarize(&sample());

        assert_eq!(summary.income, 3000.0);
        assert_eq!(summary.expenses, 500.0);
        assert_eq!(summary.net, 2500.0);
        assert_eq!(summary.transaction_count, 5);
        let savings_rate = summary.savings_rate.expect("want a savings rate");
        assert!((savings_rate - 83.333).abs() < 0.001, "got {savings_rate}");
    }

    #[test]
    fn summarize_without_income_has_no_savings_rate() {
        let summary = summarize(&[transaction(-10.0, date!(2025 - 01 - 01), "Food", "Cash")]);

        assert_eq!(summary.savings_rate, None);
        assert_eq!(summary.net, -10.0);
        assert_eq!(summarize(&[]).savings_rate, None);
    }

    #[test]
    fn group_by_category_sorts_and_computes_percent() {
        let totals = group_by_category(&sample(), TransactionType::Expense);

        let got = totals
            .iter()
            .map(|total| (total.name.as_str(), total.total, total.percent))
            .collect::<Vec<_>>();
        assert_eq!(
            got,
            [
                ("Food", 400.0, 80.0),
                ("Bills", 50.0, 10.0),
                ("Transport", 50.0, 10.0),
            ]
        );
    }

    #[test]
    fn group_by_category_for_income() {
        let totals = group_by_category(&sample(), TransactionType::Income);

        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].name, "Salary");
        assert_eq!(totals[0].percent, 100.0);
    }

    #[test]
    fn monthly_trend_fills_empty_months() {
        let buckets = monthly_trend(&sample(), date!(2025 - 01 - 01), date!(2025 - 03 - 31));

        let got = buckets
            .iter()
            .map(|bucket| (bucket.month, bucket.income, bucket.expenses, bucket.net))
            .collect::<Vec<_>>();
        assert_eq!(
            got,
            [
                (date!(2025 - 01 - 01), 3000.0, 200.0, 2800.0),
                (date!(2025 - 02 - 01), 0.0, 0.0, 0.0),
                (date!(2025 - 03 - 01), 0.0, 300.0, -300.0),
            ]
        );
    }

    #[test]
    fn monthly_trend_ignores_transactions_outside_range() {
        let buckets = monthly_trend(&sample(), date!(2025 - 01 - 10), date!(2025 - 02 - 28));

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].expenses, 50.0);
        assert_eq!(buckets[0].income, 3000.0);
    }

    #[test]
    fn group_by_wallet_nets_each_wallet() {
        let totals = group_by_wallet(&sample());

        let got = totals
            .iter()
            .map(|total| (total.name.as_str(), total.income, total.expenses, total.net))
            .collect::<Vec<_>>();
        assert_eq!(
            got,
            [
                ("Bank", 3000.0, 350.0, 2650.0),
                ("Cash", 0.0, 150.0, -150.0)
            ]
        );
    }
}
