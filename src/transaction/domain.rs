//! Core transaction domain types.

use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, auth::UserID, category::CategoryId, wallet::WalletId};

/// The format used for dates in forms and query strings, e.g. "2025-03-14".
pub const DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month repr:numerical padding:zero]-[day padding:zero]");

/// Database identifier for a transaction.
pub type TransactionId = i64;

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// The type of a signed amount. Zero counts as income.
    pub fn of(amount: f64) -> Self {
        if amount < 0.0 {
            TransactionType::Expense
        } else {
            TransactionType::Income
        }
    }

    /// Give `magnitude` the sign for this type: positive for income, negative for expenses.
    pub fn signed(self, magnitude: f64) -> f64 {
        match self {
            TransactionType::Income => magnitude.abs(),
            TransactionType::Expense => -magnitude.abs(),
        }
    }
}

/// An expense or income recorded against one wallet and one category.
///
/// `amount` is signed: income is positive and expenses are negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserID,
    pub wallet_id: WalletId,
    pub category_id: CategoryId,
    pub amount: f64,
    pub date: Date,
    pub description: String,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        wallet_id: WalletId,
        category_id: CategoryId,
        amount: f64,
        date: Date,
        description: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            wallet_id,
            category_id,
            amount,
            date,
            description: description.to_owned(),
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        TransactionType::of(self.amount)
    }
}

/// The fields needed to insert or rewrite a [Transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    /// The wallet the money moved in or out of.
    pub wallet_id: WalletId,
    pub category_id: CategoryId,
    /// Positive for income, negative for expenses. Never zero.
    pub amount: f64,
    /// When the money moved. Must not be in the future.
    pub date: Date,
    pub description: String,
}

/// Check that `magnitude` is a usable transaction or budget amount.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] unless `magnitude` is a finite number greater than zero.
pub fn validate_amount(magnitude: f64) -> Result<f64, Error> {
    if magnitude.is_finite() && magnitude > 0.0 {
        Ok(magnitude)
    } else {
        Err(Error::InvalidAmount(magnitude))
    }
}

/// The form data for creating or editing a transaction.
///
/// `amount` is always a positive magnitude, the sign comes from `type_`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionForm {
    pub type_: TransactionType,
    pub amount: f64,
    pub date: Date,
    #[serde(default)]
    pub description: String,
    pub wallet_id: WalletId,
    pub category_id: CategoryId,
}

impl TransactionForm {
    /// Validate the form against `today` and turn it into a [TransactionBuilder].
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] for a non-positive amount or
    /// [Error::FutureDate] for a date after `today`.
    pub fn into_builder(self, today: Date) -> Result<TransactionBuilder, Error> {
        let magnitude = validate_amount(self.amount)?;

        if self.date > today {
            return Err(Error::FutureDate(self.date));
        }

        Ok(Transaction::build(
            self.wallet_id,
            self.category_id,
            self.type_.signed(magnitude),
            self.date,
            self.description.trim(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::{TransactionForm, TransactionType, validate_amount};

    fn form(type_: TransactionType, amount: f64) -> TransactionForm {
        TransactionForm {
            type_,
            amount,
            date: date!(2025 - 03 - 14),
            description: " Lunch ".to_owned(),
            wallet_id: 1,
            category_id: 2,
        }
    }

    #[test]
    fn expense_is_negative() {
        let builder = form(TransactionType::Expense, 12.5)
            .into_builder(date!(2025 - 03 - 14))
            .unwrap();

        assert_eq!(builder.amount, -12.5);
        assert_eq!(builder.description, "Lunch");
    }

    #[test]
    fn income_is_positive() {
        let builder = form(TransactionType::Income, 1000.0)
            .into_builder(date!(2025 - 03 - 20))
            .unwrap();

        assert_eq!(builder.amount, 1000.0);
    }

    #[test]
    fn future_date_is_rejected() {
        let result = form(TransactionType::Expense, 1.0).into_builder(date!(2025 - 03 - 13));

        assert_eq!(result, Err(Error::FutureDate(date!(2025 - 03 - 14))));
    }

    #[test]
    fn amount_must_be_positive() {
        assert_eq!(validate_amount(0.0), Err(Error::InvalidAmount(0.0)));
        assert_eq!(validate_amount(-3.0), Err(Error::InvalidAmount(-3.0)));
        assert!(validate_amount(f64::NAN).is_err());
        assert_eq!(validate_amount(0.01), Ok(0.01));
    }

    #[test]
    fn type_of_signed_amount() {
        assert_eq!(TransactionType::of(-0.5), TransactionType::Expense);
        assert_eq!(TransactionType::of(0.5), TransactionType::Income);
    }
}
