//! Core wallet domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::UserID, color::Color};

/// Database identifier for a wallet.
pub type WalletId = i64;

/// Where the money in a wallet is held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// A bank account.
    #[default]
    Bank,
    /// A mobile payment or stored value wallet.
    EWallet,
}

impl WalletKind {
    /// All wallet kinds in display order.
    pub const ALL: [WalletKind; 2] = [WalletKind::Bank, WalletKind::EWallet];

    /// The value used in forms and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::Bank => "bank",
            WalletKind::EWallet => "ewallet",
        }
    }

    /// The human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            WalletKind::Bank => "Bank",
            WalletKind::EWallet => "E-Wallet",
        }
    }
}

impl FromStr for WalletKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank" => Ok(WalletKind::Bank),
            "ewallet" => Ok(WalletKind::EWallet),
            other => Err(format!("unknown wallet kind \"{other}\"")),
        }
    }
}

impl ToSql for WalletKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for WalletKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A validated, non-empty wallet name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct WalletName(String);

impl WalletName {
    /// Create a wallet name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyWalletName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyWalletName)
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a wallet name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for WalletName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for WalletName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named place where the user keeps money, e.g. a bank account.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: UserID,
    pub name: WalletName,
    pub kind: WalletKind,
    /// The current balance, kept in step with the wallet's transactions.
    pub balance: f64,
    pub color: Color,
}

/// Check that `balance` can be stored as a wallet balance.
///
/// Zero and negative balances are allowed, e.g. an overdrawn account.
///
/// # Errors
///
/// Returns [Error::InvalidBalance] if `balance` is infinite or NaN.
pub fn validate_balance(balance: f64) -> Result<f64, Error> {
    if balance.is_finite() {
        Ok(balance)
    } else {
        Err(Error::InvalidBalance(balance))
    }
}

/// Form data for wallet creation and editing.
#[derive(Debug, Serialize, Deserialize)]
pub struct WalletFormData {
    pub name: String,
    pub kind: WalletKind,
    /// The opening balance when creating, or a manual correction when editing.
    pub balance: f64,
    pub color: String,
}
