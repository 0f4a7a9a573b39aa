//! Filtered, paginated transaction queries.

use rusqlite::{Connection, params_from_iter, types::Value};
use time::Date;

use crate::{
    Error,
    auth::UserID,
    category::{CategoryId, CategoryName},
    color::Color,
    transaction::{Transaction, TransactionId, TransactionType, db::map_transaction_row},
    wallet::{WalletId, WalletName},
};

/// Narrows down which of a user's transactions a query returns.
///
/// Each filter that is set adds one `AND` clause to the query. Date bounds are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    pub user_id: UserID,
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub wallet_id: Option<WalletId>,
    pub category_id: Option<CategoryId>,
    pub transaction_type: Option<TransactionType>,
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
}

impl TransactionFilter {
    /// A filter that matches all of the user's transactions.
    pub fn new(user_id: UserID) -> Self {
        Self {
            user_id,
            from: None,
            to: None,
            wallet_id: None,
            category_id: None,
            transaction_type: None,
            search: None,
        }
    }

    pub fn from(mut self, from: Date) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: Date) -> Self {
        self.to = Some(to);
        self
    }

    pub fn wallet(mut self, wallet_id: WalletId) -> Self {
        self.wallet_id = Some(wallet_id);
        self
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    pub fn search(mut self, search: &str) -> Self {
        self.search = Some(search.to_owned());
        self
    }

    /// Build the `WHERE` clause and its parameters.
    ///
    /// Columns are qualified with `t.`, so the query must alias the transaction table as `t`.
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses = vec!["t.user_id = ?".to_owned()];
        let mut params = vec![Value::Integer(self.user_id.as_i64())];

        if let Some(from) = self.from {
            clauses.push("t.date >= ?".to_owned());
            params.push(Value::Text(from.to_string()));
        }

        if let Some(to) = self.to {
            clauses.push("t.date <= ?".to_owned());
            params.push(Value::Text(to.to_string()));
        }

        if let Some(wallet_id) = self.wallet_id {
            clauses.push("t.wallet_id = ?".to_owned());
            params.push(Value::Integer(wallet_id));
        }

        if let Some(category_id) = self.category_id {
            clauses.push("t.category_id = ?".to_owned());
            params.push(Value::Integer(category_id));
        }

        match self.transaction_type {
            Some(TransactionType::Income) => clauses.push("t.amount > 0".to_owned()),
            Some(TransactionType::Expense) => clauses.push("t.amount < 0".to_owned()),
            None => {}
        }

        let search = self.search.as_deref().map(str::trim).unwrap_or_default();
        if !search.is_empty() {
            clauses.push("t.description LIKE ? ESCAPE '\\'".to_owned());
            params.push(Value::Text(format!("%{}%", escape_like(search))));
        }

        (clauses.join(" AND "), params)
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// Which page of results to return, counting from one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: u64,
}

impl Page {
    /// The number of rows before this page, saturating at the largest SQLite integer.
    fn offset(self) -> i64 {
        let offset = self.number.saturating_sub(1).saturating_mul(self.size);

        i64::try_from(offset).unwrap_or(i64::MAX)
    }

    fn limit(self) -> i64 {
        i64::try_from(self.size).unwrap_or(i64::MAX)
    }
}

/// A transaction joined with the names and colors of its wallet and category.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionTableRow {
    pub id: TransactionId,
    pub amount: f64,
    pub date: Date,
    pub description: String,
    pub wallet_id: WalletId,
    pub wallet_name: WalletName,
    pub wallet_color: Color,
    pub category_id: CategoryId,
    pub category_name: CategoryName,
    pub category_color: Color,
}

/// Get one page of the transactions matching `filter`, newest first.
///
/// Transactions on the same date are ordered by ID, newest first, so the order
/// is stable across pages.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn query_transactions(
    filter: &TransactionFilter,
    page: Page,
    connection: &Connection,
) -> Result<Vec<TransactionTableRow>, Error> {
    let (where_clause, mut params) = filter.where_clause();
    params.push(Value::Integer(page.limit()));
    params.push(Value::Integer(page.offset()));

    let query = format!(
        "SELECT t.id, t.amount, t.date, t.description,
            w.id, w.name, w.color, c.id, c.name, c.color
        FROM \"transaction\" t
        INNER JOIN wallet w ON w.id = t.wallet_id
        INNER JOIN category c ON c.id = t.category_id
        WHERE {where_clause}
        ORDER BY t.date DESC, t.id DESC
        LIMIT ? OFFSET ?"
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), |row| {
            let wallet_name: String = row.get(5)?;
            let category_name: String = row.get(8)?;

            Ok(TransactionTableRow {
                id: row.get(0)?,
                amount: row.get(1)?,
                date: row.get(2)?,
                description: row.get(3)?,
                wallet_id: row.get(4)?,
                wallet_name: WalletName::new_unchecked(&wallet_name),
                wallet_color: row.get(6)?,
                category_id: row.get(7)?,
                category_name: CategoryName::new_unchecked(&category_name),
                category_color: row.get(9)?,
            })
        })?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Count the transactions matching `filter`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn count_transactions(filter: &TransactionFilter, connection: &Connection) -> Result<u64, Error> {
    let (where_clause, params) = filter.where_clause();
    let query = format!("SELECT COUNT(t.id) FROM \"transaction\" t WHERE {where_clause}");

    connection
        .query_row(&query, params_from_iter(params), |row| row.get(0))
        .map_err(|error| error.into())
}

/// Get every transaction matching `filter`, oldest first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_clause, params) = filter.where_clause();
    let query = format!(
        "SELECT t.id, t.user_id, t.wallet_id, t.category_id, t.amount, t.date, t.description
        FROM \"transaction\" t
        WHERE {where_clause}
        ORDER BY t.date ASC, t.id ASC"
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_transaction_row)?
        .map(|transaction| transaction.map_err(Error::from))
        .collect()
}
