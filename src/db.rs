//! Database set up and helpers shared by the table modules.

use rusqlite::{Connection, ErrorCode, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, auth::create_user_table, budget::create_budget_table,
    category::create_category_table, transaction::create_transaction_table,
    wallet::create_wallet_table,
};

/// Create the tables for all the domain models.
///
/// Foreign key enforcement is switched on for `connection`, which SQLite
/// leaves off by default. Tables are only created if they do not already
/// exist, so this is safe to call on an existing database.
///
/// # Errors
///
/// Returns an [Error::SqlError] if any of the tables could not be created.
/// No tables are created in that case.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_wallet_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Whether `error` was caused by a UNIQUE constraint.
pub fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(sql_error, _)
            if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Whether `error` was caused by a FOREIGN KEY constraint.
pub fn is_foreign_key_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(sql_error, _)
            if sql_error.code == ErrorCode::ConstraintViolation
                && sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}
