//! Database operations for transactions.
//!
//! Every write also moves the affected wallet balances. The row and the
//! balances change together inside one SQL transaction, or not at all.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::UserID,
    category::{CategoryId, get_category},
    transaction::{Transaction, TransactionBuilder, TransactionId},
    wallet::{WalletId, apply_wallet_delta, get_wallet},
};

/// Create the transaction table in the database.
///
/// Wallets and categories cannot be deleted while a transaction refers to them.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            wallet_id INTEGER NOT NULL REFERENCES wallet(id),
            category_id INTEGER NOT NULL REFERENCES category(id),
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_transaction_wallet ON \"transaction\"(wallet_id);
        CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        wallet_id: row.get(2)?,
        category_id: row.get(3)?,
        amount: row.get(4)?,
        date: row.get(5)?,
        description: row.get(6)?,
    })
}

fn ensure_wallet_owned(
    wallet_id: WalletId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match get_wallet(wallet_id, user_id, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::InvalidWallet(wallet_id)),
        Err(error) => Err(error),
    }
}

fn ensure_category_owned(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match get_category(category_id, user_id, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::InvalidCategory(category_id)),
        Err(error) => Err(error),
    }
}

/// Record a transaction and add its amount to the wallet balance.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidWallet] if the wallet does not belong to `user_id`,
/// - [Error::InvalidCategory] if the category does not belong to `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
///
/// Nothing is written if an error is returned.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    ensure_wallet_owned(builder.wallet_id, user_id, &sql_transaction)?;
    ensure_category_owned(builder.category_id, user_id, &sql_transaction)?;

    let transaction = sql_transaction
        .prepare(
            "INSERT INTO \"transaction\" (user_id, wallet_id, category_id, amount, date, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, user_id, wallet_id, category_id, amount, date, description",
        )?
        .query_row(
            (
                user_id.as_i64(),
                builder.wallet_id,
                builder.category_id,
                builder.amount,
                builder.date,
                &builder.description,
            ),
            map_transaction_row,
        )?;

    apply_wallet_delta(builder.wallet_id, user_id, builder.amount, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(transaction)
}

/// Retrieve one of the user's transactions by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, user_id, wallet_id, category_id, amount, date, description
             FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .map_err(|error| error.into())
}

/// Rewrite a transaction and move the wallet balances to match.
///
/// The old amount is taken off the old wallet before the new amount is added
/// to the new wallet, so moving a transaction between wallets works.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to one of the user's transactions,
/// - [Error::InvalidWallet] or [Error::InvalidCategory] if the new wallet or
///   category does not belong to `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let old = match get_transaction(id, user_id, &sql_transaction) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => return Err(Error::UpdateMissingTransaction),
        Err(error) => return Err(error),
    };

    ensure_wallet_owned(builder.wallet_id, user_id, &sql_transaction)?;
    ensure_category_owned(builder.category_id, user_id, &sql_transaction)?;

    apply_wallet_delta(old.wallet_id, user_id, -old.amount, &sql_transaction)?;
    apply_wallet_delta(builder.wallet_id, user_id, builder.amount, &sql_transaction)?;

    sql_transaction.execute(
        "UPDATE \"transaction\"
         SET wallet_id = ?1, category_id = ?2, amount = ?3, date = ?4, description = ?5
         WHERE id = ?6 AND user_id = ?7",
        (
            builder.wallet_id,
            builder.category_id,
            builder.amount,
            builder.date,
            &builder.description,
            id,
            user_id.as_i64(),
        ),
    )?;

    sql_transaction.commit()?;

    Ok(Transaction {
        id,
        user_id,
        wallet_id: builder.wallet_id,
        category_id: builder.category_id,
        amount: builder.amount,
        date: builder.date,
        description: builder.description,
    })
}

/// Delete a transaction and take its amount back off the wallet balance.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let old = match get_transaction(id, user_id, &sql_transaction) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => return Err(Error::DeleteMissingTransaction),
        Err(error) => return Err(error),
    };

    apply_wallet_delta(old.wallet_id, user_id, -old.amount, &sql_transaction)?;

    sql_transaction.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    sql_transaction.commit()?;

    Ok(())
}
