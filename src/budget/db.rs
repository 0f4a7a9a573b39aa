//! Database operations for budgets.

use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error,
    auth::UserID,
    budget::{Budget, BudgetId},
    category::{CategoryId, get_category},
    db::is_unique_violation,
    month::start_of_month,
    transaction::validate_amount,
};

/// Create the budget table in the database.
///
/// Budgets are deleted along with their category.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
            month TEXT NOT NULL,
            limit_amount REAL NOT NULL,
            UNIQUE(user_id, category_id, month)
        );

        CREATE INDEX IF NOT EXISTS idx_budget_user_month ON budget(user_id, month);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        month: row.get(3)?,
        limit: row.get(4)?,
    })
}

/// Create a budget for the month containing `month`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `limit` is not greater than zero,
/// - [Error::InvalidCategory] if the category does not belong to `user_id`,
/// - [Error::DuplicateBudget] if the category already has a budget for the month,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_budget(
    user_id: UserID,
    category_id: CategoryId,
    month: Date,
    limit: f64,
    connection: &Connection,
) -> Result<Budget, Error> {
    let limit = validate_amount(limit)?;
    let month = start_of_month(month);

    match get_category(category_id, user_id, connection) {
        Ok(_) => {}
        Err(Error::NotFound) => return Err(Error::InvalidCategory(category_id)),
        Err(error) => return Err(error),
    }

    connection
        .execute(
            "INSERT INTO budget (user_id, category_id, month, limit_amount) VALUES (?1, ?2, ?3, ?4)",
            (user_id.as_i64(), category_id, month, limit),
        )
        .map_err(|error| {
            if is_unique_violation(&error) {
                Error::DuplicateBudget
            } else {
                error.into()
            }
        })?;

    Ok(Budget {
        id: connection.last_insert_rowid(),
        user_id,
        category_id,
        month,
        limit,
    })
}

/// Retrieve one of the user's budgets.
///
/// # Errors
/// Returns [Error::NotFound] if the user has no budget with `budget_id`.
pub fn get_budget(
    budget_id: BudgetId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category_id, month, limit_amount
             FROM budget WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((budget_id, user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve the user's budgets for the month containing `month`, ordered by category name.
pub fn get_budgets_for_month(
    user_id: UserID,
    month: Date,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(
            "SELECT b.id, b.user_id, b.category_id, b.month, b.limit_amount
             FROM budget b
             INNER JOIN category c ON c.id = b.category_id
             WHERE b.user_id = ?1 AND b.month = ?2
             ORDER BY c.name ASC",
        )?
        .query_map((user_id.as_i64(), start_of_month(month)), map_row)?
        .map(|budget| budget.map_err(Error::from))
        .collect()
}

/// Change the limit of a budget. The category and month cannot be changed.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `limit` is not greater than zero,
/// - [Error::UpdateMissingBudget] if the user has no budget with `budget_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_budget(
    budget_id: BudgetId,
    user_id: UserID,
    limit: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let limit = validate_amount(limit)?;

    let rows_affected = connection.execute(
        "UPDATE budget SET limit_amount = ?1 WHERE id = ?2 AND user_id = ?3",
        (limit, budget_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingBudget);
    }

    Ok(())
}

/// Delete one of the user's budgets.
///
/// # Errors
/// Returns [Error::DeleteMissingBudget] if the user has no budget with `budget_id`.
pub fn delete_budget(
    budget_id: BudgetId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (budget_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}
