//! Database operations for categories.

use std::collections::HashMap;

use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryId, CategoryName},
    color::Color,
    db::{is_foreign_key_violation, is_unique_violation},
};

/// The categories every new user starts with, and their colors.
pub const DEFAULT_CATEGORIES: [(&str, &str); 6] = [
    ("Food", "#f97316"),
    ("Transport", "#0ea5e9"),
    ("Bills", "#ef4444"),
    ("Shopping", "#a855f7"),
    ("Salary", "#22c55e"),
    ("Other", "#6b7280"),
];

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            color TEXT NOT NULL,
            UNIQUE(user_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_category_user ON category(user_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: CategoryName::new_unchecked(&raw_name),
        color: row.get(3)?,
    })
}

fn duplicate_name_or(error: rusqlite::Error, name: &CategoryName) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateCategoryName(name.to_string())
    } else {
        error.into()
    }
}

/// Create a category and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateCategoryName] if the user already has a category called `name`.
pub fn create_category(
    user_id: UserID,
    name: CategoryName,
    color: Color,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .execute(
            "INSERT INTO category (user_id, name, color) VALUES (?1, ?2, ?3)",
            (user_id.as_i64(), name.as_ref(), &color),
        )
        .map_err(|error| duplicate_name_or(error, &name))?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        user_id,
        name,
        color,
    })
}

/// Give a newly registered user the [DEFAULT_CATEGORIES].
pub fn seed_default_categories(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    for (name, color) in DEFAULT_CATEGORIES {
        create_category(
            user_id,
            CategoryName::new_unchecked(name),
            Color::new_unchecked(color),
            connection,
        )?;
    }

    Ok(())
}

/// Retrieve a single category owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the category does not exist or belongs to someone else.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, user_id, name, color FROM category WHERE id = ?1 AND user_id = ?2")?
        .query_row((category_id, user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve all of the user's categories ordered alphabetically by name.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, color FROM category WHERE user_id = ?1 ORDER BY name ASC",
        )?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Replace the name and color of a category.
///
/// # Errors
///
/// Returns:
/// - [Error::UpdateMissingCategory] if the user has no category with the ID,
/// - [Error::DuplicateCategoryName] if another of the user's categories has the name.
pub fn update_category(category: &Category, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "UPDATE category SET name = ?1, color = ?2 WHERE id = ?3 AND user_id = ?4",
            (
                category.name.as_ref(),
                &category.color,
                category.id,
                category.user_id.as_i64(),
            ),
        )
        .map_err(|error| duplicate_name_or(error, &category.name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category and its budgets.
///
/// # Errors
///
/// Returns:
/// - [Error::CategoryInUse] if any transaction still uses the category,
/// - [Error::DeleteMissingCategory] if the user has no category with `category_id`.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
            (category_id, user_id.as_i64()),
        )
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                Error::CategoryInUse
            } else {
                error.into()
            }
        })?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Count the user's transactions in each category.
///
/// Categories without transactions are absent from the map.
pub fn count_transactions_per_category(
    user_id: UserID,
    connection: &Connection,
) -> Result<HashMap<CategoryId, u32>, Error> {
    connection
        .prepare(
            "SELECT category_id, COUNT(1) FROM \"transaction\"
            WHERE user_id = ?1 GROUP BY category_id",
        )?
        .query_map([user_id.as_i64()], |row| Ok((row.get(0)?, row.get(1)?)))?
        .map(|maybe_count| maybe_count.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod category_query_tests {
    use crate::{
        Error,
        category::{Category, CategoryName},
        color::Color,
        test_utils::{create_test_user, get_test_connection},
    };

    use super::{
        DEFAULT_CATEGORIES, count_transactions_per_category, create_category, delete_category,
        get_categories, get_category, seed_default_categories, update_category,
    };

    #[test]
    fn create_and_get_category() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);

        let category = create_category(
            user_id,
            CategoryName::new_unchecked("Groceries"),
            Color::default(),
            &connection,
        )
        .expect("Could not create category");

        assert!(category.id > 0);
        assert_eq!(get_category(category.id, user_id, &connection), Ok(category));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        let name = CategoryName::new_unchecked("Groceries");
        create_category(user_id, name.clone(), Color::default(), &connection).unwrap();

        let result = create_category(user_id, name, Color::default(), &connection);

        assert_eq!(
            result,
            Err(Error::DuplicateCategoryName("Groceries".to_owned()))
        );
    }

    #[test]
    fn seed_creates_defaults_in_name_order() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);

        seed_default_categories(user_id, &connection).unwrap();

        let categories = get_categories(user_id, &connection).unwrap();
        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
        let names = categories
            .iter()
            .map(|category| category.name.as_ref())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["Bills", "Food", "Other", "Salary", "Shopping", "Transport"]
        );
    }

    #[test]
    fn categories_are_private_to_their_owner() {
        let connection = get_test_connection();
        let owner = create_test_user("owner@bar.baz", &connection);
        let intruder = create_test_user("intruder@bar.baz", &connection);
        let category = create_category(
            owner,
            CategoryName::new_unchecked("Rent"),
            Color::default(),
            &connection,
        )
        .unwrap();

        assert_eq!(
            get_category(category.id, intruder, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(get_categories(intruder, &connection), Ok(vec![]));
        assert_eq!(
            delete_category(category.id, intruder, &connection),
            Err(Error::DeleteMissingCategory)
        );
    }

    #[test]
    fn update_category_succeeds() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        let category = create_category(
            user_id,
            CategoryName::new_unchecked("Original"),
            Color::default(),
            &connection,
        )
        .unwrap();
        let updated = Category {
            name: CategoryName::new_unchecked("Updated"),
            color: Color::new_unchecked("#000000"),
            ..category
        };

        update_category(&updated, &connection).unwrap();

        assert_eq!(get_category(updated.id, user_id, &connection), Ok(updated));
    }

    #[test]
    fn update_missing_category_fails() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        let category = Category {
            id: 999,
            user_id,
            name: CategoryName::new_unchecked("Ghost"),
            color: Color::default(),
        };

        assert_eq!(
            update_category(&category, &connection),
            Err(Error::UpdateMissingCategory)
        );
    }

    #[test]
    fn delete_category_succeeds() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        let category = create_category(
            user_id,
            CategoryName::new_unchecked("ToDelete"),
            Color::default(),
            &connection,
        )
        .unwrap();

        delete_category(category.id, user_id, &connection).unwrap();

        assert_eq!(
            get_category(category.id, user_id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn count_is_empty_without_transactions() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        seed_default_categories(user_id, &connection).unwrap();

        let counts = count_transactions_per_category(user_id, &connection).unwrap();

        assert!(counts.is_empty());
    }
}
