//! Database operations for wallets.
//!
//! Every query is scoped to a user, so one user can never read or change
//! another user's wallets.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::UserID,
    color::Color,
    db::{is_foreign_key_violation, is_unique_violation},
    wallet::{Wallet, WalletId, WalletKind, WalletName, domain::validate_balance},
};

/// Initialize the wallet table and indexes.
pub fn create_wallet_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS wallet (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            balance REAL NOT NULL,
            color TEXT NOT NULL,
            UNIQUE(user_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_wallet_user ON wallet(user_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Wallet, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(Wallet {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: WalletName::new_unchecked(&raw_name),
        kind: row.get(3)?,
        balance: row.get(4)?,
        color: row.get(5)?,
    })
}

/// Create a wallet with an opening `balance` and return it with its generated ID.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidBalance] if `balance` is infinite or NaN,
/// - [Error::DuplicateWalletName] if the user already has a wallet called `name`.
pub fn create_wallet(
    user_id: UserID,
    name: WalletName,
    kind: WalletKind,
    balance: f64,
    color: Color,
    connection: &Connection,
) -> Result<Wallet, Error> {
    let balance = validate_balance(balance)?;

    connection
        .execute(
            "INSERT INTO wallet (user_id, name, kind, balance, color) VALUES (?1, ?2, ?3, ?4, ?5)",
            (user_id.as_i64(), name.as_ref(), kind, balance, &color),
        )
        .map_err(|error| duplicate_name_or(error, &name))?;

    Ok(Wallet {
        id: connection.last_insert_rowid(),
        user_id,
        name,
        kind,
        balance,
        color,
    })
}

fn duplicate_name_or(error: rusqlite::Error, name: &WalletName) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateWalletName(name.to_string())
    } else {
        error.into()
    }
}

/// Retrieve a single wallet owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the wallet does not exist or belongs to someone else.
pub fn get_wallet(
    wallet_id: WalletId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Wallet, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind, balance, color FROM wallet
            WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((wallet_id, user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve all of the user's wallets ordered alphabetically by name.
pub fn get_wallets(user_id: UserID, connection: &Connection) -> Result<Vec<Wallet>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind, balance, color FROM wallet
            WHERE user_id = ?1 ORDER BY name ASC",
        )?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_wallet| maybe_wallet.map_err(|error| error.into()))
        .collect()
}

/// Replace the name, kind, balance and color of a wallet.
///
/// Setting the balance here is a manual correction, it does not touch any
/// transactions.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidBalance] if the new balance is infinite or NaN,
/// - [Error::UpdateMissingWallet] if the user has no wallet with `wallet_id`,
/// - [Error::DuplicateWalletName] if another of the user's wallets is called `name`.
pub fn update_wallet(
    wallet: &Wallet,
    connection: &Connection,
) -> Result<(), Error> {
    validate_balance(wallet.balance)?;

    let rows_affected = connection
        .execute(
            "UPDATE wallet SET name = ?1, kind = ?2, balance = ?3, color = ?4
            WHERE id = ?5 AND user_id = ?6",
            (
                wallet.name.as_ref(),
                wallet.kind,
                wallet.balance,
                &wallet.color,
                wallet.id,
                wallet.user_id.as_i64(),
            ),
        )
        .map_err(|error| duplicate_name_or(error, &wallet.name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingWallet);
    }

    Ok(())
}

/// Delete a wallet that has no transactions.
///
/// # Errors
///
/// Returns:
/// - [Error::WalletInUse] if any transaction still refers to the wallet,
/// - [Error::DeleteMissingWallet] if the user has no wallet with `wallet_id`.
pub fn delete_wallet(
    wallet_id: WalletId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "DELETE FROM wallet WHERE id = ?1 AND user_id = ?2",
            (wallet_id, user_id.as_i64()),
        )
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                Error::WalletInUse
            } else {
                error.into()
            }
        })?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingWallet);
    }

    Ok(())
}

/// Get the total balance across all of the user's wallets.
pub fn get_total_balance(user_id: UserID, connection: &Connection) -> Result<f64, Error> {
    let total = connection
        .prepare("SELECT COALESCE(SUM(balance), 0) FROM wallet WHERE user_id = ?1")?
        .query_row([user_id.as_i64()], |row| row.get(0))?;

    Ok(total)
}

/// Add `delta` to a wallet's balance.
///
/// Only call this inside the SQL transaction that writes the matching
/// transaction row, so the balance and the rows can never disagree.
///
/// # Errors
///
/// Returns [Error::InvalidWallet] if the user has no wallet with `wallet_id`.
pub(crate) fn apply_wallet_delta(
    wallet_id: WalletId,
    user_id: UserID,
    delta: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE wallet SET balance = balance + ?1 WHERE id = ?2 AND user_id = ?3",
        (delta, wallet_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::InvalidWallet(wallet_id));
    }

    Ok(())
}

#[cfg(test)]
mod wallet_query_tests {
    use crate::{
        Error,
        color::Color,
        test_utils::{create_test_user, get_test_connection},
        wallet::{Wallet, WalletKind, WalletName},
    };

    use super::{
        apply_wallet_delta, create_wallet, delete_wallet, get_total_balance, get_wallet,
        get_wallets, update_wallet,
    };

    #[test]
    fn create_and_get_wallet() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);

        let wallet = create_wallet(
            user_id,
            WalletName::new_unchecked("Everyday"),
            WalletKind::Bank,
            150.0,
            Color::default(),
            &connection,
        )
        .expect("Could not create wallet");

        assert!(wallet.id > 0);
        assert_eq!(get_wallet(wallet.id, user_id, &connection), Ok(wallet));
    }

    #[test]
    fn duplicate_name_is_rejected_per_user() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        let other_user_id = create_test_user("other@bar.baz", &connection);
        let name = WalletName::new_unchecked("Everyday");
        create_wallet(
            user_id,
            name.clone(),
            WalletKind::Bank,
            0.0,
            Color::default(),
            &connection,
        )
        .unwrap();

        let duplicate = create_wallet(
            user_id,
            name.clone(),
            WalletKind::EWallet,
            0.0,
            Color::default(),
            &connection,
        );
        let other_users = create_wallet(
            other_user_id,
            name,
            WalletKind::Bank,
            0.0,
            Color::default(),
            &connection,
        );

        assert_eq!(
            duplicate,
            Err(Error::DuplicateWalletName("Everyday".to_owned()))
        );
        assert!(other_users.is_ok());
    }

    #[test]
    fn wallets_are_private_to_their_owner() {
        let connection = get_test_connection();
        let owner = create_test_user("owner@bar.baz", &connection);
        let intruder = create_test_user("intruder@bar.baz", &connection);
        let wallet = create_wallet(
            owner,
            WalletName::new_unchecked("Savings"),
            WalletKind::Bank,
            1000.0,
            Color::default(),
            &connection,
        )
        .unwrap();

        assert_eq!(
            get_wallet(wallet.id, intruder, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(get_wallets(intruder, &connection), Ok(vec![]));
        assert_eq!(
            delete_wallet(wallet.id, intruder, &connection),
            Err(Error::DeleteMissingWallet)
        );
        let mut stolen = wallet.clone();
        stolen.user_id = intruder;
        assert_eq!(
            update_wallet(&stolen, &connection),
            Err(Error::UpdateMissingWallet)
        );
    }

    #[test]
    fn get_wallets_orders_by_name() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        for name in ["Savings", "Cash App", "Everyday"] {
            create_wallet(
                user_id,
                WalletName::new_unchecked(name),
                WalletKind::Bank,
                0.0,
                Color::default(),
                &connection,
            )
            .unwrap();
        }

        let names = get_wallets(user_id, &connection)
            .unwrap()
            .into_iter()
            .map(|wallet| wallet.name.to_string())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["Cash App", "Everyday", "Savings"]);
    }

    #[test]
    fn update_wallet_replaces_fields() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        let mut wallet = create_wallet(
            user_id,
            WalletName::new_unchecked("Everyday"),
            WalletKind::Bank,
            10.0,
            Color::default(),
            &connection,
        )
        .unwrap();
        wallet.name = WalletName::new_unchecked("GoPay");
        wallet.kind = WalletKind::EWallet;
        wallet.balance = 42.5;
        wallet.color = Color::new_unchecked("#ff0000");

        update_wallet(&wallet, &connection).unwrap();

        assert_eq!(get_wallet(wallet.id, user_id, &connection), Ok(wallet));
    }

    #[test]
    fn create_rejects_non_finite_balance() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);

        for balance in [f64::INFINITY, f64::NAN] {
            let result = create_wallet(
                user_id,
                WalletName::new_unchecked("Broken"),
                WalletKind::Bank,
                balance,
                Color::default(),
                &connection,
            );

            assert!(
                matches!(result, Err(Error::InvalidBalance(_))),
                "got {result:?} for {balance}"
            );
        }

        assert_eq!(get_wallets(user_id, &connection), Ok(vec![]));
        assert_eq!(get_total_balance(user_id, &connection), Ok(0.0));
    }

    #[test]
    fn update_rejects_non_finite_balance() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        let wallet = create_wallet(
            user_id,
            WalletName::new_unchecked("Everyday"),
            WalletKind::Bank,
            10.0,
            Color::default(),
            &connection,
        )
        .unwrap();

        for balance in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let broken = Wallet {
                balance,
                ..wallet.clone()
            };

            let result = update_wallet(&broken, &connection);

            assert!(
                matches!(result, Err(Error::InvalidBalance(_))),
                "got {result:?} for {balance}"
            );
        }

        assert_eq!(get_total_balance(user_id, &connection), Ok(10.0));
    }

    #[test]
    fn total_balance_sums_only_the_users_wallets() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        let other_user_id = create_test_user("other@bar.baz", &connection);
        for (owner, balance) in [(user_id, 100.5), (user_id, -20.25), (other_user_id, 999.0)] {
            create_wallet(
                owner,
                WalletName::new_unchecked(&format!("Wallet {balance}")),
                WalletKind::Bank,
                balance,
                Color::default(),
                &connection,
            )
            .unwrap();
        }

        assert_eq!(get_total_balance(user_id, &connection), Ok(80.25));
        assert_eq!(
            get_total_balance(create_test_user("new@bar.baz", &connection), &connection),
            Ok(0.0)
        );
    }

    #[test]
    fn apply_delta_adjusts_balance() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        let wallet = create_wallet(
            user_id,
            WalletName::new_unchecked("Everyday"),
            WalletKind::Bank,
            100.0,
            Color::default(),
            &connection,
        )
        .unwrap();

        apply_wallet_delta(wallet.id, user_id, -30.0, &connection).unwrap();

        let got = get_wallet(wallet.id, user_id, &connection).unwrap();
        assert_eq!(got.balance, 70.0);
        assert_eq!(
            apply_wallet_delta(wallet.id + 1, user_id, 1.0, &connection),
            Err(Error::InvalidWallet(wallet.id + 1))
        );
    }

    #[test]
    fn delete_wallet_removes_it() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        let wallet = create_wallet(
            user_id,
            WalletName::new_unchecked("Everyday"),
            WalletKind::Bank,
            0.0,
            Color::default(),
            &connection,
        )
        .unwrap();

        delete_wallet(wallet.id, user_id, &connection).unwrap();

        assert_eq!(
            get_wallet(wallet.id, user_id, &connection),
            Err(Error::NotFound)
        );
    }
}
