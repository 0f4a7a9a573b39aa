use rusqlite::Connection;
use time::Date;

use crate::{Error, auth::UserID, report::ReportTransaction};

/// Load the user's transactions dated within `from..=to`, oldest first.
pub fn get_report_transactions(
    user_id: UserID,
    from: Date,
    to: Date,
    connection: &Connection,
) -> Result<Vec<ReportTransaction>, Error> {
    connection
        .prepare(
            "SELECT t.amount, t.date, c.name, c.color, w.name
            FROM \"transaction\" t
            INNER JOIN category c ON c.id = t.category_id
            INNER JOIN wallet w ON w.id = t.wallet_id
            WHERE t.user_id = ?1 AND t.date >= ?2 AND t.date <= ?3
            ORDER BY t.date ASC, t.id ASC",
        )?
        .query_map((user_id.as_i64(), from, to), |row| {
            Ok(ReportTransaction {
                amount: row.get(0)?,
                date: row.get(1)?,
                category_name: row.get(2)?,
                category_color: row.get(3)?,
                wallet_name: row.get(4)?,
            })
        })?
        .map(|transaction| transaction.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        category::{CategoryName, create_category},
        color::Color,
        test_utils::{create_test_user, get_test_connection},
        transaction::{Transaction, create_transaction},
        wallet::{WalletKind, WalletName, create_wallet},
    };

    use super::get_report_transactions;

    #[test]
    fn loads_range_for_user_only() {
        let conn = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &conn);
        let other = create_test_user("other@bar.baz", &conn);
        let mut setup = Vec::new();
        for owner in [user_id, other] {
            let wallet = create_wallet(
                owner,
                WalletName::new_unchecked("Bank"),
                WalletKind::Bank,
                0.0,
                Color::default(),
                &conn,
            )
            .unwrap();
            let category = create_category(
                owner,
                CategoryName::new_unchecked("Food"),
                Color::new_unchecked("#f97316"),
                &conn,
            )
            .unwrap();
            setup.push((owner, wallet.id, category.id));
        }
        for &(owner, wallet_id, category_id) in &setup {
            for date in [
                date!(2025 - 01 - 31),
                date!(2025 - 02 - 01),
                date!(2025 - 02 - 28),
                date!(2025 - 03 - 01),
            ] {
                create_transaction(
                    Transaction::build(wallet_id, category_id, -10.0, date, ""),
                    owner,
                    &conn,
                )
                .unwrap();
            }
        }

        let got =
            get_report_transactions(user_id, date!(2025 - 02 - 01), date!(2025 - 02 - 28), &conn)
                .unwrap();

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].date, date!(2025 - 02 - 01));
        assert_eq!(got[0].category_name, "Food");
        assert_eq!(got[0].category_color, Color::new_unchecked("#f97316"));
        assert_eq!(got[0].wallet_name, "Bank");
    }
}
