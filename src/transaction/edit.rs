//! The edit transaction page and the endpoint for updating a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, get_categories},
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    timezone::get_local_date,
    transaction::{
        Transaction, TransactionForm, TransactionId, get_transaction,
        form::{TransactionFormAction, TransactionFormDefaults, transaction_form},
        update_transaction,
    },
    wallet::{Wallet, get_wallets},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Renders the page for editing a transaction.
pub async fn get_edit_transaction_page(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, user_id, &connection)?;
    let wallets = get_wallets(user_id, &connection)?;
    let categories = get_categories(user_id, &connection)?;

    Ok(edit_transaction_view(&transaction, today, &wallets, &categories).into_response())
}

fn edit_transaction_view(
    transaction: &Transaction,
    today: time::Date,
    wallets: &[Wallet],
    categories: &[Category],
) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
    let update_url = format_endpoint(endpoints::TRANSACTION, transaction.id);
    let nav_bar = NavBar::new(&edit_url).into_html();

    let defaults = TransactionFormDefaults {
        transaction_type: transaction.transaction_type(),
        amount: Some(transaction.amount),
        date: transaction.date,
        description: Some(&transaction.description),
        wallet_id: Some(transaction.wallet_id),
        category_id: Some(transaction.category_id),
        max_date: today,
        autofocus_amount: false,
    };
    let form = transaction_form(
        TransactionFormAction::Update(&update_url),
        &defaults,
        wallets,
        categories,
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h2 class="w-full text-xl font-bold mb-4" { "Edit Transaction" }
            (form)
        }
    };

    base("Edit Transaction", &[dollar_input_styles()], &content)
}

/// A route handler for updating a transaction, redirects to transactions view on success.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let today = match get_local_date(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let builder = match form.into_builder(today) {
        Ok(builder) => builder,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_transaction(transaction_id, builder, user_id, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(
            error @ (Error::UpdateMissingTransaction
            | Error::InvalidWallet(_)
            | Error::InvalidCategory(_)),
        ) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("could not update transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod edit_transaction_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::Form;
    use scraper::Selector;
    use time::OffsetDateTime;

    use crate::{
        Error,
        auth::UserID,
        category::{CategoryName, create_category},
        color::Color,
        endpoints,
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, create_test_user, get_test_connection, must_get_form,
            parse_html_document,
        },
        transaction::{
            Transaction, TransactionForm, TransactionType, create_transaction, get_transaction,
        },
        wallet::{WalletKind, WalletName, create_wallet, get_wallet},
    };

    use super::{EditTransactionState, get_edit_transaction_page, update_transaction_endpoint};

    fn fixture() -> (EditTransactionState, UserID, Transaction) {
        let conn = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &conn);
        let wallet = create_wallet(
            user_id,
            WalletName::new_unchecked("Bank"),
            WalletKind::Bank,
            100.0,
            Color::default(),
            &conn,
        )
        .unwrap();
        let category = create_category(
            user_id,
            CategoryName::new_unchecked("Food"),
            Color::default(),
            &conn,
        )
        .unwrap();
        let transaction = create_transaction(
            Transaction::build(
                wallet.id,
                category.id,
                -20.0,
                OffsetDateTime::now_utc().date(),
                "Groceries",
            ),
            user_id,
            &conn,
        )
        .unwrap();

        (
            EditTransactionState {
                db_connection: Arc::new(Mutex::new(conn)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user_id,
            transaction,
        )
    }

    #[tokio::test]
    async fn edit_page_is_prefilled_with_magnitude() {
        let (state, user_id, transaction) = fixture();

        let response =
            get_edit_transaction_page(Path(transaction.id), State(state), Extension(user_id))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::TRANSACTION, transaction.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "amount", "number", "20.00");
        let description = form
            .select(&Selector::parse("input[name=description]").unwrap())
            .next()
            .expect("want a description input");
        assert_eq!(description.value().attr("value"), Some("Groceries"));
    }

    #[tokio::test]
    async fn edit_page_for_other_user_is_not_found() {
        let (state, _, transaction) = fixture();
        let intruder = create_test_user("intruder@bar.baz", &state.db_connection.lock().unwrap());

        let result =
            get_edit_transaction_page(Path(transaction.id), State(state), Extension(intruder))
                .await;

        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn update_switches_to_income() {
        let (state, user_id, transaction) = fixture();
        let form = TransactionForm {
            type_: TransactionType::Income,
            amount: 5.0,
            date: transaction.date,
            description: "Refund".to_owned(),
            wallet_id: transaction.wallet_id,
            category_id: transaction.category_id,
        };

        let response = update_transaction_endpoint(
            Path(transaction.id),
            State(state.clone()),
            Extension(user_id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let updated = get_transaction(transaction.id, user_id, &connection).unwrap();
        assert_eq!(updated.amount, 5.0);
        assert_eq!(updated.description, "Refund");
        let wallet = get_wallet(transaction.wallet_id, user_id, &connection).unwrap();
        assert_eq!(wallet.balance, 105.0);
    }

    #[tokio::test]
    async fn update_missing_transaction_is_not_found() {
        let (state, user_id, transaction) = fixture();
        let form = TransactionForm {
            type_: TransactionType::Expense,
            amount: 5.0,
            date: transaction.date,
            description: String::new(),
            wallet_id: transaction.wallet_id,
            category_id: transaction.category_id,
        };

        let response = update_transaction_endpoint(
            Path(transaction.id + 1),
            State(state),
            Extension(user_id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
