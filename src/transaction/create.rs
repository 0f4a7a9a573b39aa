//! The new transaction page and the endpoint for creating a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, get_categories},
    endpoints,
    html::{FORM_CONTAINER_STYLE, LINK_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    timezone::get_local_date,
    transaction::{
        TransactionForm, create_transaction,
        form::{TransactionFormAction, TransactionFormDefaults, transaction_form},
    },
    wallet::{Wallet, get_wallets},
};

/// The state needed to show the new transaction page or create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Renders the page for creating a transaction.
pub async fn get_new_transaction_page(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let wallets = get_wallets(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve wallets: {error}"))?;
    let categories = get_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let defaults = TransactionFormDefaults::blank(today);

    Ok(new_transaction_view(&defaults, &wallets, &categories).into_response())
}

/// The form for creating a transaction, or links to create the missing
/// wallets or categories a transaction needs.
pub(crate) fn new_transaction_form(
    defaults: &TransactionFormDefaults<'_>,
    wallets: &[Wallet],
    categories: &[Category],
) -> Markup {
    if wallets.is_empty() || categories.is_empty() {
        return html! {
            div id="missing-prerequisites" class="w-full space-y-2 text-sm"
            {
                p { "A transaction needs a wallet and a category." }

                @if wallets.is_empty() {
                    p
                    {
                        "You do not have any wallets yet. "
                        a href=(endpoints::NEW_WALLET_VIEW) class=(LINK_STYLE) { "Create a wallet" }
                        " first."
                    }
                }

                @if categories.is_empty() {
                    p
                    {
                        "You do not have any categories yet. "
                        a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE) { "Create a category" }
                        " first."
                    }
                }
            }
        };
    }

    transaction_form(
        TransactionFormAction::Create(endpoints::TRANSACTIONS_API),
        defaults,
        wallets,
        categories,
    )
}

fn new_transaction_view(
    defaults: &TransactionFormDefaults<'_>,
    wallets: &[Wallet],
    categories: &[Category],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let form = new_transaction_form(defaults, wallets, categories);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full flex justify-between items-end mb-4"
            {
                h2 class="text-xl font-bold" { "New Transaction" }
                a href=(endpoints::SCAN_RECEIPT_VIEW) class=(LINK_STYLE) { "Scan a receipt" }
            }

            div id="transaction-form-container" class="w-full"
            {
                (form)
            }
        }
    };

    base("Create Transaction", &[dollar_input_styles()], &content)
}

/// A route handler for creating a new transaction, redirects to transactions view on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let today = match get_local_date(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let builder = match form.into_builder(today) {
        Ok(builder) => builder,
        Err(error) => {
            tracing::debug!("rejected transaction form: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_transaction(builder, user_id, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::InvalidWallet(_) | Error::InvalidCategory(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod new_transaction_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
    use scraper::Selector;

    use crate::{
        category::seed_default_categories,
        color::Color,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            create_test_user, get_test_connection, must_get_form, parse_html_document,
        },
        wallet::{WalletKind, WalletName, create_wallet},
    };

    use super::{CreateTransactionState, get_new_transaction_page};

    #[tokio::test]
    async fn new_transaction_returns_form() {
        let conn = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &conn);
        seed_default_categories(user_id, &conn).unwrap();
        create_wallet(
            user_id,
            WalletName::new_unchecked("Bank"),
            WalletKind::Bank,
            0.0,
            Color::default(),
            &conn,
        )
        .unwrap();
        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_new_transaction_page(State(state), Extension(user_id))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "date", "date");
        assert_form_input(&form, "type_", "radio");
        assert_form_submit_button(&form);
        let options = form
            .select(&Selector::parse("select[name=category_id] option").unwrap())
            .count();
        assert_eq!(options, 7, "want placeholder plus six default categories");
    }

    #[tokio::test]
    async fn links_to_wallet_creation_without_wallets() {
        let conn = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &conn);
        seed_default_categories(user_id, &conn).unwrap();
        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_new_transaction_page(State(state), Extension(user_id))
            .await
            .into_response();

        let html = parse_html_document(response).await;
        assert!(
            html.select(&Selector::parse("form[hx-post]").unwrap())
                .next()
                .is_none()
        );
        let link = Selector::parse(&format!(
            "#missing-prerequisites a[href='{}']",
            endpoints::NEW_WALLET_VIEW
        ))
        .unwrap();
        assert!(html.select(&link).next().is_some());
        let category_link = Selector::parse(&format!(
            "#missing-prerequisites a[href='{}']",
            endpoints::NEW_CATEGORY_VIEW
        ))
        .unwrap();
        assert!(html.select(&category_link).next().is_none());
    }
}
