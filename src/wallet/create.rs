//! Wallet creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    color::Color,
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    wallet::{
        WalletName, create_wallet,
        domain::WalletFormData,
        form::{WalletFormAction, wallet_form},
    },
};

/// The state needed for creating a wallet.
#[derive(Debug, Clone)]
pub struct CreateWalletState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateWalletState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the wallet creation page.
pub async fn get_new_wallet_page() -> Response {
    new_wallet_view().into_response()
}

fn new_wallet_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_WALLET_VIEW).into_html();
    let form = wallet_form(WalletFormAction::Create(endpoints::POST_WALLET), None);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Wallet" }
            (form)
        }
    };

    base("New Wallet", &[dollar_input_styles()], &content)
}

/// Handle wallet creation form submission.
pub async fn create_wallet_endpoint(
    State(state): State<CreateWalletState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<WalletFormData>,
) -> Response {
    let name = match WalletName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };
    let color = match Color::new(&form.color) {
        Ok(color) => color,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_wallet(user_id, name, form.kind, form.balance, color, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::WALLETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::InvalidBalance(_) | Error::DuplicateWalletName(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a wallet: {error}");
            error.into_alert_response()
        }
    }
}
