//! Wallet editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
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
        Wallet, WalletId, WalletName,
        domain::WalletFormData,
        form::{WalletFormAction, wallet_form},
        get_wallet, update_wallet,
    },
};

/// The state needed for the edit wallet page and endpoint.
#[derive(Debug, Clone)]
pub struct EditWalletState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditWalletState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the wallet editing page.
pub async fn get_edit_wallet_page(
    Path(wallet_id): Path<WalletId>,
    State(state): State<EditWalletState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let wallet = get_wallet(wallet_id, user_id, &connection)?;

    Ok(edit_wallet_view(&wallet).into_response())
}

fn edit_wallet_view(wallet: &Wallet) -> Markup {
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_WALLET_VIEW, wallet.id);
    let update_url = endpoints::format_endpoint(endpoints::PUT_WALLET, wallet.id);
    let nav_bar = NavBar::new(&edit_url).into_html();
    let form = wallet_form(WalletFormAction::Update(&update_url), Some(wallet));

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Wallet" }
            (form)
        }
    };

    base("Edit Wallet", &[dollar_input_styles()], &content)
}

/// Handle wallet update form submission.
pub async fn update_wallet_endpoint(
    Path(wallet_id): Path<WalletId>,
    State(state): State<EditWalletState>,
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

    let wallet = Wallet {
        id: wallet_id,
        user_id,
        name,
        kind: form.kind,
        balance: form.balance,
        color,
    };

    match update_wallet(&wallet, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::WALLETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(
            error @ (Error::InvalidBalance(_)
            | Error::UpdateMissingWallet
            | Error::DuplicateWalletName(_)),
        ) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating wallet {wallet_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
