//! Wallet deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    wallet::{WalletId, delete_wallet},
};

/// The state needed for deleting a wallet.
#[derive(Debug, Clone)]
pub struct DeleteWalletState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteWalletState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle wallet deletion. Returns success alert or error.
///
/// Wallets that still have transactions are kept and an error alert explains why.
pub async fn delete_wallet_endpoint(
    Path(wallet_id): Path<WalletId>,
    State(state): State<DeleteWalletState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_wallet(wallet_id, user_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Wallet deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error @ (Error::DeleteMissingWallet | Error::WalletInUse)) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting wallet {wallet_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_wallet_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        Error,
        color::Color,
        test_utils::{
            assert_valid_html, create_test_user, get_test_connection, parse_html_fragment,
        },
        wallet::{WalletKind, WalletName, create_wallet, get_wallet},
    };

    use super::{DeleteWalletState, delete_wallet_endpoint};

    #[tokio::test]
    async fn delete_wallet_returns_success_alert() {
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
        let state = DeleteWalletState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            delete_wallet_endpoint(Path(wallet.id), State(state.clone()), Extension(user_id))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_eq!(
            get_wallet(wallet.id, user_id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn delete_missing_wallet_returns_not_found() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        let state = DeleteWalletState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_wallet_endpoint(Path(42), State(state), Extension(user_id)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
