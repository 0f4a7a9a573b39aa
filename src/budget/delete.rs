//! Budget deletion endpoint.

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
    budget::{BudgetId, delete_budget},
};

/// The state needed for deleting a budget.
#[derive(Debug, Clone)]
pub struct DeleteBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle budget deletion. Returns a success alert or an error alert.
pub async fn delete_budget_endpoint(
    Path(budget_id): Path<BudgetId>,
    State(state): State<DeleteBudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_budget(budget_id, user_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Budget deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error @ Error::DeleteMissingBudget) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting budget {budget_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_budget_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::date;

    use crate::{
        Error,
        budget::{create_budget, get_budget},
        category::{CategoryName, create_category},
        color::Color,
        test_utils::{
            assert_valid_html, create_test_user, get_test_connection, parse_html_fragment,
        },
    };

    use super::{DeleteBudgetState, delete_budget_endpoint};

    #[tokio::test]
    async fn delete_budget_returns_success_alert() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        let category = create_category(
            user_id,
            CategoryName::new_unchecked("Food"),
            Color::default(),
            &connection,
        )
        .unwrap();
        let budget =
            create_budget(user_id, category.id, date!(2025 - 03 - 01), 50.0, &connection)
                .unwrap();
        let state = DeleteBudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            delete_budget_endpoint(Path(budget.id), State(state.clone()), Extension(user_id))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_eq!(
            get_budget(budget.id, user_id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn delete_missing_budget_returns_not_found() {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        let state = DeleteBudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_budget_endpoint(Path(7), State(state), Extension(user_id)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
