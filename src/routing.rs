//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_forgot_password_page, get_log_in_page, get_log_out,
        get_register_page, post_log_in, register_user,
    },
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budgets_page, get_edit_budget_page,
        get_new_budget_page, update_budget_endpoint,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_page,
        get_edit_category_page, get_new_category_page, update_category_endpoint,
    },
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    receipt::{get_scan_receipt_page, receipt_upload_limit, scan_receipt_endpoint},
    report::get_reports_page,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_edit_transaction_page,
        get_new_transaction_page, get_transactions_page, update_transaction_endpoint,
    },
    wallet::{
        create_wallet_endpoint, delete_wallet_endpoint, get_edit_wallet_page,
        get_new_wallet_page, get_wallets_page, update_wallet_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::NEW_TRANSACTION_VIEW, get(get_new_transaction_page))
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::WALLETS_VIEW, get(get_wallets_page))
        .route(endpoints::NEW_WALLET_VIEW, get(get_new_wallet_page))
        .route(endpoints::EDIT_WALLET_VIEW, get(get_edit_wallet_page))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_new_category_page))
        .route(endpoints::EDIT_CATEGORY_VIEW, get(get_edit_category_page))
        .route(endpoints::BUDGETS_VIEW, get(get_budgets_page))
        .route(endpoints::NEW_BUDGET_VIEW, get(get_new_budget_page))
        .route(endpoints::EDIT_BUDGET_VIEW, get(get_edit_budget_page))
        .route(endpoints::REPORTS_VIEW, get(get_reports_page))
        .route(endpoints::SCAN_RECEIPT_VIEW, get(get_scan_receipt_page))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::TRANSACTION,
                put(update_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .route(endpoints::POST_WALLET, post(create_wallet_endpoint))
            .route(endpoints::PUT_WALLET, put(update_wallet_endpoint))
            .route(endpoints::DELETE_WALLET, delete(delete_wallet_endpoint))
            .route(endpoints::POST_CATEGORY, post(create_category_endpoint))
            .route(endpoints::PUT_CATEGORY, put(update_category_endpoint))
            .route(endpoints::DELETE_CATEGORY, delete(delete_category_endpoint))
            .route(endpoints::POST_BUDGET, post(create_budget_endpoint))
            .route(endpoints::PUT_BUDGET, put(update_budget_endpoint))
            .route(endpoints::DELETE_BUDGET, delete(delete_budget_endpoint))
            .route(
                endpoints::RECEIPTS_API,
                post(scan_receipt_endpoint).layer(receipt_upload_limit()),
            )
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::DASHBOARD_VIEW);
    }
}

#[cfg(test)]
mod router_tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppState, PaginationConfig, endpoints, receipt::DisabledReceiptParser,
        routing::build_router,
    };

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "foobar",
            "Etc/UTC",
            PaginationConfig::default(),
            Arc::new(DisabledReceiptParser),
        )
        .unwrap();

        TestServer::try_new(build_router(state)).expect("Could not create test server")
    }

    #[tokio::test]
    async fn coffee_is_a_teapot() {
        let server = get_test_server();

        server
            .get(endpoints::COFFEE)
            .await
            .assert_status(StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        server
            .get("/definitely/not/a/page")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn protected_pages_redirect_to_log_in() {
        let server = get_test_server();

        for page in [
            endpoints::DASHBOARD_VIEW,
            endpoints::TRANSACTIONS_VIEW,
            endpoints::WALLETS_VIEW,
            endpoints::CATEGORIES_VIEW,
            endpoints::BUDGETS_VIEW,
            endpoints::REPORTS_VIEW,
            endpoints::SCAN_RECEIPT_VIEW,
        ] {
            let response = server.get(page).await;

            response.assert_status(StatusCode::SEE_OTHER);
            let location = response.header("location");
            let location = location.to_str().unwrap();
            assert!(
                location.starts_with(endpoints::LOG_IN_VIEW),
                "{page} redirected to {location}"
            );
        }
    }

    #[tokio::test]
    async fn protected_api_uses_hx_redirect() {
        let server = get_test_server();

        let response = server.post(endpoints::POST_WALLET).await;

        response.assert_status_ok();
        let location = response.header("hx-redirect");
        assert!(
            location
                .to_str()
                .unwrap()
                .starts_with(endpoints::LOG_IN_VIEW)
        );
    }

    #[tokio::test]
    async fn log_in_page_is_public() {
        let server = get_test_server();

        server.get(endpoints::LOG_IN_VIEW).await.assert_status_ok();
    }
}
