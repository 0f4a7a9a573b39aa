//! The new budget page and the endpoint for creating a budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::{create_budget, domain::BudgetFormData, form::new_budget_form},
    category::{Category, get_categories},
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    month::{format_month_query, parse_month, start_of_month},
    navigation::NavBar,
    timezone::get_local_date,
};

/// The state needed for the new budget page and for creating budgets.
#[derive(Debug, Clone)]
pub struct CreateBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The month to prefill, e.g. `?month=2025-03`.
#[derive(Debug, Default, Deserialize)]
pub struct NewBudgetQuery {
    pub month: Option<String>,
}

/// The URL of the budgets page for the month containing `month`.
pub(crate) fn budgets_url(month: Date) -> String {
    format!("{}?month={}", endpoints::BUDGETS_VIEW, format_month_query(month))
}

/// Render the page for creating a budget.
pub async fn get_new_budget_page(
    State(state): State<CreateBudgetState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<NewBudgetQuery>,
) -> Result<Response, Error> {
    let month = match query.month.as_deref().map(parse_month) {
        Some(Ok(month)) => month,
        // A missing or malformed month falls back to the current month.
        _ => start_of_month(get_local_date(&state.local_timezone)?),
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    Ok(new_budget_view(&categories, month).into_response())
}

fn new_budget_view(categories: &[Category], month: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_BUDGET_VIEW).into_html();
    let form = new_budget_form(categories, month);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Budget" }
            (form)
        }
    };

    base("New Budget", &[dollar_input_styles()], &content)
}

/// Handle budget creation form submissions.
///
/// Redirects to the budgets page for the new budget's month on success.
pub async fn create_budget_endpoint(
    State(state): State<CreateBudgetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BudgetFormData>,
) -> Response {
    let month = match parse_month(&form.month) {
        Ok(month) => month,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_budget(user_id, form.category_id, month, form.limit, &connection) {
        Ok(budget) => (HxRedirect(budgets_url(budget.month)), StatusCode::SEE_OTHER).into_response(),
        Err(
            error @ (Error::InvalidAmount(_) | Error::InvalidCategory(_) | Error::DuplicateBudget),
        ) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a budget: {error}");
            error.into_alert_response()
        }
    }
}
