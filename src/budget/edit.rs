//! Budget editing page and endpoint.

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
    budget::{
        Budget, BudgetId, create::budgets_url, domain::BudgetLimitFormData,
        form::budget_limit_form, get_budget, update_budget,
    },
    category::{Category, get_category},
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base, color_badge, dollar_input_styles},
    month::format_month_label,
    navigation::NavBar,
};

/// The state needed for the edit budget page and endpoint.
#[derive(Debug, Clone)]
pub struct EditBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for changing a budget's limit.
pub async fn get_edit_budget_page(
    Path(budget_id): Path<BudgetId>,
    State(state): State<EditBudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = get_budget(budget_id, user_id, &connection)?;
    let category = get_category(budget.category_id, user_id, &connection)?;

    Ok(edit_budget_view(&budget, &category).into_response())
}

fn edit_budget_view(budget: &Budget, category: &Category) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_BUDGET_VIEW, budget.id);
    let update_url = format_endpoint(endpoints::PUT_BUDGET, budget.id);
    let nav_bar = NavBar::new(&edit_url).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Budget" }

            p id="budget-summary" class="w-full mb-4 flex items-center gap-2 text-sm"
            {
                (color_badge(category.name.as_ref(), &category.color))
                span { (format_month_label(budget.month)) }
            }

            (budget_limit_form(&update_url, budget.limit))
        }
    };

    base("Edit Budget", &[dollar_input_styles()], &content)
}

/// Handle budget limit changes.
pub async fn update_budget_endpoint(
    Path(budget_id): Path<BudgetId>,
    State(state): State<EditBudgetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BudgetLimitFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = update_budget(budget_id, user_id, form.limit, &connection)
        .and_then(|_| get_budget(budget_id, user_id, &connection));

    match result {
        Ok(budget) => (HxRedirect(budgets_url(budget.month)), StatusCode::SEE_OTHER).into_response(),
        Err(error @ (Error::InvalidAmount(_) | Error::UpdateMissingBudget)) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating budget {budget_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
