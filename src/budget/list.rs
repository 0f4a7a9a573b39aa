//! The budgets page for one month.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::{
        BudgetUtilization, calculate_utilization, create::budgets_url, get_budgets_for_month,
    },
    category::get_categories,
    endpoints::{self, format_endpoint},
    html::{
        CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, amount_class, base, color_badge,
        edit_delete_action_links, format_currency,
    },
    month::{
        end_of_month, format_month_label, format_month_query, next_month, parse_month,
        previous_month, start_of_month,
    },
    navigation::NavBar,
    timezone::get_local_date,
    transaction::{TransactionFilter, TransactionType, get_transactions},
};

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The month to show, e.g. `?month=2025-03`. Defaults to the current month.
#[derive(Debug, Default, Deserialize)]
pub struct BudgetsQuery {
    pub month: Option<String>,
}

/// Load every budget for a month alongside how much of it has been spent.
pub(crate) fn load_budget_utilization(
    user_id: UserID,
    month: Date,
    connection: &Connection,
) -> Result<Vec<BudgetUtilization>, Error> {
    let budgets = get_budgets_for_month(user_id, month, connection)?;

    if budgets.is_empty() {
        return Ok(Vec::new());
    }

    let categories = get_categories(user_id, connection)?;
    let filter = TransactionFilter::new(user_id)
        .from(start_of_month(month))
        .to(end_of_month(month))
        .transaction_type(TransactionType::Expense);
    let expenses = get_transactions(&filter, connection)?;

    Ok(calculate_utilization(&budgets, &categories, &expenses))
}

/// Render the budgets for a month with a progress bar for each budget.
///
/// Responds with a bad request alert if the month is not of the form `YYYY-MM`.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<BudgetsQuery>,
) -> Result<Response, Error> {
    let month = match query.month.as_deref().filter(|month| !month.is_empty()) {
        Some(month) => match parse_month(month) {
            Ok(month) => month,
            Err(error) => return Ok(error.into_alert_response()),
        },
        None => start_of_month(get_local_date(&state.local_timezone)?),
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let utilization = load_budget_utilization(user_id, month, &connection)
        .inspect_err(|error| tracing::error!("Failed to load budgets for {month}: {error}"))?;

    Ok(budgets_view(month, &utilization).into_response())
}

/// A horizontal bar filled to the percentage used, capped at full.
pub(crate) fn budget_progress_bar(utilization: &BudgetUtilization) -> Markup {
    let width = utilization.percent_used.clamp(0.0, 100.0);

    html! {
        div
            class="w-full h-2.5 rounded-full bg-gray-200 dark:bg-gray-700"
            role="progressbar"
            aria-valuemin="0"
            aria-valuemax="100"
            aria-valuenow=(format!("{:.0}", utilization.percent_used))
        {
            div
                class={ "h-2.5 rounded-full " (utilization.status.bar_class()) }
                style={ "width: " (format!("{width:.1}")) "%" }
            {}
        }
    }
}

fn budget_card(utilization: &BudgetUtilization) -> Markup {
    let budget = &utilization.budget;
    let edit_url = format_endpoint(endpoints::EDIT_BUDGET_VIEW, budget.id);
    let delete_url = format_endpoint(endpoints::DELETE_BUDGET, budget.id);
    let confirm_message = format!(
        "Are you sure you want to delete the budget for '{}'?",
        utilization.category.name
    );

    html! {
        li class=(CARD_STYLE) data-budget-card="true"
        {
            div class="flex items-center justify-between gap-3 mb-2"
            {
                (color_badge(utilization.category.name.as_ref(), &utilization.category.color))

                span class="text-xs font-semibold" data-budget-status
                {
                    (utilization.status.label())
                }
            }

            (budget_progress_bar(utilization))

            dl class="mt-2 grid grid-cols-3 gap-2 text-sm tabular-nums"
            {
                div
                {
                    dt class="text-xs text-gray-500 dark:text-gray-400" { "Spent" }
                    dd data-budget-spent { (format_currency(utilization.spent)) }
                }
                div
                {
                    dt class="text-xs text-gray-500 dark:text-gray-400" { "Limit" }
                    dd { (format_currency(budget.limit)) }
                }
                div
                {
                    dt class="text-xs text-gray-500 dark:text-gray-400" { "Remaining" }
                    dd class=(amount_class(utilization.remaining)) data-budget-remaining
                    {
                        (format_currency(utilization.remaining))
                    }
                }
            }

            div class="mt-2 flex items-center gap-4 text-sm"
            {
                (edit_delete_action_links(
                    &edit_url,
                    &delete_url,
                    &confirm_message,
                    "closest [data-budget-card='true']",
                    "outerHTML",
                ))
            }
        }
    }
}

fn budgets_view(month: Date, utilization: &[BudgetUtilization]) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();
    let total_limit: f64 = utilization.iter().map(|item| item.budget.limit).sum();
    let total_spent: f64 = utilization.iter().map(|item| item.spent).sum();
    let new_budget_url = format!(
        "{}?month={}",
        endpoints::NEW_BUDGET_VIEW,
        format_month_query(month)
    );

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-5xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end gap-2"
                {
                    h1 class="text-xl font-bold" { "Budgets" }

                    nav class="flex items-center gap-4 text-sm" id="month-navigation"
                    {
                        @if let Some(previous) = previous_month(month) {
                            a href=(budgets_url(previous)) class=(LINK_STYLE) rel="prev"
                            {
                                "Previous"
                            }
                        }
                        span class="font-semibold" { (format_month_label(month)) }
                        @if let Some(next) = next_month(month) {
                            a href=(budgets_url(next)) class=(LINK_STYLE) rel="next"
                            {
                                "Next"
                            }
                        }
                    }

                    a href=(new_budget_url) class=(LINK_STYLE) { "Add Budget" }
                }

                div class=(CARD_STYLE) id="budget-totals"
                {
                    p class="text-sm text-gray-500 dark:text-gray-400" { "Spent of total limit" }
                    p class="text-2xl font-bold tabular-nums"
                    {
                        span id="budget-total-spent" { (format_currency(total_spent)) }
                        " / "
                        span id="budget-total-limit" { (format_currency(total_limit)) }
                    }
                }

                ul class="grid gap-4 sm:grid-cols-2 lg:grid-cols-3"
                {
                    @for item in utilization {
                        (budget_card(item))
                    }
                }

                @if utilization.is_empty() {
                    p class="rounded border border-dashed border-gray-300 px-4 py-6 text-center \
                        text-sm text-gray-500 dark:border-gray-700 dark:text-gray-400"
                    {
                        "No budgets for this month. Create a budget "
                        a href=(new_budget_url) class=(LINK_STYLE) { "here" }
                        "."
                    }
                }
            }
        }
    };

    base("Budgets", &[], &content)
}
