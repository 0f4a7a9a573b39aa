//! Dashboard HTTP handler and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::{BudgetUtilization, load_budget_utilization},
    dashboard::{
        cards::{budget_overview_view, top_budgets, totals_view},
        tables::{RECENT_TRANSACTION_COUNT, recent_transactions_view},
    },
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base, link},
    month::{end_of_month, format_month_label, format_month_query, start_of_month},
    navigation::NavBar,
    report::{
        Summary,
        charts::{ReportChart, category_pie_chart, charts_scripts, charts_view},
        get_report_transactions, group_by_category, summarize,
    },
    timezone::get_local_date,
    transaction::{
        Page, TransactionFilter, TransactionTableRow, TransactionType, query_transactions,
    },
    wallet::{get_total_balance, get_wallets},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    month: Date,
    total_balance: f64,
    summary: Summary,
    budgets: Vec<BudgetUtilization>,
    recent_transactions: Vec<TransactionTableRow>,
    spending_chart: ReportChart,
}

/// Display an overview of the current month.
///
/// Users without any wallets are shown how to get started instead.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let wallets = get_wallets(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get wallets: {error}"))?;

    if wallets.is_empty() {
        return Ok(onboarding_view(nav_bar).into_response());
    }

    let data = build_dashboard_data(user_id, today, &connection)
        .inspect_err(|error| tracing::error!("could not build dashboard: {error}"))?;

    Ok(dashboard_view(nav_bar, &data).into_response())
}

fn build_dashboard_data(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<DashboardData, Error> {
    let month = start_of_month(today);
    let total_balance = get_total_balance(user_id, connection)?;
    let month_transactions =
        get_report_transactions(user_id, month, end_of_month(month), connection)?;
    let budgets = top_budgets(load_budget_utilization(user_id, month, connection)?);
    let recent_transactions = query_transactions(
        &TransactionFilter::new(user_id),
        Page {
            number: 1,
            size: RECENT_TRANSACTION_COUNT,
        },
        connection,
    )?;

    let spending_chart = ReportChart {
        id: "spending-by-category-chart",
        options: category_pie_chart(
            "Spending by category",
            &format_month_label(month),
            &group_by_category(&month_transactions, TransactionType::Expense),
        )
        .to_string(),
    };

    Ok(DashboardData {
        month,
        total_balance,
        summary: summarize(&month_transactions),
        budgets,
        recent_transactions,
        spending_chart,
    })
}

fn dashboard_view(nav_bar: Markup, data: &DashboardData) -> Markup {
    let month_label = format_month_label(data.month);
    let budgets_url = format!(
        "{}?month={}",
        endpoints::BUDGETS_VIEW,
        format_month_query(data.month)
    );
    let charts = std::slice::from_ref(&data.spending_chart);

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section id="dashboard-content" class="w-full max-w-6xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Dashboard" }
                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "Add Transaction" }
                }

                (totals_view(data.total_balance, &month_label, &data.summary))

                div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
                {
                    (budget_overview_view(&data.budgets, &budgets_url))
                    (recent_transactions_view(&data.recent_transactions))
                }

                (charts_view(charts))
            }
        }
    );

    base("Dashboard", &charts_scripts(charts), &content)
}

fn onboarding_view(nav_bar: Markup) -> Markup {
    let wallet_link = link(endpoints::NEW_WALLET_VIEW, "create a wallet");
    let categories_link = link(endpoints::CATEGORIES_VIEW, "categories");

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section id="onboarding" class="w-full max-w-xl space-y-4 text-center"
            {
                h1 class="text-2xl font-bold" { "Welcome to Pocketbook" }

                p
                {
                    "To get started, " (wallet_link) " for each bank account or \
                    e-wallet you want to track."
                }

                p
                {
                    "Your transactions are grouped by "
                    (categories_link)
                    ". A few have been created for you, but you can change them any time."
                }
            }
        }
    );

    base("Dashboard", &[], &content)
}
