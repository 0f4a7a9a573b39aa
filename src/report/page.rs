//! The reports page.

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
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        amount_class, base, color_badge, format_currency,
    },
    month::{format_month_label, previous_month, start_of_month},
    navigation::NavBar,
    report::{
        CategoryTotal, MonthBucket, Summary, WalletTotal,
        charts::{ReportChart, category_pie_chart, charts_scripts, charts_view, monthly_trend_chart},
        get_report_transactions, group_by_category, group_by_wallet, monthly_trend, summarize,
    },
    timezone::get_local_date,
    transaction::{TransactionType, parse_date},
};

/// How many whole months the default report covers, including the current one.
const DEFAULT_REPORT_MONTHS: usize = 6;

/// The state needed for the reports page.
#[derive(Debug, Clone)]
pub struct ReportsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The date range of a report, e.g. `?from=2025-01-01&to=2025-06-30`.
///
/// Missing or malformed dates fall back to the default range.
#[derive(Debug, Default, Deserialize)]
pub struct ReportsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// The first day of the month `DEFAULT_REPORT_MONTHS - 1` months before `today`.
fn default_from(today: Date) -> Date {
    (1..DEFAULT_REPORT_MONTHS).fold(start_of_month(today), |month, _| {
        previous_month(month).unwrap_or(month)
    })
}

/// Render the summary, charts and tables for a date range.
///
/// Responds with a bad request alert if the range ends before it starts.
pub async fn get_reports_page(
    State(state): State<ReportsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportsQuery>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone)?;
    let to = query.to.as_deref().and_then(parse_date).unwrap_or(today);
    let from = query
        .from
        .as_deref()
        .and_then(parse_date)
        .unwrap_or_else(|| default_from(to));

    if from > to {
        return Ok(Error::InvalidDateRange(from, to).into_alert_response());
    }

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_report_transactions(user_id, from, to, &connection)
        .inspect_err(|error| tracing::error!("Failed to load report for {from} to {to}: {error}"))?;

    let report = Report {
        from,
        to,
        summary: summarize(&transactions),
        expenses_by_category: group_by_category(&transactions, TransactionType::Expense),
        income_by_category: group_by_category(&transactions, TransactionType::Income),
        months: monthly_trend(&transactions, from, to),
        wallets: group_by_wallet(&transactions),
    };

    Ok(reports_view(&report).into_response())
}

struct Report {
    from: Date,
    to: Date,
    summary: Summary,
    expenses_by_category: Vec<CategoryTotal>,
    income_by_category: Vec<CategoryTotal>,
    months: Vec<MonthBucket>,
    wallets: Vec<WalletTotal>,
}

fn date_range_form(from: Date, to: Date) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::REPORTS_VIEW)
            id="report-range"
            class="flex flex-wrap items-end gap-4"
        {
            div
            {
                label for="from" class=(FORM_LABEL_STYLE) { "From" }
                input id="from" name="from" type="date" value=(from) class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="to" class=(FORM_LABEL_STYLE) { "To" }
                input id="to" name="to" type="date" value=(to) class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Show" }
            }
        }
    }
}

fn summary_card(label: &str, id: &str, value: Markup) -> Markup {
    html! {
        div class=(CARD_STYLE) id=(id)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p class="text-2xl font-bold tabular-nums" { (value) }
        }
    }
}

fn summary_view(summary: &Summary) -> Markup {
    let savings_rate = match summary.savings_rate {
        Some(rate) => format!("{rate:.1}%"),
        None => "-".to_owned(),
    };

    html! {
        section id="report-summary" class="grid gap-4 grid-cols-2 lg:grid-cols-5"
        {
            (summary_card("Income", "summary-income", html! {
                span class=(amount_class(summary.income)) { (format_currency(summary.income)) }
            }))
            (summary_card("Expenses", "summary-expenses", html! {
                span class=(amount_class(-summary.expenses)) { (format_currency(summary.expenses)) }
            }))
            (summary_card("Net", "summary-net", html! {
                span class=(amount_class(summary.net)) { (format_currency(summary.net)) }
            }))
            (summary_card("Savings rate", "summary-savings-rate", html! { (savings_rate) }))
            (summary_card("Transactions", "summary-count", html! { (summary.transaction_count) }))
        }
    }
}

fn category_table(id: &str, title: &str, totals: &[CategoryTotal]) -> Markup {
    html! {
        div class="overflow-x-auto rounded shadow-md"
        {
            table id=(id) class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                caption class="p-4 text-lg font-semibold text-left text-gray-900 dark:text-white"
                {
                    (title)
                }
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Total" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Share" }
                    }
                }
                tbody
                {
                    @for total in totals {
                        tr class=(TABLE_ROW_STYLE) data-category-total
                        {
                            td class=(TABLE_CELL_STYLE) { (color_badge(&total.name, &total.color)) }
                            td class={ (TABLE_CELL_STYLE) " tabular-nums" } { (format_currency(total.total)) }
                            td class={ (TABLE_CELL_STYLE) " tabular-nums" } { (format!("{:.1}%", total.percent)) }
                        }
                    }

                    @if totals.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="3" class={ (TABLE_CELL_STYLE) " text-center" } { "Nothing to show." }
                        }
                    }
                }
            }
        }
    }
}

fn monthly_table(months: &[MonthBucket]) -> Markup {
    html! {
        div class="overflow-x-auto rounded shadow-md"
        {
            table id="monthly-table" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                caption class="p-4 text-lg font-semibold text-left text-gray-900 dark:text-white"
                {
                    "Monthly totals"
                }
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Month" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Income" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Expenses" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Net" }
                    }
                }
                tbody
                {
                    @for bucket in months {
                        tr class=(TABLE_ROW_STYLE) data-month-row
                        {
                            td class=(TABLE_CELL_STYLE) { (format_month_label(bucket.month)) }
                            td class={ (TABLE_CELL_STYLE) " tabular-nums" } { (format_currency(bucket.income)) }
                            td class={ (TABLE_CELL_STYLE) " tabular-nums" } { (format_currency(bucket.expenses)) }
                            td class={ (TABLE_CELL_STYLE) " tabular-nums " (amount_class(bucket.net)) }
                            {
                                (format_currency(bucket.net))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn wallet_table(wallets: &[WalletTotal]) -> Markup {
    html! {
        div class="overflow-x-auto rounded shadow-md"
        {
            table id="wallet-table" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                caption class="p-4 text-lg font-semibold text-left text-gray-900 dark:text-white"
                {
                    "By wallet"
                }
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Wallet" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Income" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Expenses" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Net" }
                    }
                }
                tbody
                {
                    @for wallet in wallets {
                        tr class=(TABLE_ROW_STYLE) data-wallet-total
                        {
                            td class=(TABLE_CELL_STYLE) { (wallet.name) }
                            td class={ (TABLE_CELL_STYLE) " tabular-nums" } { (format_currency(wallet.income)) }
                            td class={ (TABLE_CELL_STYLE) " tabular-nums" } { (format_currency(wallet.expenses)) }
                            td class={ (TABLE_CELL_STYLE) " tabular-nums " (amount_class(wallet.net)) }
                            {
                                (format_currency(wallet.net))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn reports_view(report: &Report) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();
    let range_label = format!("{} to {}", report.from, report.to);
    let charts = [
        ReportChart {
            id: "expenses-by-category-chart",
            options: category_pie_chart(
                "Expenses by category",
                &range_label,
                &report.expenses_by_category,
            )
            .to_string(),
        },
        ReportChart {
            id: "monthly-trend-chart",
            options: monthly_trend_chart(&report.months).to_string(),
        },
    ];

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-6xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Reports" }
                    (date_range_form(report.from, report.to))
                }

                (summary_view(&report.summary))

                @if report.summary.transaction_count == 0 {
                    p class="rounded border border-dashed border-gray-300 px-4 py-6 text-center \
                        text-sm text-gray-500 dark:border-gray-700 dark:text-gray-400"
                    {
                        "No transactions between " (report.from) " and " (report.to) "."
                    }
                }

                (charts_view(&charts))

                div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
                {
                    (category_table("expense-category-table", "Expenses by category", &report.expenses_by_category))
                    (category_table("income-category-table", "Income by category", &report.income_by_category))
                    (monthly_table(&report.months))
                    (wallet_table(&report.wallets))
                }
            }
        }
    };

    base("Reports", &charts_scripts(&charts), &content)
}
