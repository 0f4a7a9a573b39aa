//! Defines the route handler for the page that displays transactions as a table.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, get_categories},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        amount_class, base, color_badge, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    pagination::{PaginationConfig, create_pagination_indicators, page_count, pagination_view},
    transaction::{
        DATE_FORMAT, Page, TransactionFilter, TransactionTableRow, TransactionType,
        count_transactions, query_transactions,
    },
    wallet::{Wallet, get_wallets},
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Controls the default page size and how many page links are shown.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The raw query string of the transactions page.
///
/// Every field is a string because the filter form submits empty strings for
/// unset fields. Values that do not parse are ignored.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct TransactionsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Parse a date of the form "2025-03-14".
pub(crate) fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), DATE_FORMAT).ok()
}

impl TransactionsQuery {
    fn to_filter(&self, user_id: UserID) -> TransactionFilter {
        let mut filter = TransactionFilter::new(user_id);

        if let Some(from) = non_empty(&self.from).and_then(parse_date) {
            filter = filter.from(from);
        }
        if let Some(to) = non_empty(&self.to).and_then(parse_date) {
            filter = filter.to(to);
        }
        if let Some(wallet_id) = non_empty(&self.wallet_id).and_then(|id| id.parse().ok()) {
            filter = filter.wallet(wallet_id);
        }
        if let Some(category_id) = non_empty(&self.category_id).and_then(|id| id.parse().ok()) {
            filter = filter.category(category_id);
        }
        match non_empty(&self.type_) {
            Some("income") => filter = filter.transaction_type(TransactionType::Income),
            Some("expense") => filter = filter.transaction_type(TransactionType::Expense),
            _ => {}
        }
        if let Some(search) = non_empty(&self.q) {
            filter = filter.search(search);
        }

        filter
    }

    fn page(&self, config: &PaginationConfig) -> Page {
        let number = non_empty(&self.page)
            .and_then(|page| page.parse::<u64>().ok())
            .filter(|&page| page > 0)
            .unwrap_or(config.default_page);
        let size = non_empty(&self.per_page)
            .and_then(|size| size.parse::<u64>().ok())
            .filter(|&size| size > 0)
            .unwrap_or(config.default_page_size)
            .min(config.max_page_size.max(1));

        Page { number, size }
    }

    /// The URL of `page` with the same filters as this query.
    fn page_url(&self, page: u64) -> String {
        let query = TransactionsQuery {
            from: non_empty(&self.from).map(str::to_owned),
            to: non_empty(&self.to).map(str::to_owned),
            wallet_id: non_empty(&self.wallet_id).map(str::to_owned),
            category_id: non_empty(&self.category_id).map(str::to_owned),
            type_: non_empty(&self.type_).map(str::to_owned),
            q: non_empty(&self.q).map(str::to_owned),
            page: Some(page.to_string()),
            per_page: non_empty(&self.per_page).map(str::to_owned),
        };

        match serde_urlencoded::to_string(&query) {
            Ok(query_string) => format!("{}?{query_string}", endpoints::TRANSACTIONS_VIEW),
            Err(error) => {
                tracing::error!("could not encode transactions query: {error}");
                endpoints::TRANSACTIONS_VIEW.to_owned()
            }
        }
    }
}

/// Render a filterable, paginated table of the user's transactions.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let filter = query.to_filter(user_id);
    let page = query.page(&state.pagination_config);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let row_count = count_transactions(&filter, &connection)
        .inspect_err(|error| tracing::error!("could not count transactions: {error}"))?;
    let last_page = page_count(row_count, page.size);
    let page = Page {
        number: page.number.min(last_page),
        ..page
    };
    let rows = query_transactions(&filter, page, &connection)
        .inspect_err(|error| tracing::error!("could not query transactions: {error}"))?;
    let wallets = get_wallets(user_id, &connection)?;
    let categories = get_categories(user_id, &connection)?;

    let indicators = create_pagination_indicators(
        page.number,
        last_page,
        state.pagination_config.max_pages,
    );
    let pagination = pagination_view(&indicators, |page| query.page_url(page));

    Ok(transactions_view(
        &rows,
        &filter,
        &query,
        &wallets,
        &categories,
        &pagination,
    )
    .into_response())
}

fn filter_form(
    filter: &TransactionFilter,
    query: &TransactionsQuery,
    wallets: &[Wallet],
    categories: &[Category],
) -> Markup {
    let from = filter.from.map(|date| date.to_string());
    let to = filter.to.map(|date| date.to_string());

    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            id="transaction-filters"
            class="grid gap-4 sm:grid-cols-2 lg:grid-cols-3 items-end"
        {
            div
            {
                label for="from" class=(FORM_LABEL_STYLE) { "From" }
                input id="from" name="from" type="date" value=[from] class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="to" class=(FORM_LABEL_STYLE) { "To" }
                input id="to" name="to" type="date" value=[to] class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="q" class=(FORM_LABEL_STYLE) { "Description" }
                input
                    id="q"
                    name="q"
                    type="search"
                    placeholder="Search"
                    value=[non_empty(&query.q)]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="filter-wallet" class=(FORM_LABEL_STYLE) { "Wallet" }
                select id="filter-wallet" name="wallet_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All wallets" }
                    @for wallet in wallets {
                        option value=(wallet.id) selected[filter.wallet_id == Some(wallet.id)]
                        {
                            (wallet.name)
                        }
                    }
                }
            }

            div
            {
                label for="filter-category" class=(FORM_LABEL_STYLE) { "Category" }
                select id="filter-category" name="category_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All categories" }
                    @for category in categories {
                        option value=(category.id) selected[filter.category_id == Some(category.id)]
                        {
                            (category.name)
                        }
                    }
                }
            }

            div
            {
                label for="filter-type" class=(FORM_LABEL_STYLE) { "Type" }
                select id="filter-type" name="type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Income and expenses" }
                    @for transaction_type in [TransactionType::Income, TransactionType::Expense] {
                        option
                            value=(transaction_type.as_str())
                            selected[filter.transaction_type == Some(transaction_type)]
                        {
                            @match transaction_type {
                                TransactionType::Income => { "Income" }
                                TransactionType::Expense => { "Expenses" }
                            }
                        }
                    }
                }
            }

            div class="flex gap-4 items-center sm:col-span-2 lg:col-span-3"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply filters" }
                a href=(endpoints::TRANSACTIONS_VIEW) class={ (LINK_STYLE) " whitespace-nowrap" } { "Clear" }
            }
        }
    }
}

fn transaction_row(row: &TransactionTableRow) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, row.id);
    let delete_url = format_endpoint(endpoints::TRANSACTION, row.id);
    let confirm_message = format!(
        "Are you sure you want to delete the transaction '{}'? \
        The wallet balance will be adjusted.",
        row.description
    );

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
        {
            td class={ (TABLE_CELL_STYLE) " whitespace-nowrap" } { (row.date) }
            td class=(TABLE_CELL_STYLE) { (row.description) }
            td class=(TABLE_CELL_STYLE) { (color_badge(row.wallet_name.as_ref(), &row.wallet_color)) }
            td class=(TABLE_CELL_STYLE) { (color_badge(row.category_name.as_ref(), &row.category_color)) }
            td class={ (TABLE_CELL_STYLE) " text-right tabular-nums " (amount_class(row.amount)) }
            {
                (format_currency(row.amount))
            }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    (edit_delete_action_links(
                        &edit_url,
                        &delete_url,
                        &confirm_message,
                        "closest tr",
                        "delete",
                    ))
                }
            }
        }
    }
}

fn transactions_view(
    rows: &[TransactionTableRow],
    filter: &TransactionFilter,
    query: &TransactionsQuery,
    wallets: &[Wallet],
    categories: &[Category],
    pagination: &Markup,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-6xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "Create Transaction" }
                }

                (filter_form(filter, query, wallets, categories))

                div class="overflow-x-auto rounded shadow-md"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Wallet" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (transaction_row(row))
                            }

                            @if rows.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="6" class={ (TABLE_CELL_STYLE) " text-center" }
                                    {
                                        "No transactions found."
                                    }
                                }
                            }
                        }
                    }
                }

                (pagination)
            }
        }
    };

    base("Transactions", &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        auth::UserID,
        category::{CategoryName, create_category},
        color::Color,
        pagination::PaginationConfig,
        test_utils::{
            assert_valid_html, create_test_user, get_test_connection, parse_html_document,
        },
        transaction::{Transaction, create_transaction},
        wallet::{WalletKind, WalletName, create_wallet},
    };

    use super::{TransactionsQuery, TransactionsViewState, get_transactions_page};

    fn state_with_transactions(count: i64) -> (TransactionsViewState, UserID) {
        let conn = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &conn);
        let wallet = create_wallet(
            user_id,
            WalletName::new_unchecked("Bank"),
            WalletKind::Bank,
            0.0,
            Color::default(),
            &conn,
        )
        .unwrap();
        let category = create_category(
            user_id,
            CategoryName::new_unchecked("Food"),
            Color::default(),
            &conn,
        )
        .unwrap();
        for i in 1..=count {
            let amount = if i % 2 == 0 { i as f64 } else { -(i as f64) };
            create_transaction(
                Transaction::build(
                    wallet.id,
                    category.id,
                    amount,
                    date!(2025 - 01 - 01),
                    &format!("transaction #{i}"),
                ),
                user_id,
                &conn,
            )
            .unwrap();
        }

        (
            TransactionsViewState {
                db_connection: Arc::new(Mutex::new(conn)),
                pagination_config: PaginationConfig {
                    default_page: 1,
                    default_page_size: 5,
                    max_pages: 5,
                    max_page_size: 10,
                },
            },
            user_id,
        )
    }

    async fn render(
        state: TransactionsViewState,
        user_id: UserID,
        query: TransactionsQuery,
    ) -> Html {
        let response = get_transactions_page(State(state), Extension(user_id), Query(query))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        parse_html_document(response).await
    }

    fn row_count(html: &Html) -> usize {
        html.select(&Selector::parse("tr[data-transaction-row]").unwrap())
            .count()
    }

    #[tokio::test]
    async fn shows_first_page_newest_first() {
        let (state, user_id) = state_with_transactions(12);

        let html = render(state, user_id, TransactionsQuery::default()).await;

        assert_valid_html(&html);
        assert_eq!(row_count(&html), 5);
        let first_row = html
            .select(&Selector::parse("tr[data-transaction-row]").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(first_row.contains("transaction #12"), "got {first_row}");
    }

    #[tokio::test]
    async fn pagination_links_keep_filters() {
        let (state, user_id) = state_with_transactions(12);
        let query = TransactionsQuery {
            type_: Some("income".to_owned()),
            per_page: Some("2".to_owned()),
            ..Default::default()
        };

        let html = render(state, user_id, query).await;

        assert_eq!(row_count(&html), 2);
        let next_page = html
            .select(&Selector::parse("nav.pagination a").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .find(|href| href.contains("&page=2"))
            .expect("want a link to page 2");
        assert!(next_page.contains("type=income"), "got {next_page}");
        assert!(next_page.contains("per_page=2"), "got {next_page}");
    }

    #[tokio::test]
    async fn empty_filter_values_are_ignored() {
        let (state, user_id) = state_with_transactions(3);
        let query = TransactionsQuery {
            from: Some(String::new()),
            to: Some(String::new()),
            wallet_id: Some(String::new()),
            category_id: Some(String::new()),
            type_: Some(String::new()),
            q: Some(String::new()),
            page: None,
            per_page: None,
        };

        let html = render(state, user_id, query).await;

        assert_eq!(row_count(&html), 3);
    }

    #[tokio::test]
    async fn search_narrows_rows() {
        let (state, user_id) = state_with_transactions(3);
        let query = TransactionsQuery {
            q: Some("#2".to_owned()),
            ..Default::default()
        };

        let html = render(state, user_id, query).await;

        assert_eq!(row_count(&html), 1);
    }

    #[tokio::test]
    async fn page_past_the_end_shows_last_page() {
        let (state, user_id) = state_with_transactions(12);
        let query = TransactionsQuery {
            page: Some(u64::MAX.to_string()),
            ..Default::default()
        };

        let html = render(state, user_id, query).await;

        assert_eq!(row_count(&html), 2);
        let current = html
            .select(&Selector::parse("nav.pagination [aria-current]").unwrap())
            .next()
            .map(|page| page.text().collect::<String>());
        assert_eq!(current.as_deref().map(str::trim), Some("3"));
    }

    #[tokio::test]
    async fn huge_page_size_is_capped() {
        let (state, user_id) = state_with_transactions(12);
        let db_connection = state.db_connection.clone();
        let query = TransactionsQuery {
            page: Some(u64::MAX.to_string()),
            per_page: Some(u64::MAX.to_string()),
            ..Default::default()
        };

        let html = render(state, user_id, query).await;

        assert_eq!(row_count(&html), 2, "want the second page of 10 rows");
        assert!(db_connection.lock().is_ok());
    }

    #[tokio::test]
    async fn shows_empty_state() {
        let (state, user_id) = state_with_transactions(0);

        let html = render(state, user_id, TransactionsQuery::default()).await;

        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("No transactions found."));
    }
}
