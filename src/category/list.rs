//! Categories listing page.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, CategoryId, count_transactions_per_category, get_categories},
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, color_badge, edit_delete_action_links,
    },
    navigation::NavBar,
};

/// The state needed for the categories listing page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the categories page with the number of transactions in each category.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
    let counts = count_transactions_per_category(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to count transactions: {error}"))?;

    Ok(categories_view(&categories, &counts).into_response())
}

fn category_row(category: &Category, transaction_count: u32) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id);
    let delete_url = format_endpoint(endpoints::DELETE_CATEGORY, category.id);
    let confirm_message = format!(
        "Are you sure you want to delete the category '{}'? \
        Its budgets will also be deleted.",
        category.name
    );

    html! {
        tr class=(TABLE_ROW_STYLE) data-category-row="true"
        {
            td class=(TABLE_CELL_STYLE)
            {
                (color_badge(category.name.as_ref(), &category.color))
            }

            td class={ (TABLE_CELL_STYLE) " text-right tabular-nums" } data-transaction-count
            {
                (transaction_count)
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

fn categories_view(categories: &[Category], counts: &HashMap<CategoryId, u32>) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-3xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE) { "Add Category" }
                }

                div class="overflow-x-auto rounded shadow-md"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Transactions" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for category in categories {
                                (category_row(
                                    category,
                                    counts.get(&category.id).copied().unwrap_or(0),
                                ))
                            }

                            @if categories.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="3" class={ (TABLE_CELL_STYLE) " text-center" }
                                    {
                                        "No categories found. Create a category "
                                        a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE) { "here" }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Categories", &[], &content)
}
