//! Wallets listing page.

use std::sync::{Arc, Mutex};

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
    endpoints::{self, format_endpoint},
    html::{
        CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, amount_class, base, color_swatch,
        edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    wallet::{Wallet, get_wallets},
};

/// The state needed for the wallets listing page.
#[derive(Debug, Clone)]
pub struct WalletsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for WalletsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the wallets page with a card per wallet and the total balance.
pub async fn get_wallets_page(
    State(state): State<WalletsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let wallets = get_wallets(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve wallets: {error}"))?;

    Ok(wallets_view(&wallets).into_response())
}

fn wallet_card(wallet: &Wallet) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_WALLET_VIEW, wallet.id);
    let delete_url = format_endpoint(endpoints::DELETE_WALLET, wallet.id);
    let confirm_message = format!(
        "Are you sure you want to delete the wallet '{}'? This cannot be undone.",
        wallet.name
    );

    html! {
        li class=(CARD_STYLE) data-wallet-card="true"
        {
            div class="flex items-start justify-between gap-3"
            {
                div class="flex items-center gap-2 text-sm font-semibold"
                {
                    (color_swatch(&wallet.color))
                    (wallet.name)
                }

                div class={ "text-sm tabular-nums text-right " (amount_class(wallet.balance)) }
                {
                    (format_currency(wallet.balance))
                }
            }

            div class="mt-1 text-xs text-gray-500 dark:text-gray-400" { (wallet.kind.label()) }

            div class="mt-2 flex items-center gap-4 text-sm"
            {
                (edit_delete_action_links(
                    &edit_url,
                    &delete_url,
                    &confirm_message,
                    "closest [data-wallet-card='true']",
                    "outerHTML",
                ))
            }
        }
    }
}

fn wallets_view(wallets: &[Wallet]) -> Markup {
    let nav_bar = NavBar::new(endpoints::WALLETS_VIEW).into_html();
    let total: f64 = wallets.iter().map(|wallet| wallet.balance).sum();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-5xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Wallets" }

                    a href=(endpoints::NEW_WALLET_VIEW) class=(LINK_STYLE) { "Add Wallet" }
                }

                div class=(CARD_STYLE) id="total-balance"
                {
                    p class="text-sm text-gray-500 dark:text-gray-400" { "Total balance" }
                    p class={ "text-2xl font-bold tabular-nums " (amount_class(total)) }
                    {
                        (format_currency(total))
                    }
                }

                ul class="grid gap-4 sm:grid-cols-2 lg:grid-cols-3"
                {
                    @for wallet in wallets {
                        (wallet_card(wallet))
                    }
                }

                @if wallets.is_empty() {
                    p class="rounded border border-dashed border-gray-300 px-4 py-6 text-center \
                        text-sm text-gray-500 dark:border-gray-700 dark:text-gray-400"
                    {
                        "No wallets found. Create a wallet "
                        a href=(endpoints::NEW_WALLET_VIEW) class=(LINK_STYLE) { "here" }
                        "."
                    }
                }
            }
        }
    };

    base("Wallets", &[], &content)
}
