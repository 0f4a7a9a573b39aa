use maud::{Markup, html};

use crate::{
    endpoints,
    html::{
        CARD_STYLE, LINK_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        amount_class, color_badge, format_currency,
    },
    transaction::TransactionTableRow,
};

/// How many transactions the recent transactions table shows.
pub(super) const RECENT_TRANSACTION_COUNT: u64 = 5;

pub(super) fn recent_transactions_view(rows: &[TransactionTableRow]) -> Markup {
    html! {
        section id="recent-transactions" class=(CARD_STYLE)
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h2 class="text-lg font-semibold" { "Recent transactions" }
                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "View all" }
            }

            @if rows.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "No transactions yet. "
                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "Add a transaction" }
                    "."
                }
            } @else {
                div class="overflow-x-auto"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            }
                        }
                        tbody
                        {
                            @for row in rows {
                                tr class=(TABLE_ROW_STYLE) data-recent-transaction
                                {
                                    td class=(TABLE_CELL_STYLE) { (row.date) }
                                    td class=(TABLE_CELL_STYLE) { (row.description) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (color_badge(row.category_name.as_ref(), &row.category_color))
                                    }
                                    td class={ (TABLE_CELL_STYLE) " tabular-nums " (amount_class(row.amount)) }
                                    {
                                        (format_currency(row.amount))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
