use maud::{Markup, html};
use time::Date;

use crate::{
    category::{Category, CategoryId},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, loading_spinner,
    },
    transaction::TransactionType,
    wallet::{Wallet, WalletId},
};

pub struct TransactionFormDefaults<'a> {
    pub transaction_type: TransactionType,
    pub amount: Option<f64>,
    pub date: Date,
    pub description: Option<&'a str>,
    pub wallet_id: Option<WalletId>,
    pub category_id: Option<CategoryId>,
    pub max_date: Date,
    pub autofocus_amount: bool,
}

impl TransactionFormDefaults<'_> {
    /// Defaults for a blank expense dated `today`.
    pub fn blank(today: Date) -> Self {
        Self {
            transaction_type: TransactionType::Expense,
            amount: None,
            date: today,
            description: None,
            wallet_id: None,
            category_id: None,
            max_date: today,
            autofocus_amount: true,
        }
    }
}

/// Where the form sends its data and with which method.
pub enum TransactionFormAction<'a> {
    Create(&'a str),
    Update(&'a str),
}

pub fn transaction_form_fields(
    defaults: &TransactionFormDefaults<'_>,
    wallets: &[Wallet],
    categories: &[Category],
) -> Markup {
    let is_expense = matches!(defaults.transaction_type, TransactionType::Expense);
    let amount_str = defaults.amount.map(|amount| format!("{:.2}", amount.abs()));
    let amount_placeholder = amount_str.as_deref().unwrap_or("0.01");
    let description_placeholder = defaults.description.unwrap_or("Description");

    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Transaction type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                div class="flex items-center gap-3"
                {
                    input
                        name="type_"
                        id="transaction-type-expense"
                        type="radio"
                        value="expense"
                        checked[is_expense]
                        required
                        tabindex="0"
                        class=(FORM_RADIO_INPUT_STYLE);

                    label
                        for="transaction-type-expense"
                        class=(FORM_RADIO_LABEL_STYLE)
                    {
                        "Expense"
                    }
                }

                div class="flex items-center gap-3"
                {
                    input
                        name="type_"
                        id="transaction-type-income"
                        type="radio"
                        value="income"
                        checked[!is_expense]
                        required
                        tabindex="0"
                        class=(FORM_RADIO_INPUT_STYLE);

                    label
                        for="transaction-type-income"
                        class=(FORM_RADIO_LABEL_STYLE)
                    {
                        "Income"
                    }
                }
            }
        }

        div
        {
            label
                for="amount"
                class=(FORM_LABEL_STYLE)
            {
                "Amount"
            }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    placeholder=(amount_placeholder)
                    min="0.01"
                    required
                    value=[amount_str.as_deref()]
                    autofocus[defaults.autofocus_amount]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label
                for="date"
                class=(FORM_LABEL_STYLE)
            {
                "Date"
            }

            input
                name="date"
                id="date"
                type="date"
                max=(defaults.max_date)
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="description"
                class=(FORM_LABEL_STYLE)
            {
                "Description"
            }

            input
                name="description"
                id="description"
                type="text"
                placeholder=(description_placeholder)
                value=[defaults.description]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="wallet_id"
                class=(FORM_LABEL_STYLE)
            {
                "Wallet"
            }

            select
                name="wallet_id"
                id="wallet_id"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "Select a wallet" }

                @for wallet in wallets {
                    option value=(wallet.id) selected[Some(wallet.id) == defaults.wallet_id]
                    {
                        (wallet.name)
                    }
                }
            }
        }

        div
        {
            label
                for="category_id"
                class=(FORM_LABEL_STYLE)
            {
                "Category"
            }

            select
                name="category_id"
                id="category_id"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "Select a category" }

                @for category in categories {
                    option value=(category.id) selected[Some(category.id) == defaults.category_id]
                    {
                        (category.name)
                    }
                }
            }
        }
    }
}

/// The complete transaction form, including the submit button.
pub fn transaction_form(
    action: TransactionFormAction<'_>,
    defaults: &TransactionFormDefaults<'_>,
    wallets: &[Wallet],
    categories: &[Category],
) -> Markup {
    let fields = transaction_form_fields(defaults, wallets, categories);
    let spinner = loading_spinner();

    let (hx_post, hx_put, submit_label) = match action {
        TransactionFormAction::Create(endpoint) => (Some(endpoint), None, " Create Transaction"),
        TransactionFormAction::Update(endpoint) => (None, Some(endpoint), " Update Transaction"),
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (fields)

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span
                    id="indicator"
                    class="inline htmx-indicator"
                {
                    (spinner)
                }
                (submit_label)
            }
        }
    }
}
