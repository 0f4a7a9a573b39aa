//! The forms for creating a budget and changing its limit.

use maud::{Markup, html};
use time::Date;

use crate::{
    category::Category,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        loading_spinner,
    },
    month::format_month_query,
};

fn limit_input(limit: Option<f64>) -> Markup {
    let value = limit.map(|limit| format!("{limit:.2}"));

    html! {
        div
        {
            label for="limit" class=(FORM_LABEL_STYLE) { "Monthly limit" }

            div class="input-wrapper w-full"
            {
                input
                    name="limit"
                    id="limit"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    value=[value]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

fn submit_button(label: &str) -> Markup {
    html! {
        button type="submit" class=(BUTTON_PRIMARY_STYLE)
        {
            span class="inline htmx-indicator" { (loading_spinner()) }
            (label)
        }
    }
}

/// The form for creating a budget for one of `categories`.
pub(super) fn new_budget_form(categories: &[Category], month: Date) -> Markup {
    if categories.is_empty() {
        return html! {
            p id="missing-prerequisites" class="text-sm"
            {
                "A budget needs a category. "
                a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE) { "Create a category" }
                " first."
            }
        };
    }

    html! {
        form
            hx-post=(endpoints::POST_BUDGET)
            hx-target-error="#alert-container"
            hx-disabled-elt="find button"
            hx-indicator="find button"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select
                    id="category_id"
                    name="category_id"
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for category in categories {
                        option value=(category.id) { (category.name) }
                    }
                }
            }

            div
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month" }

                input
                    id="month"
                    name="month"
                    type="month"
                    value=(format_month_query(month))
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (limit_input(None))

            (submit_button("Create Budget"))
        }
    }
}

/// The form for changing the limit of an existing budget.
pub(super) fn budget_limit_form(update_url: &str, limit: f64) -> Markup {
    html! {
        form
            hx-put=(update_url)
            hx-target-error="#alert-container"
            hx-disabled-elt="find button"
            hx-indicator="find button"
            class="w-full space-y-4 md:space-y-6"
        {
            (limit_input(Some(limit)))

            (submit_button("Update Budget"))
        }
    }
}
