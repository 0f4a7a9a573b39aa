//! The form shared by the new and edit category pages.

use maud::{Markup, html};

use crate::{
    category::Category,
    color::Color,
    html::{BUTTON_PRIMARY_STYLE, FORM_COLOR_INPUT_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
};

pub(super) enum CategoryFormAction<'a> {
    Create(&'a str),
    Update(&'a str),
}

pub(super) fn category_form(action: CategoryFormAction, category: Option<&Category>) -> Markup {
    let name = category
        .map(|category| category.name.as_ref())
        .unwrap_or_default();
    let color = category
        .map(|category| category.color.as_str())
        .unwrap_or(Color::DEFAULT);

    let submit_label = match action {
        CategoryFormAction::Create(_) => "Create Category",
        CategoryFormAction::Update(_) => "Update Category",
    };

    let fields = html! {
        div
        {
            label for="name" class=(FORM_LABEL_STYLE) { "Name" }

            input
                id="name"
                type="text"
                name="name"
                placeholder="Groceries"
                value=(name)
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="color" class=(FORM_LABEL_STYLE) { "Color" }

            input
                id="color"
                type="color"
                name="color"
                value=(color)
                required
                class=(FORM_COLOR_INPUT_STYLE);
        }

        button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
    };

    match action {
        CategoryFormAction::Create(endpoint) => html! {
            form
                hx-post=(endpoint)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (fields)
            }
        },
        CategoryFormAction::Update(endpoint) => html! {
            form
                hx-put=(endpoint)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (fields)
            }
        },
    }
}
