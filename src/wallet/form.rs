//! The form shared by the new and edit wallet pages.

use maud::{Markup, html};

use crate::{
    color::Color,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_COLOR_INPUT_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
    },
    wallet::{Wallet, WalletKind},
};

/// Where the form sends its data and with which method.
pub(super) enum WalletFormAction<'a> {
    Create(&'a str),
    Update(&'a str),
}

pub(super) fn wallet_form(action: WalletFormAction, wallet: Option<&Wallet>) -> Markup {
    let name = wallet.map(|wallet| wallet.name.as_ref()).unwrap_or_default();
    let kind = wallet.map(|wallet| wallet.kind).unwrap_or_default();
    let balance = wallet.map(|wallet| wallet.balance).unwrap_or(0.0);
    let color = wallet
        .map(|wallet| wallet.color.as_str())
        .unwrap_or(Color::DEFAULT);

    let (balance_label, submit_label) = match action {
        WalletFormAction::Create(_) => ("Opening Balance", "Create Wallet"),
        WalletFormAction::Update(_) => ("Balance", "Update Wallet"),
    };

    let fields = html! {
        div
        {
            label for="name" class=(FORM_LABEL_STYLE) { "Name" }

            input
                id="name"
                type="text"
                name="name"
                placeholder="Everyday Account"
                value=(name)
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        fieldset
        {
            legend class=(FORM_LABEL_STYLE) { "Type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                @for option in WalletKind::ALL {
                    @let id = format!("kind-{}", option.as_str());

                    div class="flex items-center gap-3"
                    {
                        input
                            id=(id)
                            type="radio"
                            name="kind"
                            value=(option.as_str())
                            checked[option == kind]
                            required
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (option.label()) }
                    }
                }
            }
        }

        div
        {
            label for="balance" class=(FORM_LABEL_STYLE) { (balance_label) }

            div class="input-wrapper"
            {
                input
                    id="balance"
                    type="number"
                    name="balance"
                    step="0.01"
                    value=(balance)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
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
        WalletFormAction::Create(endpoint) => html! {
            form
                hx-post=(endpoint)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (fields)
            }
        },
        WalletFormAction::Update(endpoint) => html! {
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
