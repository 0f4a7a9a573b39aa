//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as an out-of-band swap of the `#alert-container` div
//! defined in [crate::html::base], so they show up regardless of where the
//! triggering htmx request was targeted.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};

/// A message to show the user in the alert container.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with extra details.
    #[allow(dead_code)]
    Success { message: String, details: String },
    /// A success message on its own.
    SuccessSimple { message: String },
    /// An error message with details on how to fix the problem.
    Error { message: String, details: String },
    /// An error message on its own.
    #[allow(dead_code)]
    ErrorSimple { message: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (is_error, message, details) = match self {
            Alert::Success { message, details } => (false, message, Some(details)),
            Alert::SuccessSimple { message } => (false, message, None),
            Alert::Error { message, details } => (true, message, Some(details)),
            Alert::ErrorSimple { message } => (true, message, None),
        };

        let style = if is_error {
            "p-4 rounded-lg shadow-lg text-red-800 bg-red-50 border border-red-300 \
            dark:bg-gray-800 dark:text-red-400 dark:border-red-800"
        } else {
            "p-4 rounded-lg shadow-lg text-green-800 bg-green-50 border border-green-300 \
            dark:bg-gray-800 dark:text-green-400 dark:border-green-800"
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div role="alert" class=(style)
                {
                    div class="flex justify-between items-start gap-4"
                    {
                        div
                        {
                            p class="font-semibold" { (message) }

                            @if let Some(details) = details.filter(|details| !details.is_empty()) {
                                p class="mt-1 text-sm" { (details) }
                            }
                        }

                        button
                            type="button"
                            aria-label="Dismiss"
                            class="font-bold bg-transparent border-none cursor-pointer"
                            onclick="this.closest('[role=alert]').remove()"
                        {
                            "×"
                        }
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        (StatusCode::OK, Html(self.into_html().into_string())).into_response()
    }
}
