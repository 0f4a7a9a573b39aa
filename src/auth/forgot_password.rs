use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{LINK_STYLE, base, log_in_register},
};

fn forgot_password_view() -> Markup {
    let content = html! {
        div class="space-y-4 text-gray-900 dark:text-white"
        {
            p class="text-justify"
            {
                "Passwords are reset from the machine the server runs on. Stop the \
                server, then run the "
                code { "reset_password" }
                " program with the path to your database file:"
            }

            pre class="p-3 overflow-x-auto text-sm rounded bg-gray-100 dark:bg-gray-700"
            {
                "reset_password --db-path pocketbook.db"
            }

            p class="text-justify"
            {
                "It will ask for the email address of the account and a new password."
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Remembered it? "
                a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE) { "Log in here" }
            }
        }
    };

    base(
        "Forgot Password",
        &[],
        &log_in_register("Forgot your password?", &content),
    )
}

/// Renders a page describing how the user's password can be reset.
pub async fn get_forgot_password_page() -> Response {
    forgot_password_view().into_response()
}
