//! The registration page for creating a new account.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{Email, PasswordHash, User, ValidatedPassword, create_user, set_auth_cookie},
    category::seed_default_categories,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base,
        email_input, loading_spinner, log_in_register, password_input,
    },
    timezone::get_local_offset,
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="confirm-password" class=(FORM_LABEL_STYLE) { "Confirm Password" }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()];

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

#[derive(Default)]
struct RegistrationErrors<'a> {
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(email: &str, errors: RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #confirm-password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (email_input(email, errors.email))
            (password_input("", PASSWORD_INPUT_MIN_LENGTH, errors.password))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE) { "Log in here" }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = registration_form("", RegistrationErrors::default());
    let content = log_in_register("Create an account", &form);

    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for storing the new user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    /// The email address to register.
    pub email: String,
    /// The new password.
    pub password: String,
    /// Must match `password`.
    pub confirm_password: String,
}

/// Create the user and their starter categories in one SQL transaction.
fn create_user_with_defaults(
    email: Email,
    password_hash: PasswordHash,
    db_connection: &Mutex<Connection>,
) -> Result<User, Error> {
    let mut connection = db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = connection.transaction()?;
    let user = create_user(email, password_hash, &transaction)?;
    seed_default_categories(user.id, &transaction)?;
    transaction.commit()?;

    Ok(user)
}

/// Handler for registration requests via the POST method.
///
/// On success the user is logged in and redirected to the dashboard.
/// Otherwise, the form is returned with error messages next to the
/// offending fields.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let email = match Email::new(&user_data.email) {
        Ok(email) => email,
        Err(error) => {
            return registration_form(
                &user_data.email,
                RegistrationErrors {
                    email: Some(&error.to_string()),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    let validated_password = match ValidatedPassword::new(&user_data.password, &[email.as_str()])
    {
        Ok(password) => password,
        Err(error) => {
            return registration_form(
                email.as_str(),
                RegistrationErrors {
                    password: Some(&error.to_string()),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    if user_data.password != user_data.confirm_password {
        return registration_form(
            email.as_str(),
            RegistrationErrors {
                confirm_password: Some("Passwords do not match"),
                ..Default::default()
            },
        )
        .into_response();
    }

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return error.into_alert_response();
        }
    };

    let user = match create_user_with_defaults(email.clone(), password_hash, &state.db_connection)
    {
        Ok(user) => user,
        Err(Error::DuplicateEmail) => {
            return registration_form(
                email.as_str(),
                RegistrationErrors {
                    email: Some("An account with this email already exists, log in instead."),
                    ..Default::default()
                },
            )
            .into_response();
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            return error.into_alert_response();
        }
    };

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_offset) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    use super::get_register_page;

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::USERS, "hx-post");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
        assert_form_submit_button(&form);
    }
}

#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{
        app_state::create_cookie_key,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, Email, get_user_by_email},
        category::get_categories,
        db::initialize,
        endpoints,
    };

    use super::{RegistrationState, register_user};

    const PASSWORD: &str = "iamtestingwhethericancreateanewuser";

    fn get_test_server() -> (TestServer, Arc<Mutex<Connection>>) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let connection = Arc::new(Mutex::new(connection));

        let state = RegistrationState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: connection.clone(),
        };
        let app = Router::new()
            .route(endpoints::USERS, post(register_user))
            .with_state(state);

        (
            TestServer::try_new(app).expect("Could not create test server."),
            connection,
        )
    }

    fn error_messages(html: &str) -> Vec<String> {
        Html::parse_fragment(html)
            .select(&Selector::parse("p.text-red-500").unwrap())
            .map(|p| p.text().collect::<String>().trim().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn register_creates_user_with_default_categories() {
        let (server, connection) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("email", "New.User@Example.com"),
                ("password", PASSWORD),
                ("confirm_password", PASSWORD),
            ])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("hx-redirect"), endpoints::DASHBOARD_VIEW);
        response.cookie(COOKIE_TOKEN);

        let connection = connection.lock().unwrap();
        let user = get_user_by_email(&Email::new_unchecked("new.user@example.com"), &connection)
            .expect("want the user to be stored with a normalized email");
        assert!(user.password_hash.verify(PASSWORD).unwrap());
        let category_names = get_categories(user.id, &connection)
            .unwrap()
            .into_iter()
            .map(|category| category.name.to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            category_names,
            vec!["Bills", "Food", "Other", "Salary", "Shopping", "Transport"]
        );
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let (server, _) = get_test_server();
        let form = [
            ("email", "someone@example.com"),
            ("password", PASSWORD),
            ("confirm_password", PASSWORD),
        ];
        server
            .post(endpoints::USERS)
            .form(&form)
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let response = server.post(endpoints::USERS).form(&form).await;

        response.assert_status_ok();
        assert_eq!(
            error_messages(&response.text()),
            vec!["An account with this email already exists, log in instead."]
        );
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("email", "not an email"),
                ("password", PASSWORD),
                ("confirm_password", PASSWORD),
            ])
            .await;

        response.assert_status_ok();
        assert_eq!(error_messages(&response.text()).len(), 1);
    }

    #[tokio::test]
    async fn register_rejects_weak_password() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("email", "someone@example.com"),
                ("password", "password"),
                ("confirm_password", "password"),
            ])
            .await;

        response.assert_status_ok();
        assert_eq!(error_messages(&response.text()).len(), 1);
    }

    #[tokio::test]
    async fn register_rejects_mismatched_passwords() {
        let (server, connection) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("email", "someone@example.com"),
                ("password", PASSWORD),
                ("confirm_password", "somethingcompletelydifferent"),
            ])
            .await;

        response.assert_status_ok();
        assert_eq!(
            error_messages(&response.text()),
            vec!["Passwords do not match"]
        );
        let connection = connection.lock().unwrap();
        assert!(
            get_user_by_email(&Email::new_unchecked("someone@example.com"), &connection).is_err()
        );
    }
}
