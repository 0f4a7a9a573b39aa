//! Middleware that guards routes behind a valid auth cookie.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;

use crate::{
    AppState,
    auth::{
        DEFAULT_COOKIE_DURATION,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::log_in_url_for_request,
    },
    timezone::get_local_offset,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

async fn guard(
    state: AuthState,
    request: Request,
    next: Next,
    redirect_to_log_in: impl Fn(String) -> Response,
) -> Response {
    let log_in_url = log_in_url_for_request(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!(
            "Invalid timezone \"{}\", redirecting to log in page.",
            state.local_timezone
        );
        return redirect_to_log_in(log_in_url);
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Could not read cookie jar: {error:?}");
            return redirect_to_log_in(log_in_url);
        }
    };

    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(error) => {
            tracing::debug!("Rejected request to {}: {error}", parts.uri);
            return redirect_to_log_in(log_in_url);
        }
    };

    parts.extensions.insert(user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    let jar = match extend_auth_cookie_duration_if_needed(
        jar.clone(),
        DEFAULT_COOKIE_DURATION,
        local_offset,
    ) {
        Ok(extended_jar) => extended_jar,
        Err(error) => {
            tracing::error!("Could not extend auth cookie: {error}");
            jar
        }
    };

    let (mut parts, body) = response.into_parts();
    for cookie_header in jar.into_response().headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, cookie_header.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Checks for a valid auth cookie before running the request.
///
/// The [UserID](crate::auth::UserID) from the cookie is added to the request
/// extensions, so handlers can take `Extension(user_id): Extension<UserID>`.
/// Requests without a valid cookie are redirected to the log-in page.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, |log_in_url| {
        Redirect::to(&log_in_url).into_response()
    })
    .await
}

/// Same as [auth_guard], but the redirect is sent as an `HX-Redirect` header
/// so htmx can perform a full page navigation.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, |log_in_url| {
        (HxRedirect(log_in_url), StatusCode::OK).into_response()
    })
    .await
}
