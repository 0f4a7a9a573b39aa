//! Works out where to send the user after they log in.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Only same-origin paths are allowed, and never the log-in page itself.
fn is_safe_redirect_path(path_and_query: &str) -> bool {
    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return false;
    }

    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);

    path != endpoints::LOG_IN_VIEW && !path.starts_with("/api")
}

/// Reduce `raw_url` to a local path and query, or `None` if it could send
/// the user off-site or back to the log-in page.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    let path_and_query = uri.path_and_query()?.as_str();
    is_safe_redirect_path(path_and_query).then(|| path_and_query.to_owned())
}

/// `HX-Current-URL` is an absolute URL, so only its path and query are kept.
fn normalize_hx_current_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_path(path_and_query).then(|| path_and_query.to_owned())
}

/// The log-in page URL with `redirect_target` in its query string.
pub(crate) fn log_in_url_with_redirect(redirect_target: &str) -> String {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(query) => format!("{}?{query}", endpoints::LOG_IN_VIEW),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}

/// Build the log-in URL for a request that failed authentication.
///
/// Page requests come back to the page they asked for. htmx requests to the
/// API come back to the page the user was on, taken from `HX-Current-URL`.
/// Anything else falls back to the dashboard.
pub(crate) fn log_in_url_for_request(request: &Request) -> String {
    let target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_headers(request)
    } else {
        request
            .uri()
            .path_and_query()
            .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
    };

    let target = target.unwrap_or_else(|| {
        tracing::warn!(
            "No usable redirect target for {}, falling back to the dashboard.",
            request.uri()
        );
        endpoints::DASHBOARD_VIEW.to_owned()
    });

    log_in_url_with_redirect(&target)
}

fn redirect_target_from_hx_headers(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        return None;
    }

    let current_url = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())?;

    normalize_hx_current_url(current_url)
}
