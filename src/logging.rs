//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, Method, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The number of bytes of a request or response body to include in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Password fields in URL encoded forms are redacted. Multipart bodies
/// (receipt uploads) are passed through untouched and only their size is logged.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };

    if is_multipart(&parts.headers) {
        tracing::info!(
            "Received request: {parts:#?}\nbody: <multipart form, {} bytes>",
            body_bytes.len()
        );
    } else {
        let body_text = String::from_utf8_lossy(&body_bytes);

        if parts.method == Method::POST && is_url_encoded_form(&parts.headers) {
            let display_text = redact_password(&body_text, "password");
            let display_text = redact_password(&display_text, "confirm_password");
            log_body("Received request", &parts, &display_text);
        } else {
            log_body("Received request", &parts, &body_text);
        }
    }

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };
    log_body(
        "Sending response",
        &parts,
        &String::from_utf8_lossy(&body_bytes),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

async fn read_body(body: Body) -> Result<Bytes, Response> {
    axum::body::to_bytes(body, usize::MAX).await.map_err(|error| {
        tracing::error!("could not read body: {error}");
        axum::http::StatusCode::BAD_REQUEST.into_response()
    })
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

fn is_url_encoded_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

fn redact_password(form_text: &str, field_name: &str) -> String {
    let needle = format!("{field_name}=");

    // Match the field only at the start of a key, so "password=" does not
    // match inside "confirm_password=".
    let start = form_text.match_indices(&needle).find_map(|(index, _)| {
        let at_key_start = index == 0 || form_text.as_bytes()[index - 1] == b'&';
        at_key_start.then_some(index)
    });

    let Some(start) = start else {
        return form_text.to_owned();
    };

    let end = form_text[start..]
        .find('&')
        .map(|end| start + end)
        .unwrap_or(form_text.len());

    format!(
        "{}{needle}********{}",
        &form_text[..start],
        &form_text[end..]
    )
}

fn truncate(text: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(text.len());

    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_body(message: &str, parts: &impl std::fmt::Debug, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("{message}: {parts:#?}\nbody: {:}...", truncate(body));
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{message}: {parts:#?}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, middleware, routing::post};
    use axum_test::TestServer;

    use super::{LOG_BODY_LENGTH_LIMIT, logging_middleware, redact_password, truncate};

    #[test]
    fn redacts_password_in_middle_of_form() {
        let form = "email=a%40b.com&password=hunter2&remember_me=on";

        assert_eq!(
            redact_password(form, "password"),
            "email=a%40b.com&password=********&remember_me=on"
        );
    }

    #[test]
    fn redacts_both_password_fields() {
        let form = "email=a%40b.com&password=hunter2&confirm_password=hunter2";

        let redacted = redact_password(form, "password");
        let redacted = redact_password(&redacted, "confirm_password");

        assert_eq!(
            redacted,
            "email=a%40b.com&password=********&confirm_password=********"
        );
    }

    #[test]
    fn leaves_form_without_password_alone() {
        assert_eq!(redact_password("name=Cash", "password"), "name=Cash");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "é".repeat(LOG_BODY_LENGTH_LIMIT);

        let truncated = truncate(&text);

        assert!(truncated.len() <= LOG_BODY_LENGTH_LIMIT);
        assert!(truncated.chars().all(|c| c == 'é'));
    }

    #[tokio::test]
    async fn passes_binary_multipart_body_through_unchanged() {
        let app = Router::new()
            .route("/echo", post(|body: axum::body::Bytes| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let bytes = vec![0xff_u8, 0xd8, 0xff, 0x00, 0x80];

        let response = server
            .post("/echo")
            .content_type("multipart/form-data; boundary=X")
            .bytes(bytes.clone().into())
            .await;

        response.assert_status_ok();
        assert_eq!(response.as_bytes().to_vec(), bytes);
    }
}
