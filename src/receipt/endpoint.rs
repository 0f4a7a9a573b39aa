//! The receipt scanning page and the upload endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{DefaultBodyLimit, FromRef, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::get_categories,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base, dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    receipt::{ImageType, ReceiptImage, ReceiptParser},
    timezone::get_local_date,
    transaction::new_transaction_form,
    wallet::get_wallets,
};

/// The largest receipt image accepted, in bytes.
pub const MAX_RECEIPT_BYTES: usize = 5 * 1024 * 1024;

/// The name of the multipart field holding the image.
const RECEIPT_FIELD: &str = "receipt";

/// Room for the multipart boundaries and headers around the image.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// The request body limit for receipt uploads.
///
/// Slightly larger than [MAX_RECEIPT_BYTES] so that oversized images are
/// reported as too large instead of failing as a malformed upload.
pub fn receipt_upload_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(MAX_RECEIPT_BYTES + MULTIPART_OVERHEAD_BYTES)
}

/// The state needed for scanning receipts.
#[derive(Debug, Clone)]
pub struct ReceiptState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub receipt_parser: Arc<dyn ReceiptParser>,
}

impl FromRef<AppState> for ReceiptState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            receipt_parser: state.receipt_parser.clone(),
        }
    }
}

/// Render the page for uploading a photo of a receipt.
pub async fn get_scan_receipt_page(State(state): State<ReceiptState>) -> Response {
    scan_receipt_view(state.receipt_parser.is_enabled()).into_response()
}

fn scan_receipt_view(is_enabled: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::SCAN_RECEIPT_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Scan a Receipt" }

            @if is_enabled {
                form
                    id="receipt-upload"
                    hx-post=(endpoints::RECEIPTS_API)
                    hx-encoding="multipart/form-data"
                    hx-target="#transaction-form-container"
                    hx-swap="innerHTML"
                    hx-target-error="#alert-container"
                    hx-disabled-elt="find button"
                    hx-indicator="find button"
                    class="w-full space-y-4 mb-6"
                {
                    div
                    {
                        label for="receipt" class=(FORM_LABEL_STYLE) { "Receipt photo" }

                        input
                            id="receipt"
                            name=(RECEIPT_FIELD)
                            type="file"
                            accept="image/jpeg,image/png,image/webp"
                            capture="environment"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span class="inline htmx-indicator" { (loading_spinner()) }
                        "Read Receipt"
                    }
                }

                div id="transaction-form-container" class="w-full" {}
            } @else {
                p id="receipt-scanning-disabled" class="text-sm"
                {
                    "Receipt scanning has not been configured on this server. "
                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                    {
                        "Enter the transaction manually"
                    }
                    " instead."
                }
            }
        }
    };

    base("Scan Receipt", &[dollar_input_styles()], &content)
}

fn multipart_error(error: MultipartError) -> Error {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::ReceiptTooLarge(MAX_RECEIPT_BYTES)
    } else {
        tracing::debug!("could not read multipart upload: {error}");
        Error::MultipartError(error.body_text())
    }
}

/// Read the receipt image from the upload, enforcing the type and size limits.
async fn read_receipt_image(mut multipart: Multipart) -> Result<ReceiptImage, Error> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(RECEIPT_FIELD) {
            continue;
        }

        let image_type = field
            .content_type()
            .and_then(ImageType::from_content_type)
            .ok_or(Error::NotAnImage)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if bytes.len() + chunk.len() > MAX_RECEIPT_BYTES {
                return Err(Error::ReceiptTooLarge(MAX_RECEIPT_BYTES));
            }

            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(Error::MultipartError("the receipt image is empty".to_owned()));
        }

        tracing::debug!("received {} byte {} receipt", bytes.len(), image_type.mime_type());

        return Ok(ReceiptImage { image_type, bytes });
    }

    Err(Error::MultipartError(format!(
        "the upload has no \"{RECEIPT_FIELD}\" field"
    )))
}

/// Read an uploaded receipt and respond with a pre-filled transaction form.
///
/// The response is a form fragment to be swapped into the scan page. Errors
/// are returned as alerts.
pub async fn scan_receipt_endpoint(
    State(state): State<ReceiptState>,
    Extension(user_id): Extension<UserID>,
    multipart: Multipart,
) -> Response {
    let image = match read_receipt_image(multipart).await {
        Ok(image) => image,
        Err(error) => return error.into_alert_response(),
    };

    let today = match get_local_date(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    // The lock must be released before waiting on the parser.
    let lookups = match state.db_connection.lock() {
        Ok(connection) => get_wallets(user_id, &connection).and_then(|wallets| {
            get_categories(user_id, &connection).map(|categories| (wallets, categories))
        }),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };
    let (wallets, categories) = match lookups {
        Ok(lookups) => lookups,
        Err(error) => {
            tracing::error!("could not load wallets and categories: {error}");
            return error.into_alert_response();
        }
    };

    let category_names = categories
        .iter()
        .map(|category| category.name.clone())
        .collect::<Vec<_>>();

    let draft = match state.receipt_parser.parse(image, &category_names).await {
        Ok(draft) => draft,
        Err(error @ Error::ReceiptParsingUnavailable) => return error.into_alert_response(),
        Err(error) => {
            tracing::error!("could not parse receipt: {error}");
            return error.into_alert_response();
        }
    };

    let defaults = draft.to_form_defaults(&categories, today);

    new_transaction_form(&defaults, &wallets, &categories).into_response()
}

#[cfg(test)]
mod receipt_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        Extension, Router,
        extract::State,
        http::StatusCode,
        routing::post,
    };
    use axum_test::{
        TestServer,
        multipart::{MultipartForm, Part},
    };
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        Error,
        category::{CategoryName, seed_default_categories},
        color::Color,
        endpoints,
        receipt::{DisabledReceiptParser, ReceiptDraft, ReceiptImage, ReceiptParser},
        test_utils::{
            assert_valid_html, create_test_user, get_test_connection, parse_html_document,
        },
        wallet::{WalletKind, WalletName, create_wallet},
    };

    use super::{
        MAX_RECEIPT_BYTES, ReceiptState, get_scan_receipt_page, receipt_upload_limit,
        scan_receipt_endpoint,
    };

    /// Returns the same draft for every image.
    #[derive(Debug)]
    struct FixedReceiptParser(ReceiptDraft);

    #[async_trait]
    impl ReceiptParser for FixedReceiptParser {
        async fn parse(
            &self,
            _image: ReceiptImage,
            _categories: &[CategoryName],
        ) -> Result<ReceiptDraft, Error> {
            Ok(self.0.clone())
        }
    }

    fn get_server(parser: Arc<dyn ReceiptParser>) -> TestServer {
        let connection = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &connection);
        seed_default_categories(user_id, &connection).unwrap();
        create_wallet(
            user_id,
            WalletName::new_unchecked("Bank"),
            WalletKind::Bank,
            0.0,
            Color::default(),
            &connection,
        )
        .unwrap();
        let state = ReceiptState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
            receipt_parser: parser,
        };
        let app = Router::new()
            .route(endpoints::RECEIPTS_API, post(scan_receipt_endpoint))
            .layer(receipt_upload_limit())
            .layer(Extension(user_id))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server")
    }

    fn receipt_form(bytes: Vec<u8>, mime_type: &str) -> MultipartForm {
        MultipartForm::new().add_part(
            "receipt",
            Part::bytes(bytes).file_name("receipt").mime_type(mime_type),
        )
    }

    fn cafe_parser() -> Arc<dyn ReceiptParser> {
        Arc::new(FixedReceiptParser(ReceiptDraft {
            merchant: Some("Cafe Nero".to_owned()),
            total: Some(12.5),
            date: Some(date!(2025 - 03 - 01)),
            category: Some("FOOD".to_owned()),
        }))
    }

    #[tokio::test]
    async fn responds_with_prefilled_form() {
        let server = get_server(cafe_parser());

        let response = server
            .post(endpoints::RECEIPTS_API)
            .multipart(receipt_form(vec![0xFF, 0xD8, 0xFF], "image/jpeg"))
            .await;

        response.assert_status_ok();
        let html = Html::parse_fragment(&response.text());
        assert_valid_html(&html);
        let value_of = |selector: &str| {
            html.select(&Selector::parse(selector).unwrap())
                .next()
                .and_then(|element| element.value().attr("value"))
                .map(str::to_owned)
        };
        assert_eq!(value_of("input[name=amount]").as_deref(), Some("12.50"));
        assert_eq!(value_of("input[name=date]").as_deref(), Some("2025-03-01"));
        assert_eq!(value_of("input[name=description]").as_deref(), Some("Cafe Nero"));
        let selected_category = html
            .select(&Selector::parse("select[name=category_id] option[selected]").unwrap())
            .next()
            .expect("want a selected category")
            .text()
            .collect::<String>();
        assert_eq!(selected_category.trim(), "Food");
    }

    #[tokio::test]
    async fn rejects_non_image_upload() {
        let server = get_server(cafe_parser());

        let response = server
            .post(endpoints::RECEIPTS_API)
            .multipart(receipt_form(b"date,amount".to_vec(), "text/csv"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_oversized_image() {
        let server = get_server(cafe_parser());

        let response = server
            .post(endpoints::RECEIPTS_API)
            .multipart(receipt_form(vec![0; MAX_RECEIPT_BYTES + 1], "image/png"))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn disabled_parser_is_unavailable() {
        let server = get_server(Arc::new(DisabledReceiptParser));

        let response = server
            .post(endpoints::RECEIPTS_API)
            .multipart(receipt_form(vec![1, 2, 3], "image/png"))
            .await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn scan_page_shows_upload_form_when_enabled() {
        let state = ReceiptState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
            local_timezone: "Etc/UTC".to_owned(),
            receipt_parser: cafe_parser(),
        };

        let response = get_scan_receipt_page(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let input = html
            .select(&Selector::parse("#receipt-upload input[type=file]").unwrap())
            .next()
            .expect("want a file input");
        assert_eq!(input.value().attr("name"), Some("receipt"));
    }

    #[tokio::test]
    async fn scan_page_explains_when_disabled() {
        let state = ReceiptState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
            local_timezone: "Etc/UTC".to_owned(),
            receipt_parser: Arc::new(DisabledReceiptParser),
        };

        let response = get_scan_receipt_page(State(state)).await;

        let html = parse_html_document(response).await;
        assert!(
            html.select(&Selector::parse("#receipt-scanning-disabled").unwrap())
                .next()
                .is_some()
        );
        assert!(
            html.select(&Selector::parse("#receipt-upload").unwrap())
                .next()
                .is_none()
        );
    }
}
