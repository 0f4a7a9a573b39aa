//! Pocketbook is a web app for tracking personal finances.
//!
//! Users record income and expenses against wallets and categories, set
//! monthly spending caps per category, and view aggregated reports. Receipts
//! can be photographed and parsed into draft transactions by a generative AI
//! endpoint.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod budget;
mod category;
mod color;
mod dashboard;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod month;
mod navigation;
mod not_found;
mod pagination;
mod receipt;
mod report;
mod routing;
mod timezone;
mod transaction;
mod wallet;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{Email, PasswordHash, User, UserID, ValidatedPassword};
pub use auth::{get_user_by_email, update_password};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use receipt::{
    DisabledReceiptParser, GenerativeReceiptConfig, GenerativeReceiptParser, ReceiptParser,
};
pub use routing::build_router;
pub use timezone::get_local_offset;

use crate::{
    alert::Alert, category::CategoryId, internal_server_error::InternalServerError,
    not_found::get_404_not_found_response, wallet::WalletId,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no auth token in the cookie jar")]
    CookieMissing,

    /// The auth token cookie could not be decoded.
    #[error("the auth token could not be decoded")]
    InvalidToken,

    /// The auth token has passed its expiry date.
    #[error("the auth token has expired")]
    TokenExpired,

    /// Extending a date time would have overflowed.
    #[error("date time arithmetic overflowed")]
    DateOverflow,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string is not a usable email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// A user with the email address is already registered.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An empty string was used to name a wallet.
    #[error("Wallet name cannot be empty")]
    EmptyWalletName,

    /// An empty string was used to name a category.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// The string is not a hex color of the form `#rrggbb`.
    #[error("\"{0}\" is not a color of the form #rrggbb")]
    InvalidColor(String),

    /// A transaction or budget amount was zero, negative or not a number.
    #[error("{0} is not a valid amount, amounts must be greater than zero")]
    InvalidAmount(f64),

    /// A wallet balance was infinite or not a number.
    #[error("{0} is not a valid balance")]
    InvalidBalance(f64),

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The start of a date range came after its end.
    #[error("the date range {0} to {1} ends before it starts")]
    InvalidDateRange(Date, Date),

    /// A month string could not be parsed as `YYYY-MM`.
    #[error("\"{0}\" is not a month of the form YYYY-MM")]
    InvalidMonth(String),

    /// The wallet ID does not refer to one of the user's wallets.
    #[error("the wallet ID {0} does not refer to a valid wallet")]
    InvalidWallet(WalletId),

    /// The category ID does not refer to one of the user's categories.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// The user already has a wallet with this name.
    #[error("the wallet \"{0}\" already exists")]
    DuplicateWalletName(String),

    /// The user already has a category with this name.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// A budget already exists for the category and month.
    #[error("a budget already exists for this category and month")]
    DuplicateBudget,

    /// Tried to delete a wallet that still has transactions.
    #[error("the wallet still has transactions")]
    WalletInUse,

    /// Tried to delete a category that still has transactions.
    #[error("the category still has transactions")]
    CategoryInUse,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a wallet that does not exist
    #[error("tried to update a wallet that is not in the database")]
    UpdateMissingWallet,

    /// Tried to delete a wallet that does not exist
    #[error("tried to delete a wallet that is not in the database")]
    DeleteMissingWallet,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,

    /// The multipart form could not be parsed.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The uploaded receipt is not a supported image type.
    #[error("File is not a JPEG, PNG or WebP image")]
    NotAnImage,

    /// The uploaded receipt is larger than the upload limit.
    #[error("The receipt image is larger than {0} bytes")]
    ReceiptTooLarge(usize),

    /// No receipt parsing endpoint has been configured.
    #[error("receipt parsing is not configured on this server")]
    ReceiptParsingUnavailable,

    /// The receipt parsing endpoint failed or returned something unusable.
    #[error("could not parse the receipt: {0}")]
    ReceiptParsing(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        let (status_code, message, details) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid Timezone Settings",
                format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            ),
            Error::FutureDate(date) => (
                StatusCode::BAD_REQUEST,
                "Invalid transaction date",
                format!("{date} is a date in the future, which is not allowed."),
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                "Invalid amount",
                format!("{amount} is not a valid amount. Enter an amount greater than zero."),
            ),
            Error::InvalidBalance(balance) => (
                StatusCode::BAD_REQUEST,
                "Invalid balance",
                format!("{balance} is not a valid balance. Enter a finite number."),
            ),
            Error::InvalidDateRange(from, to) => (
                StatusCode::BAD_REQUEST,
                "Invalid date range",
                format!("The start date {from} must be on or before the end date {to}."),
            ),
            Error::InvalidMonth(month) => (
                StatusCode::BAD_REQUEST,
                "Invalid month",
                format!("\"{month}\" is not a month, use the form YYYY-MM."),
            ),
            Error::InvalidWallet(wallet_id) => (
                StatusCode::BAD_REQUEST,
                "Invalid wallet",
                format!("Could not find a wallet with the ID {wallet_id}."),
            ),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                "Invalid category",
                format!("Could not find a category with the ID {category_id}."),
            ),
            Error::InvalidColor(color) => (
                StatusCode::BAD_REQUEST,
                "Invalid color",
                format!("\"{color}\" is not a color, pick one with the color picker."),
            ),
            Error::EmptyWalletName | Error::EmptyCategoryName => (
                StatusCode::BAD_REQUEST,
                "Missing name",
                "Enter a name that is not just whitespace.".to_owned(),
            ),
            Error::DuplicateWalletName(name) => (
                StatusCode::BAD_REQUEST,
                "Duplicate wallet name",
                format!(
                    "The wallet \"{name}\" already exists. \
                    Choose a different name, or edit the existing wallet."
                ),
            ),
            Error::DuplicateCategoryName(name) => (
                StatusCode::BAD_REQUEST,
                "Duplicate category name",
                format!(
                    "The category \"{name}\" already exists. \
                    Choose a different name, or edit the existing category."
                ),
            ),
            Error::DuplicateBudget => (
                StatusCode::BAD_REQUEST,
                "Duplicate budget",
                "This category already has a budget for that month. Edit the existing budget \
                instead."
                    .to_owned(),
            ),
            Error::WalletInUse => (
                StatusCode::CONFLICT,
                "Could not delete wallet",
                "The wallet still has transactions. \
                Move or delete its transactions before deleting the wallet."
                    .to_owned(),
            ),
            Error::CategoryInUse => (
                StatusCode::CONFLICT,
                "Could not delete category",
                "The category still has transactions. \
                Recategorize or delete its transactions before deleting the category."
                    .to_owned(),
            ),
            Error::UpdateMissingWallet => (
                StatusCode::NOT_FOUND,
                "Could not update wallet",
                "The wallet could not be found.".to_owned(),
            ),
            Error::DeleteMissingWallet => (
                StatusCode::NOT_FOUND,
                "Could not delete wallet",
                "The wallet could not be found. \
                Try refreshing the page to see if the wallet has already been deleted."
                    .to_owned(),
            ),
            Error::UpdateMissingCategory => (
                StatusCode::NOT_FOUND,
                "Could not update category",
                "The category could not be found.".to_owned(),
            ),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                "Could not delete category",
                "The category could not be found. \
                Try refreshing the page to see if the category has already been deleted."
                    .to_owned(),
            ),
            Error::UpdateMissingTransaction => (
                StatusCode::NOT_FOUND,
                "Could not update transaction",
                "The transaction could not be found.".to_owned(),
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                "Could not delete transaction",
                "The transaction could not be found. \
                Try refreshing the page to see if the transaction has already been deleted."
                    .to_owned(),
            ),
            Error::UpdateMissingBudget => (
                StatusCode::NOT_FOUND,
                "Could not update budget",
                "The budget could not be found.".to_owned(),
            ),
            Error::DeleteMissingBudget => (
                StatusCode::NOT_FOUND,
                "Could not delete budget",
                "The budget could not be found. \
                Try refreshing the page to see if the budget has already been deleted."
                    .to_owned(),
            ),
            Error::NotAnImage => (
                StatusCode::BAD_REQUEST,
                "Unsupported file type",
                "Upload a photo of the receipt as a JPEG, PNG or WebP image.".to_owned(),
            ),
            Error::ReceiptTooLarge(limit) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Receipt too large",
                format!(
                    "The image must be smaller than {} MiB.",
                    limit / (1024 * 1024)
                ),
            ),
            Error::MultipartError(_) => (
                StatusCode::BAD_REQUEST,
                "Could not read upload",
                "The uploaded file could not be read. Try uploading it again.".to_owned(),
            ),
            Error::ReceiptParsingUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Receipt scanning unavailable",
                "Receipt scanning has not been configured on this server. \
                Enter the transaction manually instead."
                    .to_owned(),
            ),
            Error::ReceiptParsing(_) => (
                StatusCode::BAD_GATEWAY,
                "Could not read receipt",
                "The receipt could not be read. Try a clearer photo, or enter the \
                transaction manually."
                    .to_owned(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
                "An unexpected error occurred, check the server logs for more details.".to_owned(),
            ),
        };

        (
            status_code,
            Alert::Error {
                message: message.to_owned(),
                details,
            },
        )
            .into_response()
    }
}
