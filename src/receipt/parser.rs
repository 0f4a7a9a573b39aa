//! The types shared by every way of reading a receipt.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::Deserialize;
use time::Date;

use crate::{Error, category::CategoryName, transaction::DATE_FORMAT};

/// The image formats a receipt photo may be uploaded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Jpeg,
    Png,
    Webp,
}

impl ImageType {
    /// Match a MIME type such as "image/png", ignoring any parameters.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageType::Jpeg),
            "image/png" => Some(ImageType::Png),
            "image/webp" => Some(ImageType::Webp),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageType::Jpeg => "image/jpeg",
            ImageType::Png => "image/png",
            ImageType::Webp => "image/webp",
        }
    }
}

/// An uploaded photo of a receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptImage {
    pub image_type: ImageType,
    pub bytes: Vec<u8>,
}

/// The fields read from a receipt. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptDraft {
    pub merchant: Option<String>,
    pub total: Option<f64>,
    pub date: Option<Date>,
    pub category: Option<String>,
}

/// The JSON object a parser asks the model to reply with.
#[derive(Debug, Deserialize)]
struct RawDraft {
    #[serde(default)]
    merchant: Option<String>,
    #[serde(default)]
    total: Option<f64>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

impl ReceiptDraft {
    /// Parse a model's reply of the form `{merchant, total, date, category}`.
    ///
    /// The reply may be wrapped in a markdown code fence. Dates that are not
    /// of the form "2025-03-14" are dropped rather than rejected.
    ///
    /// # Errors
    /// Returns [Error::ReceiptParsing] if the reply is not a JSON object.
    pub fn from_reply(reply: &str) -> Result<Self, Error> {
        let json = strip_code_fence(reply);
        let raw: RawDraft = serde_json::from_str(json).map_err(|error| {
            Error::ReceiptParsing(format!("could not parse receipt JSON: {error}"))
        })?;

        Ok(Self {
            merchant: non_blank(raw.merchant),
            total: raw.total.filter(|total| total.is_finite()),
            date: non_blank(raw.date).and_then(|date| Date::parse(&date, DATE_FORMAT).ok()),
            category: non_blank(raw.category),
        })
    }
}

/// Remove a surrounding markdown code fence, with or without a language tag.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();

    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Skip the language tag, e.g. "json", on the opening line.
    let inner = match inner.find('\n') {
        Some(newline) => &inner[newline + 1..],
        None => inner,
    };

    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Reads a receipt image into a draft transaction.
#[async_trait]
pub trait ReceiptParser: Send + Sync + Debug {
    /// Read `image`, suggesting one of `categories` for the purchase.
    async fn parse(
        &self,
        image: ReceiptImage,
        categories: &[CategoryName],
    ) -> Result<ReceiptDraft, Error>;

    /// Whether this parser can read receipts at all.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// The parser used when no receipt API has been configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledReceiptParser;

#[async_trait]
impl ReceiptParser for DisabledReceiptParser {
    async fn parse(
        &self,
        _image: ReceiptImage,
        _categories: &[CategoryName],
    ) -> Result<ReceiptDraft, Error> {
        Err(Error::ReceiptParsingUnavailable)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
