//! Reads receipts with a Gemini-style `generateContent` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    category::CategoryName,
    receipt::{ReceiptDraft, ReceiptImage, ReceiptParser},
};

/// How long to wait for the model before giving up.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Where and how to reach the generative model.
#[derive(Clone)]
pub struct GenerativeReceiptConfig {
    /// Sent in the `x-goog-api-key` header.
    pub api_key: String,
    /// The base URL of the API, without a trailing slash.
    pub api_url: String,
    /// The model name, e.g. "gemini-1.5-flash".
    pub model: String,
}

impl GenerativeReceiptConfig {
    /// The Google Generative Language API.
    pub const DEFAULT_API_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    /// A fast multimodal model that handles receipt photos well.
    pub const DEFAULT_MODEL: &'static str = "gemini-1.5-flash";

    /// A config for the default API and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: Self::DEFAULT_API_URL.to_owned(),
            model: Self::DEFAULT_MODEL.to_owned(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

// The API key must never end up in the logs.
impl std::fmt::Debug for GenerativeReceiptConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeReceiptConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// The text of the first candidate's parts, joined together.
    fn reply_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<String>();

        (!text.trim().is_empty()).then_some(text)
    }
}

fn build_prompt(categories: &[CategoryName]) -> String {
    let category_list = categories
        .iter()
        .map(|category| format!("\"{category}\""))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are reading a photo of a purchase receipt. Reply with only a JSON object \
        with these keys:\n\
        - \"merchant\": the name of the shop, or null\n\
        - \"total\": the total amount paid as a number without currency symbols, or null\n\
        - \"date\": the purchase date as YYYY-MM-DD, or null\n\
        - \"category\": the best match from [{category_list}], or null\n\
        Do not include any other text."
    )
}

/// A [ReceiptParser] backed by a generative model that accepts inline images.
#[derive(Debug, Clone)]
pub struct GenerativeReceiptParser {
    client: Client,
    config: GenerativeReceiptConfig,
}

impl GenerativeReceiptParser {
    /// Create a parser for the model described by `config`.
    ///
    /// # Errors
    /// Returns [Error::ReceiptParsing] if the HTTP client cannot be created.
    pub fn new(config: GenerativeReceiptConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| {
                Error::ReceiptParsing(format!("could not create HTTP client: {error}"))
            })?;

        Ok(Self { client, config })
    }

    fn build_request(&self, image: &ReceiptImage, categories: &[CategoryName]) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: build_prompt(categories),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.image_type.mime_type(),
                            data: STANDARD.encode(&image.bytes),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.0,
            },
        }
    }
}

#[async_trait]
impl ReceiptParser for GenerativeReceiptParser {
    async fn parse(
        &self,
        image: ReceiptImage,
        categories: &[CategoryName],
    ) -> Result<ReceiptDraft, Error> {
        let request = self.build_request(&image, categories);

        tracing::debug!(
            "sending {} byte {} receipt to {}",
            image.bytes.len(),
            image.image_type.mime_type(),
            self.config.model
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| Error::ReceiptParsing(format!("request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ReceiptParsing(format!(
                "API responded with {status}: {body}"
            )));
        }

        let reply = response
            .json::<GenerateResponse>()
            .await
            .map_err(|error| Error::ReceiptParsing(format!("invalid API response: {error}")))?
            .reply_text()
            .ok_or_else(|| Error::ReceiptParsing("the model gave an empty reply".to_owned()))?;

        ReceiptDraft::from_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        category::CategoryName,
        receipt::{ImageType, ReceiptImage},
    };

    use super::{
        GenerateResponse, GenerativeReceiptConfig, GenerativeReceiptParser, build_prompt,
    };

    #[test]
    fn endpoint_includes_model() {
        let config = GenerativeReceiptConfig {
            api_key: "secret".to_owned(),
            api_url: "http://localhost:8080/v1beta/".to_owned(),
            model: "test-model".to_owned(),
        };

        assert_eq!(
            config.endpoint(),
            "http://localhost:8080/v1beta/models/test-model:generateContent"
        );
    }

    #[test]
    fn debug_hides_api_key() {
        let config = GenerativeReceiptConfig::new("super-secret-key");

        assert!(!format!("{config:?}").contains("super-secret-key"));
    }

    #[test]
    fn prompt_lists_categories() {
        let prompt = build_prompt(&[
            CategoryName::new_unchecked("Food"),
            CategoryName::new_unchecked("Bills"),
        ]);

        assert!(prompt.contains("[\"Food\", \"Bills\"]"), "{prompt}");
    }

    #[test]
    fn request_inlines_base64_image() {
        let parser = GenerativeReceiptParser::new(GenerativeReceiptConfig::new("key")).unwrap();
        let image = ReceiptImage {
            image_type: ImageType::Png,
            bytes: b"hello".to_vec(),
        };

        let request = serde_json::to_value(parser.build_request(&image, &[])).unwrap();

        let inline_data = &request["contents"][0]["parts"][1]["inline_data"];
        assert_eq!(inline_data["mime_type"], "image/png");
        assert_eq!(inline_data["data"], "aGVsbG8=");
        assert_eq!(
            request["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn reply_text_joins_first_candidate_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "{\"total\":"}, {"text": " 3}"}]}}]}"#,
        )
        .unwrap();

        assert_eq!(response.reply_text().as_deref(), Some("{\"total\": 3}"));
    }

    #[test]
    fn reply_text_is_none_without_candidates() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();

        assert_eq!(response.reply_text(), None);
    }
}
