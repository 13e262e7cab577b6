//! Gemini extraction boundary — sends the masked ledger photo plus a fixed
//! instruction to the vision-language service and returns the parsed table.
//!
//! The service is an opaque collaborator: one request per task, no retry, no
//! caching, no client-side rate limiting. A failed call fails only the task
//! that issued it; the batch coordinator decides what that means.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::error::ExtractError;
use super::parser::parse_table_payload;
use super::types::TableExtraction;
use crate::config::ServiceConfig;

/// Fixed instruction sent with every ledger photo. The service must answer
/// with a `headers`/`rows` JSON payload; rows are variable width because one
/// ledger entry may list several cut lengths of the same material.
const EXTRACTION_INSTRUCTION: &str = "\
이 이미지에는 표 형식의 데이터가 포함되어 있습니다. 당신의 임무는 이 표의 내용을 이해하고 인식하여 구조화된 데이터로 변환하는 것입니다.

## 분석 지침:
1. 반출 내용을 확인하세요 1) 입고 2) 출고
2. 구매방법을 확인하세요 1) 매매 2) 임대
3. 구매 품명(규격)을 확인하세요
ex) 150x150, 200x100, 200x200, 250x175, 250x250, 298x149, 300x150, 294x200, 298x201, 300x300, 350x175, 340x250, 350x350, 400x200, 390x300, 400x400
4. 길이와 갯수를 파악하세요. 조금 이상한 글자가 써있으면 그거입니다.
ex) 12x34 -> 12m, 34개
ex2) 10x12 -> 10m, 12개
ex3) 12.1 -> 12.1m, 1개
길이는 m를 제외하고 float 형식으로 출력하세요.
갯수는 int 형식으로 출력하세요.

이미지 1개당 1개의 행렬로 출력하면 됩니다. 행렬은 반출내용, 구매방법, 구매 품명(규격), 길이1, 갯수1, 길이2, 갯수2, ... 순으로 출력하세요.

## 출력 형식:
다음 JSON 형식으로 정확히 반환해주세요:
{
    \"headers\": [\"반출내용\", \"구매방법\", \"구매 품명(규격)\", \"길이1\", \"갯수1\", \"길이2\", \"갯수2\", ...],
    \"rows\": [
        [\"행1열1값\", \"행1열2값\", \"행1열3값\", ...],
        ...
    ]
}";

/// The extraction collaborator seam. Implementations must be safely callable
/// from several worker threads at once.
pub trait TableExtractor: Send + Sync {
    /// One shot: image bytes in, parsed table out.
    fn extract(&self, image_bytes: &[u8]) -> Result<TableExtraction, ExtractError>;
}

/// Production extraction client for the Gemini `generateContent` REST API.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.api_key,
            &config.model,
            config.timeout_secs,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sniff the payload MIME type from the bytes themselves. Masked pages
    /// are always PNG; unmasked originals may be any supported format.
    fn mime_type(image_bytes: &[u8]) -> &'static str {
        image::guess_format(image_bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or("image/png")
    }
}

impl TableExtractor for GeminiClient {
    fn extract(&self, image_bytes: &[u8]) -> Result<TableExtraction, ExtractError> {
        let _span = tracing::info_span!(
            "table_extract",
            model = %self.model,
            image_size = image_bytes.len(),
        )
        .entered();
        let start = std::time::Instant::now();

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart {
                        inline_data: Some(InlineData {
                            mime_type: Self::mime_type(image_bytes),
                            data: base64::engine::general_purpose::STANDARD.encode(image_bytes),
                        }),
                        text: None,
                    },
                    RequestPart {
                        inline_data: None,
                        text: Some(EXTRACTION_INSTRUCTION),
                    },
                ],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExtractError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    ExtractError::Timeout(self.timeout_secs)
                } else {
                    ExtractError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| ExtractError::MalformedResponse(e.to_string()))?;
        let text = parsed.candidate_text().ok_or_else(|| {
            ExtractError::MalformedResponse("response contained no candidates".into())
        })?;

        let extraction = parse_table_payload(&text)?;

        tracing::info!(
            model = %self.model,
            elapsed_ms = %start.elapsed().as_millis(),
            rows = extraction.rows.len(),
            "table extraction complete"
        );

        Ok(extraction)
    }
}

// ── Wire types ──────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

/// One content part: inline image data or instruction text.
#[derive(Serialize)]
struct RequestPart<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any.
    fn candidate_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

// ── MockExtractor (testing) ─────────────────────────────

/// Mock extraction client — returns a configured table or error text.
pub struct MockExtractor {
    response: Result<String, ()>,
}

impl MockExtractor {
    /// Mock answering every call with the given response text (parsed through
    /// the same fence-stripping path as the real client).
    pub fn with_payload(payload: &str) -> Self {
        Self {
            response: Ok(payload.to_string()),
        }
    }

    /// Mock failing every call with a service error.
    pub fn failing() -> Self {
        Self { response: Err(()) }
    }
}

impl TableExtractor for MockExtractor {
    fn extract(&self, _image_bytes: &[u8]) -> Result<TableExtraction, ExtractError> {
        match &self.response {
            Ok(payload) => parse_table_payload(payload),
            Err(()) => Err(ExtractError::Api {
                status: 503,
                body: "service unavailable".into(),
            }),
        }
    }
}
