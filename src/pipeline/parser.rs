//! Extraction payload parsing — code-fence stripping and schema checks.
//!
//! The vision-language service is instructed to answer with bare JSON, but
//! models routinely wrap the payload in a ``` code fence. The fence is
//! stripped before parsing; anything that is not valid JSON with a `rows`
//! field after stripping is a malformed response.

use std::sync::OnceLock;

use regex::Regex;

use super::error::ExtractError;
use super::types::TableExtraction;

/// Leading/trailing code-fence markers, with or without a `json` tag.
fn fence_re() -> &'static Regex {
    static FENCE_RE: OnceLock<Regex> = OnceLock::new();
    FENCE_RE.get_or_init(|| Regex::new(r"^```(?:json)?\s*|\s*```$").expect("fence regex"))
}

/// Strip a surrounding code fence, if present.
pub fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("```") {
        fence_re().replace_all(trimmed, "").trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse the service's response text into a [`TableExtraction`].
pub fn parse_table_payload(raw: &str) -> Result<TableExtraction, ExtractError> {
    let payload = strip_code_fence(raw);
    serde_json::from_str(&payload).map_err(|e| ExtractError::MalformedResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "headers": ["반출내용", "구매방법", "구매 품명(규격)", "길이1", "갯수1"],
        "rows": [["입고", "매매", "200x200", 12.1, 1]]
    }"#;

    #[test]
    fn parses_bare_json() {
        let extraction = parse_table_payload(PAYLOAD).unwrap();
        assert_eq!(extraction.headers.len(), 5);
        assert_eq!(extraction.rows.len(), 1);
    }

    #[test]
    fn strips_plain_fence() {
        let fenced = format!("```\n{PAYLOAD}\n```");
        let extraction = parse_table_payload(&fenced).unwrap();
        assert_eq!(extraction.rows[0][0], serde_json::json!("입고"));
    }

    #[test]
    fn strips_json_tagged_fence() {
        let fenced = format!("```json\n{PAYLOAD}\n```");
        let extraction = parse_table_payload(&fenced).unwrap();
        assert_eq!(extraction.rows.len(), 1);
    }

    #[test]
    fn fenced_and_unfenced_parse_identically() {
        let bare = parse_table_payload(PAYLOAD).unwrap();
        let fenced = parse_table_payload(&format!("```json\n{PAYLOAD}\n```")).unwrap();
        assert_eq!(bare.headers, fenced.headers);
        assert_eq!(bare.rows, fenced.rows);
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let padded = format!("\n\n  ```json\n{PAYLOAD}\n```  \n");
        assert!(parse_table_payload(&padded).is_ok());
    }

    #[test]
    fn non_json_is_malformed() {
        let result = parse_table_payload("I could not read the table, sorry.");
        assert!(matches!(result, Err(ExtractError::MalformedResponse(_))));
    }

    #[test]
    fn missing_rows_field_is_malformed() {
        let result = parse_table_payload(r#"{"headers": ["반출내용"]}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("rows"), "error should name the field: {err}");
    }

    #[test]
    fn fence_without_json_body_is_malformed() {
        let result = parse_table_payload("```json\n```");
        assert!(matches!(result, Err(ExtractError::MalformedResponse(_))));
    }

    #[test]
    fn strip_does_not_touch_interior_backticks() {
        let stripped = strip_code_fence("{\"rows\": [[\"a```b\"]]}");
        assert!(stripped.contains("a```b"));
    }
}
