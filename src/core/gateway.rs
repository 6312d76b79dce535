//! Request gateway to the Generative Language API.
//!
//! One POST per user turn, no retries. The bulk of this module is response
//! classification: separating safety blocks, quota problems, credential
//! rejections and truncation so the user always sees an actionable message.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::GenerationConfig;
use crate::core::credentials::ApiKey;

/// Finish reasons that still carry usable output.
const ACCEPTABLE_FINISH: [&str; 2] = ["STOP", "MAX_TOKENS"];

/// Harm categories blocked at medium probability and above, sent with every
/// request.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// One reported safety category/probability pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyRating {
    pub category: String,
    pub probability: String,
}

#[derive(Error, Debug)]
pub enum GenerationError {
    /// Network-level failure before any response was classified.
    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    /// The bounded wait elapsed.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Non-2xx response. `message` comes from the remote error payload when
    /// present, else the status line.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The prompt or the candidate was withheld.
    #[error("generation blocked: {reason}")]
    Blocked {
        reason: String,
        /// Populated when the block reason is SAFETY.
        safety: Vec<SafetyRating>,
    },

    /// Structurally fine response with no extractable text.
    #[error("response contained no text (truncated: {truncated})")]
    EmptyContent { truncated: bool },
}

/// Best-effort hints extracted from remote error text.
///
/// The remote API's error vocabulary is not contractually stable, so these
/// substring matches are advisory only — never the sole signal for anything
/// beyond messaging and key re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorHint {
    /// The credential was rejected; the caller should demand a new key.
    InvalidKey,
    /// Usage quota exhausted; informational only, no state change.
    QuotaExhausted,
    Other,
}

/// Known remote error substrings, matched case-insensitively and in order.
/// "invalid" is deliberately broad — key problems dominate 400-class errors
/// from this endpoint in practice.
const INVALID_KEY_MARKERS: [&str; 3] = ["api key", "permission_denied", "invalid"];
const QUOTA_MARKERS: [&str; 2] = ["quota", "resource_exhausted"];

/// Classify remote error text into a [`RemoteErrorHint`].
pub fn classify_remote_message(message: &str) -> RemoteErrorHint {
    let lower = message.to_lowercase();
    if INVALID_KEY_MARKERS.iter().any(|m| lower.contains(m)) {
        RemoteErrorHint::InvalidKey
    } else if QUOTA_MARKERS.iter().any(|m| lower.contains(m)) {
        RemoteErrorHint::QuotaExhausted
    } else {
        RemoteErrorHint::Other
    }
}

impl GenerationError {
    /// Hint derived from this error's remote message, if it carries one.
    pub fn remote_hint(&self) -> RemoteErrorHint {
        match self {
            GenerationError::Http { message, .. } => classify_remote_message(message),
            _ => RemoteErrorHint::Other,
        }
    }
}

/// Client for the generation endpoint. One instance per accepted key.
pub struct GenerationClient {
    api_key: ApiKey,
    model: String,
    endpoint_base: String,
    max_output_tokens: u32,
    timeout_secs: u64,
    client: Client,
}

impl GenerationClient {
    pub fn new(config: &GenerationConfig, api_key: ApiKey) -> Self {
        let client = crate::core::http_client(Duration::from_secs(config.request_timeout_secs));
        Self {
            api_key,
            model: config.model.clone(),
            endpoint_base: config.endpoint_base.clone(),
            max_output_tokens: config.max_output_tokens,
            timeout_secs: config.request_timeout_secs,
            client,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The key goes in the query string, matching the upstream endpoint's
    /// common usage for API-key auth.
    fn request_url(&self) -> String {
        format!(
            "{}{}:generateContent?key={}",
            self.endpoint_base,
            self.model,
            self.api_key.expose()
        )
    }

    fn request_body(&self, prompt: &str) -> Value {
        let safety_settings: Vec<Value> = SAFETY_CATEGORIES
            .iter()
            .map(|category| {
                json!({
                    "category": category,
                    "threshold": "BLOCK_MEDIUM_AND_ABOVE",
                })
            })
            .collect();

        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "safetySettings": safety_settings,
            "generationConfig": { "maxOutputTokens": self.max_output_tokens },
        })
    }

    /// Issue a single generation request. At most one network attempt; the
    /// caller is responsible for not overlapping calls within a turn.
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = self.request_url();
        log::debug!(
            "Sending generation request: model={}, prompt={} chars",
            self.model,
            prompt.len()
        );

        let resp = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        // Error payloads are JSON too; tolerate anything else
        let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = payload["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| {
                    format!(
                        "{} {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("request failed")
                    )
                });
            log::warn!("Generation request rejected: HTTP {status}: {message}");
            return Err(GenerationError::Http {
                status: status.as_u16(),
                message,
            });
        }

        classify_success_payload(&payload)
    }

    fn transport_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            GenerationError::Transport(e)
        }
    }
}

/// Classify a 2xx payload into text or a categorized error, in the fixed
/// priority order: missing candidate → unacceptable finish reason → missing
/// text → ok.
fn classify_success_payload(payload: &Value) -> Result<String, GenerationError> {
    let candidate = payload["candidates"]
        .as_array()
        .and_then(|arr| arr.first());

    let Some(candidate) = candidate else {
        let reason = payload["promptFeedback"]["blockReason"]
            .as_str()
            .map(str::to_string)
            .or_else(|| {
                // Mirrors the upstream check on the (absent) first candidate
                (payload["candidates"][0]["finishReason"] == "SAFETY")
                    .then(|| "SAFETY".to_string())
            })
            .unwrap_or_else(|| "no response content received".to_string());
        return Err(GenerationError::Blocked {
            reason,
            safety: Vec::new(),
        });
    };

    let finish = candidate["finishReason"].as_str();
    let finish_acceptable =
        finish.is_none() || finish.is_some_and(|f| ACCEPTABLE_FINISH.contains(&f));

    if !finish_acceptable {
        let reason = finish.unwrap_or_default().to_string();
        let safety = if reason == "SAFETY" {
            candidate["safetyRatings"]
                .as_array()
                .map(|ratings| {
                    ratings
                        .iter()
                        .filter_map(|r| serde_json::from_value(r.clone()).ok())
                        .collect()
                })
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        return Err(GenerationError::Blocked { reason, safety });
    }

    match candidate["content"]["parts"][0]["text"].as_str() {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(GenerationError::EmptyContent {
            truncated: finish == Some("MAX_TOKENS"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_invalid_key_messages() {
        assert_eq!(
            classify_remote_message("API key not valid. Please pass a valid API key."),
            RemoteErrorHint::InvalidKey
        );
        assert_eq!(
            classify_remote_message("PERMISSION_DENIED: caller lacks access"),
            RemoteErrorHint::InvalidKey
        );
        assert_eq!(
            classify_remote_message("Request contains an invalid argument"),
            RemoteErrorHint::InvalidKey
        );
    }

    #[test]
    fn test_classify_quota_messages() {
        assert_eq!(
            classify_remote_message("Quota exceeded for requests per minute"),
            RemoteErrorHint::QuotaExhausted
        );
        assert_eq!(
            classify_remote_message("RESOURCE_EXHAUSTED"),
            RemoteErrorHint::QuotaExhausted
        );
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(
            classify_remote_message("api KEY problem"),
            RemoteErrorHint::InvalidKey
        );
        assert_eq!(
            classify_remote_message("QUOTA"),
            RemoteErrorHint::QuotaExhausted
        );
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(
            classify_remote_message("Internal server error"),
            RemoteErrorHint::Other
        );
        assert_eq!(classify_remote_message(""), RemoteErrorHint::Other);
    }

    #[test]
    fn test_no_candidates_with_block_reason() {
        let payload = serde_json::json!({
            "candidates": [],
            "promptFeedback": { "blockReason": "OTHER" }
        });
        match classify_success_payload(&payload) {
            Err(GenerationError::Blocked { reason, safety }) => {
                assert_eq!(reason, "OTHER");
                assert!(safety.is_empty());
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[test]
    fn test_no_candidates_no_feedback() {
        let payload = serde_json::json!({});
        match classify_success_payload(&payload) {
            Err(GenerationError::Blocked { reason, .. }) => {
                assert!(reason.contains("no response content"));
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[test]
    fn test_safety_finish_collects_ratings() {
        let payload = serde_json::json!({
            "candidates": [{
                "finishReason": "SAFETY",
                "safetyRatings": [
                    { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "probability": "HIGH" },
                    { "category": "HARM_CATEGORY_HARASSMENT", "probability": "MEDIUM" }
                ]
            }]
        });
        match classify_success_payload(&payload) {
            Err(GenerationError::Blocked { reason, safety }) => {
                assert_eq!(reason, "SAFETY");
                assert_eq!(safety.len(), 2);
                assert_eq!(safety[0].category, "HARM_CATEGORY_DANGEROUS_CONTENT");
                assert_eq!(safety[1].probability, "MEDIUM");
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[test]
    fn test_non_safety_block_has_no_ratings() {
        let payload = serde_json::json!({
            "candidates": [{ "finishReason": "RECITATION" }]
        });
        match classify_success_payload(&payload) {
            Err(GenerationError::Blocked { reason, safety }) => {
                assert_eq!(reason, "RECITATION");
                assert!(safety.is_empty());
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_content_truncated() {
        let payload = serde_json::json!({
            "candidates": [{ "finishReason": "MAX_TOKENS", "content": { "parts": [] } }]
        });
        match classify_success_payload(&payload) {
            Err(GenerationError::EmptyContent { truncated }) => assert!(truncated),
            other => panic!("expected EmptyContent, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_content_not_truncated() {
        let payload = serde_json::json!({
            "candidates": [{ "finishReason": "STOP", "content": {} }]
        });
        match classify_success_payload(&payload) {
            Err(GenerationError::EmptyContent { truncated }) => assert!(!truncated),
            other => panic!("expected EmptyContent, got {other:?}"),
        }
    }

    #[test]
    fn test_stop_with_text_succeeds() {
        let payload = serde_json::json!({
            "candidates": [{
                "finishReason": "STOP",
                "content": { "parts": [{ "text": "Protocol: step one" }] }
            }]
        });
        assert_eq!(
            classify_success_payload(&payload).unwrap(),
            "Protocol: step one"
        );
    }

    #[test]
    fn test_max_tokens_with_text_succeeds() {
        // Truncated output still counts as usable text
        let payload = serde_json::json!({
            "candidates": [{
                "finishReason": "MAX_TOKENS",
                "content": { "parts": [{ "text": "Protocol: partial" }] }
            }]
        });
        assert_eq!(
            classify_success_payload(&payload).unwrap(),
            "Protocol: partial"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let key = ApiKey::parse("AIzaTestKey12345").unwrap();
        let client = GenerationClient::new(&crate::config::GenerationConfig::default(), key);
        let body = client.request_body("describe the experiment");

        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "describe the experiment"
        );
        let settings = body["safetySettings"].as_array().unwrap();
        assert_eq!(settings.len(), 4);
        for setting in settings {
            assert_eq!(setting["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
        }
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn test_request_url_embeds_key_and_model() {
        let key = ApiKey::parse("AIzaTestKey12345").unwrap();
        let config = crate::config::GenerationConfig {
            endpoint_base: "http://localhost:9999/v1beta/models/".to_string(),
            ..Default::default()
        };
        let client = GenerationClient::new(&config, key);
        assert_eq!(
            client.request_url(),
            format!(
                "http://localhost:9999/v1beta/models/{}:generateContent?key=AIzaTestKey12345",
                client.model()
            )
        );
    }
}
