//! Shared helpers for the wiremock-backed integration tests.

use serde_json::{json, Value};
use wiremock::MockServer;

use synapse::config::GenerationConfig;

/// Generation config pointed at a mock server, with a short timeout so
/// failure tests stay fast.
pub fn generation_config(server: &MockServer) -> GenerationConfig {
    GenerationConfig {
        endpoint_base: format!("{}/v1beta/models/", server.uri()),
        request_timeout_secs: 5,
        ..Default::default()
    }
}

/// Path of the generateContent call for the default model.
pub fn generate_path() -> String {
    format!(
        "/v1beta/models/{}:generateContent",
        GenerationConfig::default().model
    )
}

/// A well-formed single-candidate response.
pub fn candidate_response(text: &str, finish_reason: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] },
            "finishReason": finish_reason
        }]
    })
}
