//! API key handling.
//!
//! The key is held in process memory for the session only — it is never
//! persisted and is discarded whenever the remote API rejects it.

use std::fmt;

use thiserror::Error;

/// Minimum trimmed length for a plausible key. This is a shape check only;
/// real validation happens when the remote API is first called.
const MIN_KEY_LEN: usize = 11;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("API key looks too short or empty — paste the full key")]
    TooShort,
}

/// A session-held API key that passed the shape check.
///
/// `Debug` and `Display` are masked so the key cannot leak into logs or
/// the transcript.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Trim and length-check a raw key.
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        let trimmed = raw.trim();
        if trimmed.len() < MIN_KEY_LEN {
            return Err(KeyError::TooShort);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The full key, for embedding in the request URL.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First and last four characters, for display.
    pub fn masked(&self) -> String {
        mask(&self.0)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self.masked())
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Mask a secret for display (show first 4 and last 4 chars).
///
/// Counts characters, not bytes — keys are arbitrary user input and may
/// contain multi-byte characters.
pub fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
