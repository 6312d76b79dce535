//! Session state machine and transcript.
//!
//! Replaces ad-hoc readiness flags with an explicit phase value:
//! `Unconfigured → KeySet → Ready`. Dataset-load failure drops back to
//! `KeySet` (the key is retained and re-enterable); a credential rejection
//! from the remote API drops all the way back to `Unconfigured`.
//!
//! All generation outcomes funnel through [`Session::finish_turn`] so the
//! TUI and the integration tests apply identical transcript and rollback
//! logic.

use thiserror::Error;

use crate::core::credentials::{ApiKey, KeyError};
use crate::core::gateway::{GenerationError, RemoteErrorHint};
use crate::core::inventory::{DataLoadError, Inventories};
use crate::core::prompt;

/// Bootstrap failure: bad key shape, or a dataset that would not load.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    DataLoad(#[from] DataLoadError),
}

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Synapse,
    System,
}

#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Where the session is in the bootstrap sequence.
#[derive(Debug, Clone)]
pub enum Phase {
    /// No usable key.
    Unconfigured,
    /// Key shape-checked; data not loaded yet.
    KeySet { key: ApiKey },
    /// Key present and both inventories loaded.
    Ready { key: ApiKey, data: Inventories },
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Unconfigured => "unconfigured",
            Phase::KeySet { .. } => "key set",
            Phase::Ready { .. } => "ready",
        }
    }
}

/// In-memory session state: phase, in-flight gate, transcript.
///
/// Created at startup, never persisted.
pub struct Session {
    phase: Phase,
    in_flight: bool,
    transcript: Vec<TranscriptEntry>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Unconfigured,
            in_flight: false,
            transcript: Vec::new(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready { .. })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// A generation request may be issued only when ready and idle.
    pub fn can_send(&self) -> bool {
        self.is_ready() && !self.in_flight
    }

    /// Shape-check a raw key and move to `KeySet`. Allowed from any phase
    /// while no request is pending, so a key can always be re-entered.
    pub fn submit_key(&mut self, raw: &str) -> Result<ApiKey, SetupError> {
        let key = ApiKey::parse(raw)?;
        log::info!("API key accepted (shape check): {key}");
        self.phase = Phase::KeySet { key: key.clone() };
        Ok(key)
    }

    /// Both inventories loaded: `KeySet → Ready`.
    pub fn data_loaded(&mut self, data: Inventories) {
        match std::mem::replace(&mut self.phase, Phase::Unconfigured) {
            Phase::KeySet { key } | Phase::Ready { key, .. } => {
                self.phase = Phase::Ready { key, data };
                if self.transcript.is_empty() {
                    self.push(
                        Speaker::Synapse,
                        "Ready! Describe the experiment you want to plan.",
                    );
                }
            }
            Phase::Unconfigured => {
                log::warn!("Inventory data arrived with no key set — ignoring");
            }
        }
    }

    /// Dataset fetch/parse failed: readiness stays false, key is kept so it
    /// can be resubmitted without re-typing.
    pub fn data_load_failed(&mut self, err: &DataLoadError) {
        log::warn!("Inventory load failed: {err}");
        if let Phase::Ready { key, .. } = &self.phase {
            let key = key.clone();
            self.phase = Phase::KeySet { key };
        }
        self.push(
            Speaker::System,
            format!("Critical Error: Could not load equipment data ({err}). Please check the inventory files and retry."),
        );
    }

    /// Start a generation turn: record the user entry, flip the in-flight
    /// gate, and return the assembled prompt. `None` when the session is not
    /// ready or a request is already pending.
    pub fn begin_turn(&mut self, description: &str) -> Option<String> {
        let description = description.trim();
        if description.is_empty() || !self.can_send() {
            return None;
        }
        let Phase::Ready { data, .. } = &self.phase else {
            return None;
        };
        let full_prompt = prompt::build_prompt(description, &data.internal, &data.external);
        self.transcript.push(TranscriptEntry {
            speaker: Speaker::User,
            text: description.to_string(),
        });
        self.in_flight = true;
        Some(full_prompt)
    }

    /// Apply a generation outcome: transcript entries, and credential
    /// rollback when the remote error text hints at a rejected key.
    pub fn finish_turn(&mut self, outcome: Result<String, GenerationError>) {
        self.in_flight = false;
        match outcome {
            Ok(text) => self.push(Speaker::Synapse, text),
            Err(err) => {
                let mut message = format!("Error: {}", describe(&err));
                match err.remote_hint() {
                    RemoteErrorHint::InvalidKey => {
                        message.push_str(
                            " Please verify your API key and ensure it's enabled for the Generative Language API.",
                        );
                        self.revoke_key();
                    }
                    RemoteErrorHint::QuotaExhausted => {
                        message.push_str(" You might have exceeded your API usage quota.");
                    }
                    RemoteErrorHint::Other => {}
                }
                self.push(Speaker::System, message);
            }
        }
    }

    /// Drop the credential and return to the initial unset form. The loaded
    /// data is discarded with it — the next key re-runs the full bootstrap.
    pub fn revoke_key(&mut self) {
        log::info!("Revoking API key — session back to unconfigured");
        self.phase = Phase::Unconfigured;
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry {
            speaker,
            text: text.into(),
        });
    }
}

/// User-facing error text: the error's own message plus safety detail and
/// truncation hints, so no failure surfaces as a bare generic message.
pub fn describe(err: &GenerationError) -> String {
    match err {
        GenerationError::Blocked { reason, safety } if !safety.is_empty() => {
            let ratings = safety
                .iter()
                .map(|r| format!("{}={}", r.category, r.probability))
                .collect::<Vec<_>>()
                .join("; ");
            format!(
                "Generation stopped due to {reason}. Safety Ratings: {ratings}. Try rephrasing your request."
            )
        }
        GenerationError::EmptyContent { truncated: true } => {
            "Received a response, but no text content (output limit reached immediately?)."
                .to_string()
        }
        GenerationError::EmptyContent { truncated: false } => {
            "Received a response, but no text content was found.".to_string()
        }
        other => other.to_string(),
    }
}
