use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tui: TuiConfig,
    pub data: DataConfig,
    pub generation: GenerationConfig,
}

/// TUI-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Tick interval in milliseconds for the event loop.
    pub tick_rate_ms: u64,
}

/// Where the two equipment inventories are loaded from.
///
/// Each location is either a local file path or an `http(s)` URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Equipment available in our own lab.
    pub internal_inventory: String,
    /// Equipment available at partner institutions.
    pub external_inventory: String,
}

/// Generation endpoint parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model identifier appended to the endpoint base.
    pub model: String,
    /// Endpoint base, up to and including the trailing slash before the
    /// model identifier.
    pub endpoint_base: String,
    /// Upper bound on generated output size.
    pub max_output_tokens: u32,
    /// Bounded wait for a single generation request.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tui: TuiConfig::default(),
            data: DataConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 50 }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            internal_inventory: "Lab_equipments.json".to_string(),
            external_inventory: "lab_out.json".to_string(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash-preview-04-17".to_string(),
            endpoint_base: "https://generativelanguage.googleapis.com/v1beta/models/"
                .to_string(),
            max_output_tokens: 8192,
            request_timeout_secs: 300,
        }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/synapse/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e} — using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {} — using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("synapse").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
