//! Equipment inventory documents.
//!
//! Both inventories are opaque JSON: they are fetched, parsed for
//! well-formedness, and passed through to the prompt verbatim. No schema is
//! enforced — interpretation of the records is the remote model's job.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// A dataset fetch or parse failure. `status` is set for HTTP failures.
#[derive(Error, Debug)]
#[error("failed to load {source_location}{}: {detail}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
pub struct DataLoadError {
    pub source_location: String,
    pub status: Option<u16>,
    pub detail: String,
}

impl DataLoadError {
    fn new(source: &str, status: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            source_location: source.to_string(),
            status,
            detail: detail.into(),
        }
    }
}

/// The two inventory documents, loaded and parse-checked.
#[derive(Debug, Clone)]
pub struct Inventories {
    /// Equipment in our own lab.
    pub internal: Value,
    /// Equipment at partner institutions.
    pub external: Value,
}

/// Fetches inventory documents from configured locations.
///
/// A location is either an `http(s)` URL or a local file path.
#[derive(Clone)]
pub struct InventoryLoader {
    client: Client,
}

impl Default for InventoryLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryLoader {
    pub fn new() -> Self {
        Self {
            client: crate::core::http_client(Duration::from_secs(30)),
        }
    }

    /// Load both inventories. Fails on the first location that cannot be
    /// fetched or does not parse as JSON.
    pub async fn load(
        &self,
        internal_location: &str,
        external_location: &str,
    ) -> Result<Inventories, DataLoadError> {
        let internal = self.fetch(internal_location).await?;
        let external = self.fetch(external_location).await?;
        log::info!(
            "Inventory data loaded from {internal_location} and {external_location}"
        );
        Ok(Inventories { internal, external })
    }

    async fn fetch(&self, location: &str) -> Result<Value, DataLoadError> {
        if is_http_url(location) {
            self.fetch_url(location).await
        } else {
            self.read_file(location).await
        }
    }

    async fn fetch_url(&self, location: &str) -> Result<Value, DataLoadError> {
        let resp = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| DataLoadError::new(location, None, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataLoadError::new(
                location,
                Some(status.as_u16()),
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            ));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| DataLoadError::new(location, None, format!("invalid JSON: {e}")))
    }

    async fn read_file(&self, location: &str) -> Result<Value, DataLoadError> {
        let contents = tokio::fs::read_to_string(Path::new(location))
            .await
            .map_err(|e| DataLoadError::new(location, None, e.to_string()))?;
        serde_json::from_str(&contents)
            .map_err(|e| DataLoadError::new(location, None, format!("invalid JSON: {e}")))
    }
}

fn is_http_url(location: &str) -> bool {
    Url::parse(location)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://example.com/lab.json"));
        assert!(is_http_url("http://localhost:8080/lab.json"));
        assert!(!is_http_url("Lab_equipments.json"));
        assert!(!is_http_url("/var/data/lab_out.json"));
        // Windows-style drive letters parse as a scheme but are not HTTP
        assert!(!is_http_url("C:\\data\\lab.json"));
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let loader = InventoryLoader::new();
        let err = loader
            .load("definitely-missing.json", "also-missing.json")
            .await
            .unwrap_err();
        assert_eq!(err.source_location, "definitely-missing.json");
        assert!(err.status.is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        std::fs::write(&good, r#"[{"Equipment_Name":"Centrifuge"}]"#).unwrap();
        std::fs::write(&bad, "not json at all").unwrap();

        let loader = InventoryLoader::new();
        let err = loader
            .load(good.to_str().unwrap(), bad.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(err.detail.contains("invalid JSON"));
    }

    #[tokio::test]
    async fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let internal = dir.path().join("internal.json");
        let external = dir.path().join("external.json");
        std::fs::write(&internal, r#"[{"Equipment_Name":"PCR Thermocycler"}]"#).unwrap();
        std::fs::write(&external, r#"[{"Equipment_Name":"Electron Microscope"}]"#).unwrap();

        let loader = InventoryLoader::new();
        let inv = loader
            .load(internal.to_str().unwrap(), external.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(
            inv.internal[0]["Equipment_Name"],
            Value::String("PCR Thermocycler".into())
        );
        assert_eq!(
            inv.external[0]["Equipment_Name"],
            Value::String("Electron Microscope".into())
        );
    }
}
