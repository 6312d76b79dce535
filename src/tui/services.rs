use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::core::gateway::GenerationClient;
use crate::core::inventory::InventoryLoader;

use super::events::AppEvent;

/// Centralized handle to backend work.
///
/// Network operations run as spawned tasks that report back through the
/// event channel; the app state itself never blocks on IO.
pub struct Services {
    pub config: AppConfig,
    pub loader: InventoryLoader,
    pub event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl Services {
    pub fn new(config: AppConfig, event_tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            config,
            loader: InventoryLoader::new(),
            event_tx,
        }
    }

    /// Fetch both inventory documents in the background.
    pub fn spawn_bootstrap(&self) {
        let loader = self.loader.clone();
        let internal = self.config.data.internal_inventory.clone();
        let external = self.config.data.external_inventory.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = loader.load(&internal, &external).await;
            let _ = tx.send(AppEvent::BootstrapComplete(result));
        });
    }

    /// Issue one generation request in the background. The session's
    /// in-flight gate guarantees this is never called while another request
    /// is pending.
    pub fn spawn_generation(&self, client: Arc<GenerationClient>, prompt: String) {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = client.generate(&prompt).await;
            let _ = tx.send(AppEvent::GenerationComplete(result));
        });
    }
}
