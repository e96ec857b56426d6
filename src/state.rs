//! Shared application state for request handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::diagnostics::Initializer;
use crate::gate::ConcurrencyGate;
use crate::system::{ContainerNetwork, RuntimeInfo};
use crate::templates::AssetStore;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Everything a handler touches is owned here and passed in through axum's
/// `State`, so the router can be built and exercised in isolation.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub network: Arc<ContainerNetwork>,
    pub runtime: Arc<RuntimeInfo>,
    /// Bounds simultaneous health responses
    pub health_gate: ConcurrencyGate,
    /// Web folder with its raw-byte and parsed-template caches
    pub assets: Arc<AssetStore>,
    /// Re-run by the restart endpoint
    pub initializer: Arc<dyn Initializer>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        network: ContainerNetwork,
        runtime: Arc<RuntimeInfo>,
        initializer: Arc<dyn Initializer>,
    ) -> Self {
        let health_gate = ConcurrencyGate::new(config.health.max_concurrent)
            .with_timeout(config.health.queue_timeout_ms.map(Duration::from_millis));
        let assets = AssetStore::new(
            &config.http.web_folder,
            Duration::from_millis(config.http.asset_cache_ttl_ms),
        );

        Self {
            config,
            network: Arc::new(network),
            runtime,
            health_gate,
            assets: Arc::new(assets),
            initializer,
        }
    }
}
