//! Startup diagnostics.
//!
//! `initialize()` runs once before the listener binds and again whenever the
//! restart endpoint accepts a request. It does not restart anything: it
//! re-validates the sync schedule, logs the effective configuration, and records
//! how long it took.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::scheduler::{format_run, next_run, parse_cron};
use crate::system::{ContainerNetwork, RuntimeInfo};

/// Collaborator invoked by the restart flow.
#[async_trait]
pub trait Initializer: Send + Sync {
    async fn initialize(&self);
}

/// Logs diagnostics and records the startup duration in `RuntimeInfo`.
pub struct Diagnostics {
    config: Arc<AppConfig>,
    network: ContainerNetwork,
    runtime: Arc<RuntimeInfo>,
}

impl Diagnostics {
    pub fn new(config: Arc<AppConfig>, network: ContainerNetwork, runtime: Arc<RuntimeInfo>) -> Self {
        Self {
            config,
            network,
            runtime,
        }
    }

    fn log_schedule(&self) {
        let expr = &self.config.tasks.cron_sync;
        match parse_cron(expr) {
            Ok(schedule) => {
                if let Some(next) = next_run(&schedule) {
                    tracing::info!(
                        schedule = %expr,
                        next_run = %format_run(&next),
                        next_run_iso = %next.to_rfc3339(),
                        "Next cron at"
                    );
                }
            }
            Err(e) => {
                tracing::error!(schedule = %expr, error = %e, "Specified cron time value is not valid");
            }
        }
    }

    fn log_settings(&self) {
        let config = &self.config;

        tracing::debug!(var = "IP_CONTAINER", value = %self.network.ip, "Network");
        tracing::debug!(var = "IP_GATEWAY", value = %self.network.gateway, "Network");
        tracing::debug!(var = "IMAGE_RELEASE", value = %config.app.release, "Environment");
        tracing::debug!(var = "URL_REPO", value = %config.app.project_url, "Environment");
        tracing::debug!(var = "WEB_IP", value = %config.http.host, "Environment");
        tracing::debug!(var = "WEB_PORT", value = config.http.port, "Environment");
        tracing::debug!(var = "WEB_FOLDER", value = %config.http.web_folder, "Environment");
        tracing::debug!(var = "WEB_ENCODING", value = %config.http.encoding, "Environment");
        tracing::debug!(var = "WEB_PROXY_HEADER", value = %config.http.proxy_header, "Environment");
        tracing::debug!(var = "WEB_TRUST_PROXY", value = config.http.trust_proxy, "Environment");
        tracing::debug!(var = "API_KEY", configured = config.api.key.is_some(), "Environment");
        tracing::debug!(var = "HEALTH_TIMER", value = config.health.timer_ms, "Environment");
        tracing::debug!(var = "LOG_LEVEL", value = config.logging.level, "Environment");
        tracing::debug!(keywords = ?config.routes.health, "Health route keywords");
        tracing::debug!(keywords = ?config.routes.restart, "Restart route keywords");
    }
}

#[async_trait]
impl Initializer for Diagnostics {
    async fn initialize(&self) {
        let start = Instant::now();

        self.log_schedule();

        tracing::info!(
            host_ip = %self.config.http.host,
            container_ip = %self.network.ip,
            port = self.config.http.port,
            "Starting container, binding to host network adapter"
        );

        self.log_settings();

        let took = start.elapsed();
        self.runtime.record_startup(took);

        tracing::info!(
            took_ms = took.as_secs_f64() * 1000.0,
            ip = %self.network.ip,
            gateway = %self.network.gateway,
            port = self.config.http.port,
            "Container running"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_records_startup() {
        let runtime = Arc::new(RuntimeInfo::new("test".to_string()));
        let diagnostics = Diagnostics::new(
            Arc::new(AppConfig::default()),
            ContainerNetwork::default(),
            runtime.clone(),
        );

        diagnostics.initialize().await;
        assert!(runtime.startup() < std::time::Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_initialize_tolerates_invalid_cron() {
        let mut config = AppConfig::default();
        config.tasks.cron_sync = "not a cron".to_string();
        let diagnostics = Diagnostics::new(
            Arc::new(config),
            ContainerNetwork::default(),
            Arc::new(RuntimeInfo::new("test".to_string())),
        );
        diagnostics.initialize().await;
    }
}
