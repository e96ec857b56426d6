//! Host and process introspection.
//!
//! Container addresses come from files written by the image's init layer, the OS
//! string from `/etc/os-release`, and uptime from a monotonic clock captured at
//! startup.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::{ContainerConfig, UNKNOWN_IP};

const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Container and gateway addresses, read once at startup.
#[derive(Debug, Clone)]
pub struct ContainerNetwork {
    pub ip: String,
    pub gateway: String,
}

impl ContainerNetwork {
    pub fn load(config: &ContainerConfig) -> Self {
        Self {
            ip: read_address(&config.ip_file),
            gateway: read_address(&config.gateway_file),
        }
    }
}

impl Default for ContainerNetwork {
    fn default() -> Self {
        Self {
            ip: UNKNOWN_IP.to_string(),
            gateway: UNKNOWN_IP.to_string(),
        }
    }
}

fn read_address(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

/// Describe the host OS, e.g. `Alpine Linux (3.22.0)`.
pub fn detect_os() -> String {
    std::fs::read_to_string(OS_RELEASE_PATH)
        .ok()
        .and_then(|content| parse_os_release(&content))
        .unwrap_or_else(|| std::env::consts::OS.to_string())
}

fn parse_os_release(content: &str) -> Option<String> {
    let field = |key: &str| {
        content.lines().find_map(|line| {
            let value = line.strip_prefix(key)?.strip_prefix('=')?;
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        })
    };

    let name = field("NAME")?;
    Some(match field("VERSION_ID") {
        Some(version) => format!("{} ({})", name, version),
        None => name,
    })
}

/// Process-lifetime facts shown on the dashboard and in status envelopes.
#[derive(Debug)]
pub struct RuntimeInfo {
    started: Instant,
    startup_micros: AtomicU64,
    server_os: String,
}

impl RuntimeInfo {
    pub fn new(server_os: String) -> Self {
        Self {
            started: Instant::now(),
            startup_micros: AtomicU64::new(0),
            server_os,
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Duration of the most recent `initialize()` run.
    pub fn startup(&self) -> Duration {
        Duration::from_micros(self.startup_micros.load(Ordering::Relaxed))
    }

    pub fn record_startup(&self, took: Duration) {
        let micros = u64::try_from(took.as_micros()).unwrap_or(u64::MAX);
        self.startup_micros.store(micros, Ordering::Relaxed);
    }

    pub fn server_os(&self) -> &str {
        &self.server_os
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_os_release_with_version() {
        let content = "NAME=\"Alpine Linux\"\nID=alpine\nVERSION_ID=3.22.0\nPRETTY_NAME=\"Alpine Linux v3.22\"\n";
        assert_eq!(parse_os_release(content).as_deref(), Some("Alpine Linux (3.22.0)"));
    }

    #[test]
    fn test_parse_os_release_without_version() {
        let content = "NAME=\"Arch Linux\"\nBUILD_ID=rolling\n";
        assert_eq!(parse_os_release(content).as_deref(), Some("Arch Linux"));
    }

    #[test]
    fn test_parse_os_release_missing_name() {
        assert_eq!(parse_os_release("ID=unknown\n"), None);
    }

    #[test]
    fn test_container_network_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let ip_file = dir.path().join("IP_CONTAINER");
        std::fs::write(&ip_file, "172.18.0.2\n").unwrap();

        let network = ContainerNetwork::load(&ContainerConfig {
            ip_file: ip_file.to_string_lossy().into_owned(),
            gateway_file: dir.path().join("missing").to_string_lossy().into_owned(),
        });
        assert_eq!(network.ip, "172.18.0.2");
        assert_eq!(network.gateway, UNKNOWN_IP);
    }

    #[test]
    fn test_record_startup() {
        let info = RuntimeInfo::new("test".to_string());
        assert_eq!(info.startup(), Duration::ZERO);
        info.record_startup(Duration::from_millis(1500));
        assert_eq!(info.startup(), Duration::from_millis(1500));
        assert_eq!(info.server_os(), "test");
    }
}
