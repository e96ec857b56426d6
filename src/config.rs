//! Configuration loading and constants.
//!
//! Builds the immutable configuration snapshot from built-in defaults, an optional
//! TOML file, and environment variables (highest priority). Also defines the
//! constants for route keywords, cache headers, container files and log filters.
//! `AppConfig` is the root configuration struct containing all settings.

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use const_format::formatcp;
use serde::Deserialize;

// =============================================================================
// HTTP Response Cache Control
// =============================================================================

/// Raw (non-HTML) assets served from the web folder
pub const HTTP_CACHE_ASSET_MAX_AGE: u32 = 3600;

pub const CACHE_CONTROL_ASSET: &str = formatcp!("public, max-age={}", HTTP_CACHE_ASSET_MAX_AGE);

/// Status envelopes and rendered pages carry uptime, never cache them
pub const CACHE_CONTROL_NO_STORE: &str = "no-store";

// =============================================================================
// Route Keywords
// =============================================================================

/// Path prefixes that trigger the restart flow
pub const DEFAULT_RESTART_KEYWORDS: [&str; 3] = ["api/restart", "api/sync", "api/resync"];

/// Path prefixes that trigger the health flow (GET only)
pub const DEFAULT_HEALTH_KEYWORDS: [&str; 2] = ["api/status", "api/health"];

/// Document served for `/`
pub const DEFAULT_DOCUMENT: &str = "index.html";

// =============================================================================
// Scheduling
// =============================================================================

/// Fixed cadence of the "next sync" announcement
pub const ANNOUNCE_CRON: &str = "*/30 * * * *";

/// Display format for cron run times (e.g. `10-18-2026 6:00 PM`)
pub const CRON_DISPLAY_FORMAT: &str = "%m-%d-%Y %-I:%M %p";

// =============================================================================
// Container Environment
// =============================================================================

/// Written by the s6-overlay layer of the container image
pub const DEFAULT_IP_CONTAINER_FILE: &str = "/var/run/s6/container_environment/IP_CONTAINER";
pub const DEFAULT_IP_GATEWAY_FILE: &str = "/var/run/s6/container_environment/IP_GATEWAY";

/// Used when the container files are absent, and as the last-resort client address
pub const UNKNOWN_IP: &str = "0.0.0.0";

/// Number of characters shown for the short git hash
pub const GIT_HASH_SHORT_LEN: usize = 9;

// =============================================================================
// Default Strings
// =============================================================================

pub const DEFAULT_PROJECT_URL: &str = "https://github.com/ipitio/backage";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Default verbosity on the 0-7 scale (4 = info)
pub const DEFAULT_LOG_LEVEL: u8 = 4;

/// Timeout for the outbound service check
pub const SERVICE_CHECK_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Release and repository metadata shown on the dashboard
    pub app: AppInfoConfig,
    /// HTTP listener and asset serving
    pub http: HttpServerConfig,
    /// Health endpoint settings
    pub health: HealthConfig,
    /// Restart endpoint settings
    pub api: ApiConfig,
    /// Scheduled tasks
    pub tasks: TaskConfig,
    /// Path keywords used by the dispatcher
    pub routes: RouteKeywords,
    /// Container network files
    pub container: ContainerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppInfoConfig {
    /// Release channel tag (stable, development, ...)
    pub release: String,
    /// Full git commit SHA of the image
    pub git_sha: String,
    /// Project URL, also the target of the startup service check
    pub project_url: String,
    /// Documentation link. Defaults to the project URL.
    pub docs_url: Option<String>,
    pub repo_proto: String,
    pub repo_host: String,
    pub repo_owner: String,
    pub repo_name: String,
}

impl Default for AppInfoConfig {
    fn default() -> Self {
        Self {
            release: "stable".to_string(),
            git_sha: "0".repeat(40),
            project_url: DEFAULT_PROJECT_URL.to_string(),
            docs_url: None,
            repo_proto: "https".to_string(),
            repo_host: "github.com".to_string(),
            repo_owner: "ipitio".to_string(),
            repo_name: "backage".to_string(),
        }
    }
}

impl AppInfoConfig {
    /// Repository URL synchronized by the sync task
    pub fn repo_url(&self) -> String {
        format!(
            "{}://{}/{}/{}",
            self.repo_proto, self.repo_host, self.repo_owner, self.repo_name
        )
    }

    pub fn docs_url(&self) -> &str {
        self.docs_url.as_deref().unwrap_or(&self.project_url)
    }

    /// First characters of the git SHA
    pub fn git_sha_short(&self) -> &str {
        match self.git_sha.char_indices().nth(GIT_HASH_SHORT_LEN) {
            Some((idx, _)) => &self.git_sha[..idx],
            None => &self.git_sha,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    /// Root folder for templates and static assets
    pub web_folder: String,
    /// Response encoding preference (informational)
    pub encoding: String,
    /// Header consulted first when resolving the client address
    pub proxy_header: String,
    /// Whether forwarding headers are trusted at all
    pub trust_proxy: bool,
    /// TTL for cached raw asset bytes in milliseconds (0 disables the cache)
    pub asset_cache_ttl_ms: u64,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4124,
            web_folder: "www".to_string(),
            encoding: "deflate, br".to_string(),
            proxy_header: "x-forwarded-for".to_string(),
            trust_proxy: false,
            asset_cache_ttl_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Polling interval used by the dashboard page, in milliseconds
    pub timer_ms: u64,
    /// Maximum simultaneous health responses
    pub max_concurrent: usize,
    /// Optional bound on the gate wait, in milliseconds. `None` waits forever.
    pub queue_timeout_ms: Option<u64>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            timer_ms: 600_000,
            max_concurrent: 5,
            queue_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Key required by the restart endpoint when called without a referer
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Cron expression for the sync task (5 or 6 fields)
    pub cron_sync: String,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            cron_sync: "0 */12 * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouteKeywords {
    pub restart: Vec<String>,
    pub health: Vec<String>,
}

impl Default for RouteKeywords {
    fn default() -> Self {
        Self {
            restart: DEFAULT_RESTART_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            health: DEFAULT_HEALTH_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub ip_file: String,
    pub gateway_file: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            ip_file: DEFAULT_IP_CONTAINER_FILE.to_string(),
            gateway_file: DEFAULT_IP_GATEWAY_FILE.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Verbosity 0-7 (0 silences everything, 7 is the most verbose)
    pub level: u8,
    /// Log format: "text" (human-readable, default) or "json" (structured)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive equivalent to the numeric level
    pub fn filter(&self) -> String {
        let level = match self.level {
            0 => "off",
            1 => "error",
            2 => "warn",
            3 | 4 => "info",
            5 => "debug",
            _ => "trace",
        };
        format!("backage={level},tower_http={level}")
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load defaults, overlay the TOML file if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                toml::from_str(&contents)?
            }
            None => AppConfig::default(),
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment values obtained through `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(v) = get("IMAGE_RELEASE") {
            self.app.release = v;
        }
        if let Some(v) = get("IMAGE_SHA1") {
            self.app.git_sha = v;
        }
        if let Some(v) = get("URL_REPO") {
            self.app.project_url = v;
        }
        if let Some(v) = get("URL_DOCS") {
            self.app.docs_url = Some(v);
        }
        if let Some(v) = get("GITHUB_PROTO") {
            self.app.repo_proto = v;
        }
        if let Some(v) = get("GITHUB_HOST") {
            self.app.repo_host = v;
        }
        if let Some(v) = get("GITHUB_OWNER") {
            self.app.repo_owner = v;
        }
        if let Some(v) = get("GITHUB_REPO") {
            self.app.repo_name = v;
        }
        if let Some(v) = get("API_KEY") {
            self.api.key = Some(v);
        }
        if let Some(v) = get("WEB_IP") {
            self.http.host = v;
        }
        if let Some(v) = get("WEB_PORT") {
            self.http.port = parse_env("WEB_PORT", &v)?;
        }
        if let Some(v) = get("WEB_FOLDER") {
            self.http.web_folder = v;
        }
        if let Some(v) = get("WEB_ENCODING") {
            self.http.encoding = v;
        }
        if let Some(v) = get("WEB_PROXY_HEADER") {
            self.http.proxy_header = v.to_ascii_lowercase();
        }
        if let Some(v) = get("WEB_TRUST_PROXY") {
            self.http.trust_proxy = crate::flags::parse_flag(&v)
                .ok_or_else(|| ConfigError::invalid("WEB_TRUST_PROXY", &v, "expected a boolean"))?;
        }
        if let Some(v) = get("WEB_CACHE_TTL") {
            self.http.asset_cache_ttl_ms = parse_env("WEB_CACHE_TTL", &v)?;
        }
        if let Some(v) = get("HEALTH_TIMER") {
            self.health.timer_ms = parse_env("HEALTH_TIMER", &v)?;
        }
        if let Some(v) = get("HEALTH_MAX_CONCURRENT") {
            self.health.max_concurrent = parse_env("HEALTH_MAX_CONCURRENT", &v)?;
        }
        if let Some(v) = get("HEALTH_QUEUE_TIMEOUT") {
            self.health.queue_timeout_ms = Some(parse_env("HEALTH_QUEUE_TIMEOUT", &v)?);
        }
        if let Some(v) = get("TASK_CRON_SYNC") {
            self.tasks.cron_sync = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.logging.level = parse_env("LOG_LEVEL", &v)?;
        }
        if let Some(v) = get("LOG_FORMAT") {
            self.logging.format = v;
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level > 7 {
            return Err(ConfigError::Validation(format!(
                "LOG_LEVEL must be between 0 and 7, got {}",
                self.logging.level
            )));
        }
        if self.health.max_concurrent == 0 {
            return Err(ConfigError::Validation(
                "HEALTH_MAX_CONCURRENT must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(name, raw, e))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value {value:?} for {name}: {reason}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl ConfigError {
    fn invalid(name: &'static str, value: &str, reason: impl Display) -> Self {
        ConfigError::InvalidEnv {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn with_env(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = AppConfig::default();
        config.apply_env(|name| vars.get(name).cloned())?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = with_env(&[]).unwrap();
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.http.port, 4124);
        assert_eq!(config.http.web_folder, "www");
        assert_eq!(config.http.proxy_header, "x-forwarded-for");
        assert!(!config.http.trust_proxy);
        assert_eq!(config.health.max_concurrent, 5);
        assert_eq!(config.health.timer_ms, 600_000);
        assert!(config.health.queue_timeout_ms.is_none());
        assert!(config.api.key.is_none());
        assert_eq!(config.tasks.cron_sync, "0 */12 * * *");
        assert_eq!(config.logging.level, 4);
        assert_eq!(config.routes.restart, vec!["api/restart", "api/sync", "api/resync"]);
        assert_eq!(config.routes.health, vec!["api/status", "api/health"]);
    }

    #[test]
    fn test_env_overrides() {
        let config = with_env(&[
            ("API_KEY", "secret"),
            ("WEB_PORT", "8080"),
            ("WEB_PROXY_HEADER", "CF-Connecting-IP"),
            ("WEB_TRUST_PROXY", "yes"),
            ("HEALTH_QUEUE_TIMEOUT", "250"),
            ("LOG_LEVEL", "6"),
            ("IMAGE_SHA1", "abcdef0123456789"),
        ])
        .unwrap();
        assert_eq!(config.api.key.as_deref(), Some("secret"));
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.http.proxy_header, "cf-connecting-ip");
        assert!(config.http.trust_proxy);
        assert_eq!(config.health.queue_timeout_ms, Some(250));
        assert_eq!(config.logging.level, 6);
        assert_eq!(config.app.git_sha_short(), "abcdef012");
    }

    #[test]
    fn test_empty_env_value_is_unset() {
        let config = with_env(&[("API_KEY", "")]).unwrap();
        assert!(config.api.key.is_none());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = with_env(&[("WEB_PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "WEB_PORT", .. }));
    }

    #[test]
    fn test_log_level_out_of_range() {
        assert!(matches!(
            with_env(&[("LOG_LEVEL", "9")]),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_log_level_filter_mapping() {
        let mut logging = LoggingConfig::default();
        assert_eq!(logging.filter(), "backage=info,tower_http=info");
        logging.level = 0;
        assert_eq!(logging.filter(), "backage=off,tower_http=off");
        logging.level = 2;
        assert_eq!(logging.filter(), "backage=warn,tower_http=warn");
        logging.level = 5;
        assert_eq!(logging.filter(), "backage=debug,tower_http=debug");
        logging.level = 7;
        assert_eq!(logging.filter(), "backage=trace,tower_http=trace");
    }

    #[test]
    fn test_repo_and_docs_urls() {
        let config = with_env(&[("GITHUB_OWNER", "someone")]).unwrap();
        assert_eq!(config.app.repo_url(), "https://github.com/someone/backage");
        assert_eq!(config.app.docs_url(), DEFAULT_PROJECT_URL);
    }

    #[test]
    fn test_toml_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [http]
            port = 9000

            [routes]
            health = ["healthz"]
            "#,
        )
        .unwrap();
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.http.web_folder, "www");
        assert_eq!(config.routes.health, vec!["healthz"]);
        assert_eq!(config.routes.restart.len(), 3);
    }
}
