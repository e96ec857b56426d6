//! Request classification.
//!
//! Paths are matched by prefix against the configured keyword lists in fixed
//! priority order: restart first, then health (GET only), then everything else
//! falls through to asset serving. Prefix matching is deliberate, so
//! `api/healthXYZ` is still a health request.

use axum::http::Method;

use crate::config::{RouteKeywords, DEFAULT_DOCUMENT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Restart,
    Health,
    Asset,
}

/// Strip leading separators; the root maps to the default document.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        DEFAULT_DOCUMENT.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn classify(file: &str, method: &Method, keywords: &RouteKeywords) -> Route {
    let matches = |list: &[String]| list.iter().any(|keyword| file.starts_with(keyword.as_str()));

    if matches(&keywords.restart) {
        Route::Restart
    } else if matches(&keywords.health) && *method == Method::GET {
        Route::Health
    } else {
        Route::Asset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str, method: Method) -> Route {
        classify(&normalize_path(path), &method, &RouteKeywords::default())
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "index.html");
        assert_eq!(normalize_path(""), "index.html");
        assert_eq!(normalize_path("//css/app.css"), "css/app.css");
        assert_eq!(normalize_path("/api/health"), "api/health");
    }

    #[test]
    fn test_restart_keywords_any_method() {
        assert_eq!(route("/api/restart", Method::GET), Route::Restart);
        assert_eq!(route("/api/sync", Method::POST), Route::Restart);
        assert_eq!(route("/api/resync/now", Method::DELETE), Route::Restart);
    }

    #[test]
    fn test_health_requires_get() {
        assert_eq!(route("/api/health", Method::GET), Route::Health);
        assert_eq!(route("/api/status", Method::GET), Route::Health);
        assert_eq!(route("/api/health", Method::POST), Route::Asset);
    }

    #[test]
    fn test_prefix_match() {
        assert_eq!(route("/api/healthXYZ", Method::GET), Route::Health);
        assert_eq!(route("/api/restarting", Method::GET), Route::Restart);
    }

    #[test]
    fn test_everything_else_is_asset() {
        assert_eq!(route("/", Method::GET), Route::Asset);
        assert_eq!(route("/css/backage.min.css", Method::GET), Route::Asset);
        assert_eq!(route("/api", Method::GET), Route::Asset);
    }

    #[test]
    fn test_restart_takes_priority_over_health() {
        let keywords = RouteKeywords {
            restart: vec!["api/".to_string()],
            health: vec!["api/health".to_string()],
        };
        assert_eq!(classify("api/health", &Method::GET, &keywords), Route::Restart);
    }
}
