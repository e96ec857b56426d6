//! Asset rendering for the static/template flow.
//!
//! HTML documents under the web folder are rendered with Tera against a fixed
//! dashboard context. Every other file type is served as raw bytes, read from
//! disk (or the expiring cache) without a templating pass. Parsed templates are
//! kept for the same TTL as raw bytes, so edits show up once an entry expires.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use serde::Serialize;
use tera::Tera;

use crate::cache::ExpiringCache;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::system::RuntimeInfo;
use crate::uptime;

pub const MIME_HTML: &str = "text/html";
pub const MIME_DEFAULT: &str = "text/plain";

/// Extension to MIME type. Anything not listed is served as `text/plain`.
const MIME_TYPES: [(&str, &str); 13] = [
    (".html", MIME_HTML),
    (".htm", MIME_HTML),
    (".ico", "image/x-icon"),
    (".jpg", "image/jpeg"),
    (".png", "image/png"),
    (".gif", "image/gif"),
    (".css", "text/css"),
    (".scss", "text/x-sass"),
    (".gz", "application/gzip"),
    (".js", "text/javascript"),
    (".txt", "text/plain"),
    (".xml", "application/xml"),
    (".json", "application/json"),
];

/// MIME type for a request path, keyed on everything from the last `.`.
pub fn mime_for(path: &str) -> &'static str {
    path.rfind('.')
        .and_then(|idx| {
            let ext = &path[idx..];
            MIME_TYPES.iter().find(|(e, _)| *e == ext).map(|(_, mime)| *mime)
        })
        .unwrap_or(MIME_DEFAULT)
}

/// Values exposed to HTML templates.
#[derive(Debug, Serialize)]
pub struct DashboardContext {
    pub app_name: &'static str,
    pub app_version: &'static str,
    pub app_release: String,
    pub app_url_github: String,
    pub app_url_docs: String,
    pub app_git_hash_short: String,
    pub app_git_hash_long: String,
    pub app_uptime_short: String,
    pub app_uptime_long: String,
    /// Duration of the last `initialize()` run, in seconds
    pub app_startup: f64,
    pub server_os: String,
    /// Health endpoint polling interval for the page script, in milliseconds
    pub health_timer: u64,
}

impl DashboardContext {
    pub fn new(config: &AppConfig, runtime: &RuntimeInfo) -> Self {
        let uptime = runtime.uptime();
        Self {
            app_name: env!("CARGO_PKG_NAME"),
            app_version: env!("CARGO_PKG_VERSION"),
            app_release: config.app.release.clone(),
            app_url_github: config.app.project_url.trim_end_matches(".git").to_string(),
            app_url_docs: config.app.docs_url().to_string(),
            app_git_hash_short: config.app.git_sha_short().to_string(),
            app_git_hash_long: config.app.git_sha.clone(),
            app_uptime_short: uptime::short(uptime),
            app_uptime_long: uptime::long(uptime),
            app_startup: (runtime.startup().as_secs_f64() * 1000.0).round() / 1000.0,
            server_os: runtime.server_os().to_string(),
            health_timer: config.health.timer_ms,
        }
    }
}

/// A resolved asset ready to be written out.
#[derive(Debug)]
pub struct RenderedAsset {
    pub mime: &'static str,
    pub body: Bytes,
}

/// Loads assets from the web folder.
///
/// Both caches are keyed on the canonical path of the file on disk, so any
/// number of request spellings for one file (`css/./app.css`, `css//app.css`)
/// share a single entry and the key space is bounded by the files that exist.
pub struct AssetStore {
    root: PathBuf,
    ttl: Duration,
    /// Raw bytes of non-HTML files
    pub raw: ExpiringCache<Bytes>,
    /// Parsed HTML templates
    pub compiled: ExpiringCache<Arc<Tera>>,
}

impl AssetStore {
    /// A zero `ttl` disables both caches.
    pub fn new(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            ttl,
            raw: ExpiringCache::new(),
            compiled: ExpiringCache::new(),
        }
    }

    /// Render or load `file` relative to the web folder.
    ///
    /// `file` is used as given: only the leading separator has been removed, so
    /// `..` segments are not rejected here.
    pub async fn load(
        &self,
        file: &str,
        context: &DashboardContext,
    ) -> Result<RenderedAsset, AppError> {
        let mime = mime_for(file);
        let path = tokio::fs::canonicalize(self.root.join(file)).await?;
        let key = path.to_string_lossy().into_owned();

        if mime == MIME_HTML {
            let engine = self.template(&key, &path).await?;
            let html = engine.render(&key, &tera::Context::from_serialize(context)?)?;
            return Ok(RenderedAsset {
                mime,
                body: Bytes::from(html),
            });
        }

        // Non-HTML files skip the template pass entirely: their bytes are never
        // rendered, so template syntax inside CSS or JS cannot turn into a 404.
        if let Some(body) = self.raw.get(&key) {
            return Ok(RenderedAsset { mime, body });
        }

        let body = Bytes::from(tokio::fs::read(&path).await?);
        if !self.ttl.is_zero() {
            self.raw.set(key, body.clone(), self.ttl);
        }
        Ok(RenderedAsset { mime, body })
    }

    /// Parsed template for `path`, registered under `key`. Only templates that
    /// parse are cached.
    async fn template(&self, key: &str, path: &Path) -> Result<Arc<Tera>, AppError> {
        if let Some(tera) = self.compiled.get(key) {
            return Ok(tera);
        }

        let source = tokio::fs::read_to_string(path).await?;
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_template(key, &source)?;

        let tera = Arc::new(tera);
        if !self.ttl.is_zero() {
            self.compiled.set(key, tera.clone(), self.ttl);
        }
        Ok(tera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> DashboardContext {
        DashboardContext::new(&AppConfig::default(), &RuntimeInfo::new("Test OS (1.0)".to_string()))
    }

    #[test]
    fn test_mime_lookup() {
        assert_eq!(mime_for("index.html"), "text/html");
        assert_eq!(mime_for("css/backage.min.css"), "text/css");
        assert_eq!(mime_for("js/app.js"), "text/javascript");
        assert_eq!(mime_for("favicon.ico"), "image/x-icon");
        assert_eq!(mime_for("data.json"), "application/json");
        assert_eq!(mime_for("README"), "text/plain");
        assert_eq!(mime_for("font.woff2"), "text/plain");
    }

    #[test]
    fn test_context_values() {
        let ctx = context();
        assert_eq!(ctx.app_name, "backage");
        assert_eq!(ctx.app_git_hash_short, "000000000");
        assert_eq!(ctx.app_git_hash_long.len(), 40);
        assert_eq!(ctx.app_url_github, "https://github.com/ipitio/backage");
        assert_eq!(ctx.server_os, "Test OS (1.0)");
        assert_eq!(ctx.health_timer, 600_000);
    }

    #[tokio::test]
    async fn test_renders_html_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            "<p>{{ app_name }} on {{ server_os }}</p>",
        )
        .unwrap();

        let store = AssetStore::new(dir.path(), Duration::ZERO);
        let asset = store.load("index.html", &context()).await.unwrap();
        assert_eq!(asset.mime, "text/html");
        assert_eq!(&asset.body[..], b"<p>backage on Test OS (1.0)</p>");
        assert!(store.compiled.is_empty());
    }

    #[tokio::test]
    async fn test_html_is_not_escaped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "{{ server_os }}").unwrap();

        let store = AssetStore::new(dir.path(), Duration::ZERO);
        let runtime = RuntimeInfo::new("<b>OS</b>".to_string());
        let ctx = DashboardContext::new(&AppConfig::default(), &runtime);
        let asset = store.load("index.html", &ctx).await.unwrap();
        assert_eq!(&asset.body[..], b"<b>OS</b>");
    }

    #[tokio::test]
    async fn test_parsed_template_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("index.html");
        std::fs::write(&page, "v1 {{ app_name }}").unwrap();

        let store = AssetStore::new(dir.path(), Duration::from_secs(60));
        store.load("index.html", &context()).await.unwrap();
        assert_eq!(store.compiled.len(), 1);

        // Served from the parsed copy until it expires
        std::fs::write(&page, "v2 {{ app_name }}").unwrap();
        let asset = store.load("./index.html", &context()).await.unwrap();
        assert_eq!(&asset.body[..], b"v1 backage");
        assert_eq!(store.compiled.len(), 1);
    }

    #[tokio::test]
    async fn test_non_html_is_served_raw() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "const x = {{ app_name }};").unwrap();

        let store = AssetStore::new(dir.path(), Duration::from_secs(60));
        let asset = store.load("app.js", &context()).await.unwrap();
        assert_eq!(asset.mime, "text/javascript");
        assert_eq!(&asset.body[..], b"const x = {{ app_name }};");
        assert_eq!(store.raw.len(), 1);
    }

    #[tokio::test]
    async fn test_aliased_paths_share_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css/app.css"), "a {}").unwrap();

        let store = AssetStore::new(dir.path(), Duration::from_secs(60));
        for file in ["css/app.css", "css/./app.css", "css//app.css", "css/././app.css"] {
            let asset = store.load(file, &context()).await.unwrap();
            assert_eq!(&asset.body[..], b"a {}");
        }
        assert_eq!(store.raw.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path(), Duration::from_secs(60));
        let result = store.load("nope.css", &context()).await;
        assert!(matches!(result, Err(AppError::Io(_))));
        assert!(store.raw.is_empty());
    }

    #[tokio::test]
    async fn test_template_error_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.html"), "{{ unclosed").unwrap();
        let store = AssetStore::new(dir.path(), Duration::from_secs(60));
        let result = store.load("bad.html", &context()).await;
        assert!(matches!(result, Err(AppError::Template(_))));
        assert!(store.compiled.is_empty());
    }
}
