//! HTTP request handling.
//!
//! There is no route table: every request lands on a single fallback handler
//! that classifies the path by keyword prefix (see [`dispatch`]) and hands it
//! to the restart, health or asset flow. Responses that don't set their own
//! Cache-Control get `no-store`, and a panic anywhere below the router becomes
//! a plain-text 500.

pub mod assets;
pub mod dispatch;
pub mod health;
pub mod restart;
pub mod status;

use std::any::Any;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, Request, State},
    http::{header, HeaderValue, Method, Uri},
    middleware,
    response::Response,
    Router,
};
use serde::Deserialize;
use tower_http::{catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer};

use crate::client_ip::{resolve_client_ip, ClientIpSettings};
use crate::config::{CACHE_CONTROL_NO_STORE, UNKNOWN_IP};
use crate::error::{internal_server_error, AppError};
use crate::flags;
use crate::middleware::request_id_layer;
use crate::state::AppState;

use self::dispatch::{classify, normalize_path, Route};

/// Query parameters understood by the API flows. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestParams {
    /// Restart API key
    pub key: Option<String>,
    /// Diagnostic tag on health checks
    pub api: Option<String>,
    pub silent: Option<String>,
}

impl RequestParams {
    /// Parse the query string; anything malformed is treated as no parameters.
    pub fn from_uri(uri: &Uri) -> Self {
        Query::<Self>::try_from_uri(uri)
            .map(|Query(params)| params)
            .unwrap_or_default()
    }

    pub fn is_silent(&self) -> bool {
        flags::is_set(self.silent.as_deref())
    }
}

/// Everything the flows need to know about the incoming request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Path and query exactly as received
    pub reference: String,
    /// Path with leading separators stripped
    pub file: String,
    pub host: Option<String>,
    pub referer: Option<String>,
    pub client: String,
    pub params: RequestParams,
}

impl RequestContext {
    pub fn from_request(state: &AppState, request: &Request) -> Self {
        let uri = request.uri();
        let headers = request.headers();
        let header_str = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let settings = ClientIpSettings {
            proxy_header: &state.config.http.proxy_header,
            trust_proxy: state.config.http.trust_proxy,
            fallback: UNKNOWN_IP,
        };

        Self {
            method: request.method().clone(),
            reference: uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".to_string()),
            file: normalize_path(uri.path()),
            host: header_str(header::HOST),
            referer: header_str(header::REFERER),
            client: resolve_client_ip(headers, peer, &settings),
            params: RequestParams::from_uri(uri),
        }
    }
}

/// Single entry point for every request.
pub async fn dispatch(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let ctx = RequestContext::from_request(&state, &request);
    let route = classify(&ctx.file, &ctx.method, &state.config.routes);

    if !ctx.params.is_silent() {
        tracing::debug!(
            client = %ctx.client,
            method = %ctx.method,
            file = %ctx.file,
            route = ?route,
            "Dispatching request"
        );
    }

    match route {
        Route::Restart => restart::restart(&state, &ctx).await,
        Route::Health => health::health(&state, &ctx).await,
        Route::Asset => assets::serve(&state, &ctx).await,
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, code = 500, "Request handler panicked");
    internal_server_error()
}

/// Creates the Axum router with the dispatcher and its layers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(state)
        // API responses are never cached; assets set their own header first
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_NO_STORE),
        ))
        .layer(CatchPanicLayer::custom(handle_panic))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_from_uri() {
        let uri: Uri = "/api/restart?key=abc&silent=yes&other=1".parse().unwrap();
        let params = RequestParams::from_uri(&uri);
        assert_eq!(params.key.as_deref(), Some("abc"));
        assert!(params.api.is_none());
        assert!(params.is_silent());
    }

    #[test]
    fn test_params_without_query() {
        let uri: Uri = "/api/health".parse().unwrap();
        let params = RequestParams::from_uri(&uri);
        assert!(params.key.is_none());
        assert!(!params.is_silent());
    }

    #[test]
    fn test_silent_falsy() {
        let uri: Uri = "/api/health?silent=false".parse().unwrap();
        assert!(!RequestParams::from_uri(&uri).is_silent());
    }
}
