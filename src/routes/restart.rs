//! Restart endpoint.
//!
//! Accepting a restart re-runs startup diagnostics; the process keeps running.
//!
//! Authorization is intentionally light. Requests coming from the dashboard carry
//! a `Referer` and are let through when it contains the request's own host.
//! Direct calls (no referer) must pass `?key=` matching the configured API key.
//! The referer is client-controlled and trivially spoofed, so this is not a
//! hardened check.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::instrument;

use super::status::{Status, StatusRecord};
use super::RequestContext;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    Accepted,
    /// No referer, a key is configured, and none was supplied
    MissingKey,
    /// Referer present but does not mention the request host
    ForeignReferer,
    /// No referer and the supplied key differs from the configured one
    IncorrectKey,
}

pub fn authorize_restart(
    referer: Option<&str>,
    host: Option<&str>,
    supplied_key: Option<&str>,
    configured_key: Option<&str>,
) -> RestartDecision {
    match referer {
        Some(referer) => match host {
            Some(host) if referer.contains(host) => RestartDecision::Accepted,
            _ => RestartDecision::ForeignReferer,
        },
        None if configured_key.is_some() && supplied_key.map_or(true, str::is_empty) => {
            RestartDecision::MissingKey
        }
        None if supplied_key != configured_key => RestartDecision::IncorrectKey,
        None => RestartDecision::Accepted,
    }
}

#[instrument(name = "routes::restart", skip_all, fields(client = %ctx.client))]
pub async fn restart(state: &AppState, ctx: &RequestContext) -> Result<Response, AppError> {
    let decision = authorize_restart(
        ctx.referer.as_deref(),
        ctx.host.as_deref(),
        ctx.params.key.as_deref(),
        state.config.api.key.as_deref(),
    );

    let example = format!(
        "http://{}/api/restart?key=XXXXXXXX",
        ctx.host.as_deref().unwrap_or("localhost")
    );

    let message = match decision {
        RestartDecision::Accepted => {
            let record = StatusRecord::new(
                state,
                ctx,
                StatusCode::OK,
                Status::Ok,
                "Restart command received",
            )?;
            tracing::info!(file = %ctx.file, method = %ctx.method, "Requesting to access restart api");
            state.initializer.initialize().await;
            return Ok(record.into_response());
        }
        RestartDecision::MissingKey | RestartDecision::ForeignReferer => {
            format!("must define api-key: {}", example)
        }
        RestartDecision::IncorrectKey => format!("incorrect api-key specified: {}", example),
    };

    tracing::error!(
        decision = ?decision,
        file = %ctx.file,
        method = %ctx.method,
        referer = ?ctx.referer,
        "Unauthorized (401): restart attempt rejected"
    );

    let record = StatusRecord::new(
        state,
        ctx,
        StatusCode::UNAUTHORIZED,
        Status::Unauthorized,
        message,
    )?;
    Ok(record.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use RestartDecision::*;

    #[test]
    fn test_missing_key() {
        assert_eq!(authorize_restart(None, Some("h"), None, Some("secret")), MissingKey);
        assert_eq!(authorize_restart(None, Some("h"), Some(""), Some("secret")), MissingKey);
    }

    #[test]
    fn test_matching_key() {
        assert_eq!(authorize_restart(None, Some("h"), Some("secret"), Some("secret")), Accepted);
    }

    #[test]
    fn test_incorrect_key() {
        assert_eq!(authorize_restart(None, Some("h"), Some("guess"), Some("secret")), IncorrectKey);
    }

    #[test]
    fn test_no_key_configured() {
        assert_eq!(authorize_restart(None, Some("h"), None, None), Accepted);
        // A key supplied when none is configured still mismatches
        assert_eq!(authorize_restart(None, Some("h"), Some("x"), None), IncorrectKey);
    }

    #[test]
    fn test_foreign_referer_rejected_regardless_of_key() {
        let referer = Some("http://evil.com/");
        let host = Some("myhost:4124");
        assert_eq!(authorize_restart(referer, host, None, Some("secret")), ForeignReferer);
        assert_eq!(authorize_restart(referer, host, Some("secret"), Some("secret")), ForeignReferer);
        assert_eq!(authorize_restart(referer, None, None, None), ForeignReferer);
    }

    #[test]
    fn test_same_host_referer_skips_key() {
        assert_eq!(
            authorize_restart(Some("http://myhost:4124/"), Some("myhost:4124"), None, Some("secret")),
            Accepted
        );
    }
}
