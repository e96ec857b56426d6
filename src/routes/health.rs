//! Health check endpoint for container orchestration.
//!
//! Responses are composed inside the health gate, so at most
//! `health.max_concurrent` run at once. The permit is dropped on every exit
//! path. Docker healthchecks poll with `?silent=true` to keep the log quiet.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::instrument;

use super::status::{Status, StatusRecord};
use super::RequestContext;
use crate::error::AppError;
use crate::state::AppState;

#[instrument(name = "routes::health", skip_all, fields(client = %ctx.client))]
pub async fn health(state: &AppState, ctx: &RequestContext) -> Result<Response, AppError> {
    let silent = ctx.params.is_silent();

    if !silent {
        tracing::info!(file = %ctx.file, method = %ctx.method, "Requesting to access health api");
    }

    match compose(state, ctx, silent).await {
        Ok(record) => Ok(record.into_response()),
        Err(e) => {
            tracing::error!(
                error = %e,
                code = 503,
                status = "unhealthy",
                uptime_secs = state.runtime.uptime().as_secs(),
                "Health check failed"
            );
            let record = StatusRecord::new(
                state,
                ctx,
                StatusCode::SERVICE_UNAVAILABLE,
                Status::Unhealthy,
                "health check failed",
            )?
            .with_error(&e);
            Ok(record.into_response())
        }
    }
}

async fn compose(
    state: &AppState,
    ctx: &RequestContext,
    silent: bool,
) -> Result<StatusRecord, AppError> {
    let _permit = state.health_gate.acquire().await?;

    if ctx.params.api.is_none() && !silent {
        tracing::debug!("No api-key passed to health check");
    }

    let record = StatusRecord::new(state, ctx, StatusCode::OK, Status::Healthy, "healthy")?;

    if !silent {
        tracing::info!(
            code = record.code,
            status = "healthy",
            uptime_secs = record.uptime,
            active = state.health_gate.active(),
            "Health response"
        );
    }

    Ok(record)
}
