//! Static/template flow: everything not claimed by an API keyword.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::instrument;

use super::status::{Status, StatusRecord};
use super::RequestContext;
use crate::config::CACHE_CONTROL_ASSET;
use crate::error::AppError;
use crate::state::AppState;
use crate::templates::{DashboardContext, MIME_HTML};

#[instrument(name = "routes::assets", skip_all, fields(file = %ctx.file))]
pub async fn serve(state: &AppState, ctx: &RequestContext) -> Result<Response, AppError> {
    if ctx.file.contains("..") {
        tracing::warn!(client = %ctx.client, "Asset path contains parent segments");
    }

    let dashboard = DashboardContext::new(&state.config, &state.runtime);
    let asset = match state.assets.load(&ctx.file, &dashboard).await {
        Ok(asset) => asset,
        Err(e) => {
            tracing::error!(client = %ctx.client, error = %e, code = 404, "Page not found");
            // Body says "healthy" alongside the 404; dashboards key on `code`
            let record = StatusRecord::new(
                state,
                ctx,
                StatusCode::NOT_FOUND,
                Status::Healthy,
                "Page not found",
            )?;
            return Ok(record.into_response());
        }
    };

    match asset.mime {
        MIME_HTML | "application/xml" | "application/json" => {
            tracing::info!(client = %ctx.client, mime = asset.mime, method = %ctx.method, "Request to load file");
        }
        _ => {
            tracing::debug!(client = %ctx.client, mime = asset.mime, method = %ctx.method, "Request to load file");
        }
    }

    let mut response = ([(header::CONTENT_TYPE, asset.mime)], asset.body).into_response();
    if asset.mime != MIME_HTML {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_ASSET),
        );
    }
    Ok(response)
}
