//! JSON status envelope shared by every non-asset response.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::RequestContext;
use crate::error::AppError;
use crate::state::AppState;
use crate::uptime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Healthy,
    Unhealthy,
    Unauthorized,
    Ok,
}

/// Per-request status record. Field names are part of the public JSON contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    /// Container address
    pub ip: String,
    pub gateway: String,
    pub client: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: Status,
    /// Request path and query as received
    #[serde(rename = "ref")]
    pub reference: String,
    pub method: String,
    pub code: u16,
    /// Whole seconds since process start
    pub uptime: u64,
    pub uptime_short: String,
    pub uptime_long: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl StatusRecord {
    pub fn new(
        state: &AppState,
        ctx: &RequestContext,
        code: StatusCode,
        status: Status,
        message: impl Into<String>,
    ) -> Result<Self, AppError> {
        let up = state.runtime.uptime();
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis() as u64;

        Ok(Self {
            ip: state.network.ip.clone(),
            gateway: state.network.gateway.clone(),
            client: ctx.client.clone(),
            message: message.into(),
            error: None,
            status,
            reference: ctx.reference.clone(),
            method: ctx.method.to_string(),
            code: code.as_u16(),
            uptime: up.as_secs_f64().round() as u64,
            uptime_short: uptime::short(up),
            uptime_long: uptime::long(up),
            timestamp,
        })
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

impl IntoResponse for StatusRecord {
    fn into_response(self) -> Response {
        let code = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (code, Json(self)).into_response()
    }
}
