use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::io;

use crate::gate::GateError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Template rendering error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Health check queue: {0}")]
    Gate(#[from] GateError),

    #[error("System clock error: {0}")]
    Clock(#[from] std::time::SystemTimeError),
}

/// Generic 500 body; no detail from the error reaches the client.
pub fn internal_server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain")],
        "Internal Server Error",
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, code = 500, "Cannot handle request");
        internal_server_error()
    }
}
