//! HTTP server module.
//!
//! Plain HTTP only; the container is expected to sit behind a proxy or be
//! reached on the local network. The server includes graceful shutdown on
//! SIGTERM/SIGINT.

mod server;
mod shutdown;

pub use server::{start_server, ServerError};
