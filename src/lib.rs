//! Backage: status and dashboard web server for the backage container.
//!
//! Serves a templated dashboard, a JSON health API guarded by a concurrency
//! gate, and a restart API that re-runs startup diagnostics. Cron schedules for
//! the sync task are announced in the log.

pub mod cache;
pub mod client_ip;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod flags;
pub mod gate;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod scheduler;
pub mod service_check;
pub mod state;
pub mod system;
pub mod templates;
pub mod uptime;
