//! Outbound reachability check for services the container depends on.
//!
//! A single GET is made to the given URI. On a transport failure the request is
//! retried once with the scheme flipped (https to http or the reverse). The
//! outcome is only logged and never affects request handling.

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::SERVICE_CHECK_TIMEOUT_SECS;

/// Result of probing a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    /// Responded 200 at `address`
    Online { address: String },
    /// Responded with a non-200 status
    Down { address: String, code: u16 },
    /// Neither attempt produced a response
    Unreachable { address: String, error: String },
}

/// Swap `https://` for `http://` and vice versa. `None` for any other scheme.
pub fn flip_scheme(uri: &str) -> Option<String> {
    let lower = uri.to_ascii_lowercase();
    if lower.starts_with("https://") {
        Some(format!("http://{}", &uri["https://".len()..]))
    } else if lower.starts_with("http://") {
        Some(format!("https://{}", &uri["http://".len()..]))
    } else {
        None
    }
}

pub fn client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(SERVICE_CHECK_TIMEOUT_SECS))
        .build()
}

/// Probe `uri`, falling back once to the other scheme on a transport error.
pub async fn check_service(client: &reqwest::Client, service: &str, uri: &str) -> ServiceStatus {
    let first_error = match probe(client, uri).await {
        Ok(code) => return report(service, uri, code),
        Err(e) => e,
    };

    let Some(retry) = flip_scheme(uri) else {
        return unreachable(service, uri, first_error);
    };

    tracing::info!(
        service = %service,
        attempt1 = %uri,
        attempt2 = %retry,
        error = %first_error,
        "Service unreachable; retrying with the other protocol"
    );

    match probe(client, &retry).await {
        Ok(code) => report(service, &retry, code),
        Err(e) => unreachable(service, uri, e),
    }
}

async fn probe(client: &reqwest::Client, uri: &str) -> reqwest::Result<StatusCode> {
    Ok(client.get(uri).send().await?.status())
}

fn report(service: &str, address: &str, code: StatusCode) -> ServiceStatus {
    if code == StatusCode::OK {
        tracing::info!(service = %service, address = %address, code = code.as_u16(), "Service online");
        ServiceStatus::Online {
            address: address.to_string(),
        }
    } else {
        tracing::error!(
            service = %service,
            address = %address,
            code = code.as_u16(),
            "Service offline; failed to communicate with service, possibly down"
        );
        ServiceStatus::Down {
            address: address.to_string(),
            code: code.as_u16(),
        }
    }
}

fn unreachable(service: &str, address: &str, error: reqwest::Error) -> ServiceStatus {
    tracing::error!(
        service = %service,
        address = %address,
        error = %error,
        "Service offline; address does not exist"
    );
    ServiceStatus::Unreachable {
        address: address.to_string(),
        error: error.to_string(),
    }
}
