//! Liveness check against a running edit-server

use edsrv_core::{EdsrvError, Result};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::router::STATUS_PATH;

/// Default bound for the whole status request
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Status endpoint URL for the informed listen address
pub fn status_url(addr: &str) -> Result<Url> {
    let base = Url::parse(&format!("http://{}", addr))
        .map_err(|e| EdsrvError::config(format!("invalid address {:?}: {}", addr, e)))?;
    base.join(STATUS_PATH)
        .map_err(|e| EdsrvError::config(format!("invalid address {:?}: {}", addr, e)))
}

/// Requests the status endpoint, returning the response body on 200
///
/// Connection failures and timeouts are reported as
/// [`EdsrvError::StatusConnection`], any other status code as
/// [`EdsrvError::StatusCode`]. Nothing is retried.
pub async fn check_status(addr: &str, timeout: Duration) -> Result<String> {
    let url = status_url(addr)?;
    info!(%url, "dialing in...");

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .no_proxy()
        .build()
        .map_err(|e| EdsrvError::server(format!("unable to build HTTP client: {}", e)))?;

    let connection_error = |e: reqwest::Error| {
        let reason = if e.is_timeout() {
            format!("timed out after {:?}", timeout)
        } else {
            e.to_string()
        };
        EdsrvError::StatusConnection {
            url: url.to_string(),
            reason,
        }
    };

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(connection_error)?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(EdsrvError::StatusCode(status.as_u16()));
    }

    let body = response.text().await.map_err(connection_error)?;
    debug!(%url, %body, "status response");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_url() {
        let url = status_url("127.0.0.1:8928").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8928/status");

        let url = status_url("localhost:1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:1/status");
    }

    #[test]
    fn test_status_url_rejects_garbage() {
        assert!(matches!(
            status_url("127.0.0.1:notaport"),
            Err(EdsrvError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_check_status_against_closed_port() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let started = std::time::Instant::now();
        let err = check_status(&addr, Duration::from_secs(2)).await.unwrap_err();

        assert!(matches!(err, EdsrvError::StatusConnection { .. }));
        assert!(err.to_string().contains("connection error"));
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
