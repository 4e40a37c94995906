//! HTTP edit-server for browser extensions
//!
//! The server exposes two endpoints: `POST /` edits the request body with the
//! configured external editor and answers with the result, `GET /status`
//! describes the editor in use. [`client::check_status`] is the matching
//! liveness probe.

pub mod client;
pub mod handlers;
pub mod router;

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use edsrv_core::{Editor, EdsrvError, Result};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

pub use client::check_status;
pub use router::{router, AppState, MAX_BODY_BYTES, ROOT_PATH, STATUS_PATH};

/// Plain-text content type used for every response
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// HTTP response wrapper
#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a new HTTP response
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Set response body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Create a plain-text 200 response
    pub fn text(body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::OK).plain().with_body(body)
    }

    /// Create a plain-text error response
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::new(status).plain().with_body(message.as_bytes())
    }

    fn plain(mut self) -> Self {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
        self
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Edit-server bound to its listen address
pub struct EditServer {
    listener: TcpListener,
    editor: Arc<dyn Editor>,
}

impl EditServer {
    /// Bind the listen address, nothing is served until [`EditServer::run`]
    pub async fn bind(addr: &str, editor: Arc<dyn Editor>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| EdsrvError::server(format!("failed to bind to {}: {}", addr, e)))?;

        Ok(Self { listener, editor })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        info!(
            %addr,
            editor = self.editor.command(),
            tmp_dir = %self.editor.tmp_dir().display(),
            "starting edit-server..."
        );

        axum::serve(self.listener, router(self.editor))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                error!(error = %e, "server error");
                EdsrvError::server(e.to_string())
            })?;

        info!("edit-server stopped");
        Ok(())
    }
}
