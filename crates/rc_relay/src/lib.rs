//! An HTTP relay between chat clients and the backend that streams replies.
//!
//! The relay is stateless. Each inbound request results in exactly one
//! forwarded request, without retries.

mod error;
mod proxy;
pub mod target;

use std::{future::Future, io, sync::Arc};

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::info;

pub use crate::error::{ErrorBody, RelayError};

/// Route on which chat requests are accepted.
pub const CHAT_STREAM_ROUTE: &str = "/api/chat/stream";

/// Shared by all requests.
#[derive(Debug, Clone)]
pub struct RelayState {
    client: reqwest::Client,
    backend_url: Arc<str>,
}

impl RelayState {
    #[must_use]
    pub fn new(backend_url: impl Into<Arc<str>>) -> Self {
        Self {
            client: reqwest::Client::new(),
            backend_url: backend_url.into(),
        }
    }

    #[must_use]
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    #[must_use]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[must_use]
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route(CHAT_STREAM_ROUTE, post(proxy::stream_chat))
        .route("/healthz", get(health))
        .with_state(state)
}

/// Serve the relay on `listener` until `shutdown` resolves.
///
/// In-flight requests are allowed to finish after `shutdown` resolved.
pub async fn serve<F>(listener: TcpListener, state: RelayState, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(
        addr = %listener.local_addr()?,
        backend = state.backend_url(),
        "Relay listening."
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Relay stopped.");
    Ok(())
}

/// `GET /healthz`
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
