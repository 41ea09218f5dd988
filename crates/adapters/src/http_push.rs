// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local HTTP listener for the metadata-push variant of C4: the control
//! plane hits a single path whenever metadata changes; the watcher then
//! fetches the document itself, the same way the port-knock variant does
//! after a knock (spec §4.4).

use agentcore::Error;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
struct PushState {
    tx: mpsc::Sender<()>,
}

async fn metadata_changed(State(state): State<PushState>) -> StatusCode {
    match state.tx.send(()).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => {
            warn!("metadata-changed signal received after watcher shut down");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Binds `addr`, returning the listener and the address actually bound (so
/// callers can pass port `0` and discover what was assigned).
pub async fn bind(addr: SocketAddr) -> Result<(TcpListener, SocketAddr), Error> {
    let listener = TcpListener::bind(addr).await.map_err(|e| Error::FetchMetadataFailed(e.to_string()))?;
    let bound = listener.local_addr().map_err(|e| Error::FetchMetadataFailed(e.to_string()))?;
    Ok((listener, bound))
}

/// Serves `POST /metadata-changed` on `listener` until `cancel` fires,
/// forwarding one signal on `tx` per accepted hit.
pub async fn serve(listener: TcpListener, tx: mpsc::Sender<()>, cancel: CancellationToken) -> Result<(), Error> {
    let app = Router::new()
        .route("/metadata-changed", post(metadata_changed))
        .layer(TraceLayer::new_for_http())
        .with_state(PushState { tx });

    info!(addr = ?listener.local_addr().ok(), "metadata push listener started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| Error::FetchMetadataFailed(e.to_string()))
}

#[cfg(test)]
#[path = "http_push_tests.rs"]
mod tests;
