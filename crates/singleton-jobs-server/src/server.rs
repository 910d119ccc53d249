/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! HTTP surface: the delta endpoint and a liveness greeting.
//!
//! `POST /delta` answers `200` before any processing happens. The handler
//! only takes the batch's place in the lock queue; the body is then handed to
//! a task on the [`TaskTracker`] so shutdown can wait for batches
//! that are still running instead of cutting them off mid-write.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use singleton_jobs::DeltaProcessor;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::task::TaskTracker;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub const GREETING: &str = "Hello from harvesting-singleton-jobs-service";

#[derive(Clone)]
pub struct AppState {
    processor: Arc<DeltaProcessor>,
    tracker: TaskTracker,
}

impl AppState {
    pub fn new(processor: Arc<DeltaProcessor>) -> Self {
        Self {
            processor,
            tracker: TaskTracker::new(),
        }
    }

    /// Tracks every batch accepted through `/delta`.
    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/delta", post(receive_delta))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn hello() -> &'static str {
    GREETING
}

async fn receive_delta(State(state): State<AppState>, body: Bytes) -> StatusCode {
    // Queue the batch before answering so batches run in arrival order.
    let ticket = state.processor.serializer().enqueue().await;
    let processor = state.processor.clone();
    state.tracker.spawn(async move {
        let report = processor.process_queued(ticket, &body).await;
        info!(
            batch_id = %report.batch_id,
            tasks = report.outcomes.len(),
            aborted = report.is_aborted(),
            "Delta batch finished"
        );
    });
    StatusCode::OK
}

/// Serves until `shutdown` resolves, then waits for in-flight batches.
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    max_body_bytes: usize,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let tracker = state.tracker.clone();
    axum::serve(listener, router(state, max_body_bytes))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracker.close();
    if !tracker.is_empty() {
        info!("Waiting for {} in-flight batch(es) to finish", tracker.len());
    }
    tracker.wait().await;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown requested");
}
