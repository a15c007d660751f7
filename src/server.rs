//! HTTP surface: admission, status queries, probes.
//!
//! Admission is the only synchronous phase: validate, mint an identifier,
//! register Pending, hand the job to the pool, answer. Delivery outcomes are
//! observable solely through the status endpoint.

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use uuid::Uuid;

use crate::{
    Signal,
    config::SenderConfig,
    dispatch::{DispatchJob, WorkerPool},
    error::ServerError,
    request::{EmailRequest, SendEmailRequest},
    status::StatusRegistry,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: StatusRegistry,
    pub pool: WorkerPool,
    /// Absent when the environment carries no credentials; admission then
    /// answers 400 while the read paths keep working.
    pub sender: Option<Arc<SenderConfig>>,
}

/// The service's HTTP server.
pub struct Server {
    listener: TcpListener,
    router: Router,
}

impl Server {
    /// Bind the listener and assemble the router.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the specified address fails.
    pub async fn bind(address: &str, state: AppState) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| ServerError::Bind {
                address: address.to_string(),
                source: e,
            })?;

        tracing::info!(address = %address, "Server bound successfully");

        Ok(Self {
            listener,
            router: router(state),
        })
    }

    /// Run the server until a shutdown signal is received.
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a runtime error.
    pub async fn serve(
        self,
        mut shutdown: tokio::sync::broadcast::Receiver<Signal>,
    ) -> Result<(), ServerError> {
        tracing::info!("Server starting");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Server received shutdown signal");
            })
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Build the service router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/send-email", post(send_email_handler))
        .route("/email-status/{request_id}", get(email_status_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route("/queue/stats", get(queue_stats_handler))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
}

/// Admission handler.
///
/// Returns before delivery completes; the identifier in the response is the
/// handle for later status queries.
async fn send_email_handler(
    State(state): State<AppState>,
    Json(raw): Json<SendEmailRequest>,
) -> Response {
    let request = match EmailRequest::validate(raw) {
        Ok(request) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.to_string() })),
            )
                .into_response();
        }
    };

    let Some(sender) = state.sender.clone() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing user credentials" })),
        )
            .into_response();
    };

    let request_id = Uuid::new_v4();

    // Registered before submission, so an immediate status query can never
    // miss the identifier.
    state.registry.insert_pending(request_id);

    let job = DispatchJob {
        request_id,
        request,
        sender,
    };

    if let Err(error) = state.pool.submit(job).await {
        tracing::error!(request_id = %request_id, error = %error, "Failed to submit job");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Dispatch queue unavailable" })),
        )
            .into_response();
    }

    tracing::debug!(request_id = %request_id, "Email request admitted");

    (
        StatusCode::OK,
        Json(json!({
            "message": "Email request processed",
            "request_id": request_id,
        })),
    )
        .into_response()
}

/// Status query handler.
///
/// Unknown identifiers - including strings that are not UUIDs at all -
/// answer with a not-found status rather than an error.
async fn email_status_handler(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Response {
    let status = request_id
        .parse::<Uuid>()
        .ok()
        .and_then(|id| state.registry.get(&id))
        .map_or_else(|| "Request ID not found".to_string(), |s| s.to_string());

    Json(json!({ "request_id": request_id, "status": status })).into_response()
}

/// Liveness probe handler.
async fn liveness_handler() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// Readiness probe handler.
///
/// The service is ready as soon as it serves requests: admission degrades
/// gracefully without credentials, so there is no separate component to
/// wait for.
async fn readiness_handler() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// Registry counts, for operators watching the queue.
async fn queue_stats_handler(State(state): State<AppState>) -> Response {
    Json(state.registry.stats()).into_response()
}
