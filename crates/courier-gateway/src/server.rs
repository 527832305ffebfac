// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the admin API.

use std::time::Instant;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use courier_agent::AdminService;
use courier_core::CourierError;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub admin: AdminService,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(admin: AdminService) -> Self {
        Self {
            admin,
            start_time: Instant::now(),
        }
    }
}

/// Server bind address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the admin router.
///
/// - GET /health
/// - GET /api/conversations
/// - GET, DELETE /api/conversations/{id}
/// - GET, POST /api/conversations/{id}/messages
/// - PUT, DELETE /api/conversations/{id}/messages/{message_id}
/// - POST /api/prompt, /api/prompt/{id}
/// - POST /api/systemMessage
/// - POST /api/broadcast
/// - GET /api/tasks
/// - GET, POST /api/tasks/{id}
/// - DELETE /api/tasks/{id}/{key}
/// - GET, POST /api/profile/{id}
pub fn router(state: GatewayState) -> Router {
    let api_routes = Router::new()
        .route("/conversations", get(handlers::list_conversations))
        .route(
            "/conversations/{id}",
            get(handlers::get_conversation).delete(handlers::delete_conversation),
        )
        .route(
            "/conversations/{id}/messages",
            get(handlers::list_messages).post(handlers::add_message),
        )
        .route(
            "/conversations/{id}/messages/{message_id}",
            put(handlers::update_message).delete(handlers::delete_message),
        )
        .route("/prompt", post(handlers::prompt_anonymous))
        .route("/prompt/{id}", post(handlers::prompt_conversation))
        .route("/systemMessage", post(handlers::set_system_message))
        .route("/broadcast", post(handlers::broadcast))
        .route("/tasks", get(handlers::list_tasks))
        .route(
            "/tasks/{id}",
            get(handlers::list_conversation_tasks).post(handlers::schedule_task),
        )
        .route("/tasks/{id}/{key}", delete(handlers::cancel_task))
        .route(
            "/profile/{id}",
            get(handlers::get_profile).post(handlers::set_profile),
        );

    Router::new()
        .route("/health", get(handlers::get_health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the admin HTTP server and serve until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), CourierError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CourierError::Internal(format!("failed to bind admin server to {addr}: {e}")))?;

    tracing::info!("Admin server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| CourierError::Internal(format!("admin server error: {e}")))?;

    tracing::info!("Admin server stopped");
    Ok(())
}
