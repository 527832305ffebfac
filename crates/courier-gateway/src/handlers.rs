// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the administrative API.

use std::str::FromStr;

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use courier_agent::ConversationView;
use courier_core::{ConversationId, Message, Role, ScheduledTask};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Query string for the paginated listing.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u32,
}

/// Form body carrying new message content.
#[derive(Debug, Deserialize)]
pub struct ContentForm {
    pub content: String,
}

/// Form body for appending a message.
#[derive(Debug, Deserialize)]
pub struct AddMessageForm {
    pub role: String,
    pub content: String,
}

/// Form body with a single `message` field.
#[derive(Debug, Deserialize)]
pub struct MessageForm {
    pub message: String,
}

/// Form body for setting a conversation's system message.
#[derive(Debug, Deserialize)]
pub struct SystemMessageForm {
    #[serde(rename = "chatId")]
    pub chat_id: String,
    pub message: String,
}

/// Form body for scheduling a task.
#[derive(Debug, Deserialize)]
pub struct TaskForm {
    pub prompt: String,
    #[serde(rename = "dueAt")]
    pub due_at: String,
    #[serde(default)]
    pub key: Option<String>,
}

/// Form body for replacing a profile.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub profile: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<GatewayState>,
) -> Result<Json<Vec<ConversationId>>, ApiError> {
    Ok(Json(state.admin.conversation_ids().await?))
}

/// GET /api/conversations/{id}
pub async fn get_conversation(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationView>, ApiError> {
    Ok(Json(state.admin.conversation(&ConversationId::new(id)).await?))
}

/// DELETE /api/conversations/{id}
pub async fn delete_conversation(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .admin
        .delete_conversation(&ConversationId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/conversations/{id}/messages?page=N
pub async fn list_messages(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state
        .admin
        .list_messages(&ConversationId::new(id), query.page)
        .await?;
    Ok(Json(messages))
}

/// POST /api/conversations/{id}/messages
pub async fn add_message(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Form(form): Form<AddMessageForm>,
) -> Result<Response, ApiError> {
    let role = Role::from_str(form.role.trim().to_lowercase().as_str())
        .map_err(|_| ApiError::bad_request(format!("unknown role '{}'", form.role)))?;
    let message = state
        .admin
        .add_message(&ConversationId::new(id), role, &form.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)).into_response())
}

/// PUT /api/conversations/{id}/messages/{message_id}
pub async fn update_message(
    State(state): State<GatewayState>,
    Path((id, message_id)): Path<(String, i64)>,
    Form(form): Form<ContentForm>,
) -> Result<Json<Message>, ApiError> {
    let message = state
        .admin
        .update_message(&ConversationId::new(id), message_id, &form.content)
        .await?;
    Ok(Json(message))
}

/// DELETE /api/conversations/{id}/messages/{message_id}
pub async fn delete_message(
    State(state): State<GatewayState>,
    Path((id, message_id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    state
        .admin
        .delete_message(&ConversationId::new(id), message_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/prompt/{id}
///
/// The raw request body is the prompt; the reply is plain text.
pub async fn prompt_conversation(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    body: String,
) -> Result<String, ApiError> {
    let reply = state.admin.prompt(&ConversationId::new(id), &body).await?;
    Ok(reply.text())
}

/// POST /api/prompt
///
/// Runs the prompt in the anonymous conversation.
pub async fn prompt_anonymous(
    State(state): State<GatewayState>,
    Form(form): Form<MessageForm>,
) -> Result<String, ApiError> {
    let reply = state
        .admin
        .prompt(&ConversationId::anonymous(), &form.message)
        .await?;
    Ok(reply.text())
}

/// POST /api/systemMessage
pub async fn set_system_message(
    State(state): State<GatewayState>,
    Form(form): Form<SystemMessageForm>,
) -> Result<String, ApiError> {
    let chat_id = form.chat_id.trim();
    if chat_id.is_empty() {
        return Err(ApiError::bad_request("chatId must not be empty"));
    }
    state
        .admin
        .set_system_message(&ConversationId::new(chat_id), &form.message)
        .await?;
    Ok(format!("System message set for conversation {chat_id}"))
}

/// POST /api/broadcast
pub async fn broadcast(
    State(state): State<GatewayState>,
    Form(form): Form<MessageForm>,
) -> Result<String, ApiError> {
    let delivered = state.admin.broadcast(&form.message).await?;
    Ok(delivered.to_string())
}

/// GET /api/tasks
pub async fn list_tasks(
    State(state): State<GatewayState>,
) -> Result<Json<Vec<ScheduledTask>>, ApiError> {
    Ok(Json(state.admin.tasks().await?))
}

/// GET /api/tasks/{id}
pub async fn list_conversation_tasks(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ScheduledTask>>, ApiError> {
    let tasks = state
        .admin
        .conversation_tasks(&ConversationId::new(id))
        .await?;
    Ok(Json(tasks))
}

/// POST /api/tasks/{id}
pub async fn schedule_task(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Form(form): Form<TaskForm>,
) -> Result<Response, ApiError> {
    let task = state
        .admin
        .schedule_task(
            &ConversationId::new(id),
            &form.prompt,
            &form.due_at,
            form.key.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(task)).into_response())
}

/// DELETE /api/tasks/{id}/{key}
pub async fn cancel_task(
    State(state): State<GatewayState>,
    Path((id, key)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .admin
        .cancel_task(&ConversationId::new(id), &key)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/profile/{id}
pub async fn get_profile(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    Ok(state.admin.profile(&ConversationId::new(id)).await?)
}

/// POST /api/profile/{id}
pub async fn set_profile(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Form(form): Form<ProfileForm>,
) -> Result<String, ApiError> {
    let id = ConversationId::new(id);
    state.admin.set_profile(&id, &form.profile).await?;
    Ok(format!("Profile set for conversation {id}"))
}
