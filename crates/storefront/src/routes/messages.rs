//! Messaging route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use rewear_core::{ProductId, UserId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::conversations::{ConversationSummary, MessageService};
use crate::state::AppState;
use crate::supabase::MessageRow;

/// Send-message form data.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: UserId,
    pub product_id: Option<ProductId>,
    pub content: String,
}

/// Mark-read form data: the thread is identified by its conversation key.
#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub counterparty_id: UserId,
    pub product_id: Option<ProductId>,
}

/// The caller's conversation summaries, newest first.
#[instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn conversations(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<ConversationSummary>>> {
    let summaries = MessageService::new(state.supabase())
        .conversations(&auth)
        .await?;
    Ok(Json(summaries))
}

/// The caller's thread for one product, oldest first.
#[instrument(skip(state, auth), fields(product_id = %id, user_id = %auth.user.id))]
pub async fn product_thread(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<MessageRow>>> {
    let thread = MessageService::new(state.supabase())
        .product_thread(id, &auth)
        .await?;
    Ok(Json(thread))
}

/// Send a message to a counterparty, optionally about a product.
#[instrument(skip(state, auth, request), fields(user_id = %auth.user.id, receiver_id = %request.receiver_id))]
pub async fn send(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageRow>)> {
    if request.content.trim().is_empty() {
        return Err(AppError::BadRequest("message cannot be empty".to_string()));
    }

    let row = MessageService::new(state.supabase())
        .send(&auth, request.receiver_id, request.product_id, request.content)
        .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// Mark a thread from a counterparty as read.
#[instrument(skip(state, auth, request), fields(user_id = %auth.user.id, counterparty_id = %request.counterparty_id))]
pub async fn mark_read(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<MarkReadRequest>,
) -> Result<StatusCode> {
    MessageService::new(state.supabase())
        .mark_read(&auth, request.counterparty_id, request.product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
