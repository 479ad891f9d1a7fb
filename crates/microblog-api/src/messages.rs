use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use microblog_types::api::{SendMessageRequest, StatusMessage};
use microblog_types::models::{Conversation, Message};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::{AppState, AppStateInner, blocking};

pub async fn send_message(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if username == user.username {
        return Err(ApiError::Forbidden("You can't send yourself a message".into()));
    }
    let body = req.body.trim().to_string();
    if body.is_empty() {
        return Err(ApiError::field("body", "This field is required."));
    }

    let recipient = username.clone();
    blocking(&state, move |s| {
        let peer = resolve_peer(s, &user, &recipient)?;
        let id = s.db.deliver_message(user.id, peer, &body)?;
        info!("Message {} sent from {} to {}", id, user.id, peer);
        Ok(())
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(StatusMessage::new(format!(
            "Your message has been sent to the user {username}"
        ))),
    ))
}

/// Conversations the user has received, one per sender, newest first.
pub async fn chats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, move |s| Ok(s.db.get_chat_list(user.id)?)).await?;
    let chats: Vec<Message> = rows.into_iter().map(Message::from).collect();
    Ok(Json(chats))
}

/// Opening a thread marks the peer's messages read and refreshes the
/// viewer's unread-count notification in one transaction.
pub async fn conversation(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = blocking(&state, move |s| {
        let peer = resolve_peer(s, &user, &username)?;
        let messages = s
            .db
            .open_conversation(user.id, peer)?
            .into_iter()
            .map(Message::from)
            .collect();
        Ok(Conversation {
            peer: username,
            messages,
        })
    })
    .await?;

    Ok(Json(conversation))
}

fn resolve_peer(s: &AppStateInner, user: &CurrentUser, username: &str) -> Result<i64, ApiError> {
    let peer = s
        .db
        .get_user_by_username(username)?
        .ok_or_else(|| ApiError::NotFound(format!("User {username} does not exist.")))?;

    if peer.id == user.id {
        return Err(ApiError::Forbidden("You can't send a message to yourself!".into()));
    }
    Ok(peer.id)
}
