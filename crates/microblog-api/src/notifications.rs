use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use anyhow::Context;

use microblog_types::api::NotificationQuery;
use microblog_types::models::Notification;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::{AppState, blocking};

/// Polling endpoint: notifications newer than `since`, oldest first.
pub async fn poll(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let since = query.since;
    let rows = blocking(&state, move |s| Ok(s.db.notifications_since(user.id, since)?)).await?;

    let notifications = rows
        .into_iter()
        .map(|row| -> Result<Notification, ApiError> {
            let data = row
                .data()
                .with_context(|| format!("corrupt payload on notification {}", row.id))?;
            Ok(Notification {
                name: row.name,
                data,
                timestamp: row.timestamp,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(Json(notifications))
}
