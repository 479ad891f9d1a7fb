//! Follow and unfollow routes. Refusing self-follows happens here: the
//! social graph in `microblog-db` accepts any edge it is given.

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::info;

use microblog_types::api::FollowResponse;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::{AppState, AppStateInner, blocking};

pub async fn follow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let response = blocking(&state, move |s| {
        let target = resolve_target(s, &user, &username, "follow")?;
        if s.db.follow(user.id, target)? {
            info!("User {} followed {}", user.id, target);
        }
        Ok(FollowResponse {
            message: format!("You are now following {username}"),
            username,
            following: true,
        })
    })
    .await?;

    Ok(Json(response))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let response = blocking(&state, move |s| {
        let target = resolve_target(s, &user, &username, "unfollow")?;
        if s.db.unfollow(user.id, target)? {
            info!("User {} unfollowed {}", user.id, target);
        }
        Ok(FollowResponse {
            message: format!("You unfollowed {username}."),
            username,
            following: false,
        })
    })
    .await?;

    Ok(Json(response))
}

fn resolve_target(
    s: &AppStateInner,
    user: &CurrentUser,
    username: &str,
    action: &str,
) -> Result<i64, ApiError> {
    let target = s
        .db
        .get_user_by_username(username)?
        .ok_or_else(|| ApiError::NotFound(format!("User {username} does not exist!")))?;

    if target.id == user.id {
        return Err(ApiError::Forbidden(format!("You can not {action} yourself!")));
    }
    Ok(target.id)
}
