use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use chrono::Utc;

use crate::error::ApiError;
use crate::{AppState, blocking};

/// The authenticated user, inserted as a request extension by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// Validate the bearer session token and record the user's activity.
///
/// The username is re-read from the database since it may have changed
/// after the token was issued.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let unauthorized = || ApiError::Unauthorized("Authentication required".into());

    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(unauthorized)?;

    let claims = state
        .credentials
        .validate_session_token(bearer.token())
        .ok_or_else(unauthorized)?;

    let user_id = claims.sub;
    let user = blocking(&state, move |s| {
        let user = s.db.get_user_by_id(user_id)?;
        if user.is_some() {
            s.db.touch_last_seen(user_id, Utc::now())?;
        }
        Ok(user)
    })
    .await?
    .ok_or_else(unauthorized)?;

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
    });
    Ok(next.run(req).await)
}
