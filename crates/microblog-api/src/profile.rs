use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::info;

use microblog_types::api::{EditProfileRequest, StatusMessage};
use microblog_types::models::{Post, Profile, ProfilePage};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::{AppState, blocking};

const MAX_ABOUT_ME_LEN: usize = 256;

pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(viewer): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let page = blocking(&state, move |s| {
        let user = s
            .db
            .get_user_by_username(&username)?
            .ok_or_else(|| ApiError::NotFound(format!("User {username} does not exist.")))?;

        let profile = Profile {
            id: user.id,
            followers_count: s.db.followers_count(user.id)?,
            following_count: s.db.following_count(user.id)?,
            is_following: s.db.is_following(viewer.id, user.id)?,
            username: user.username,
            about_me: user.about_me,
            last_seen: user.last_seen,
        };
        let posts = s
            .db
            .posts_by_user(profile.id)?
            .into_iter()
            .map(Post::from)
            .collect();

        Ok(ProfilePage {
            user: profile,
            posts,
        })
    })
    .await?;

    Ok(Json(page))
}

pub async fn edit_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<EditProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::field("username", "This field is required."));
    }
    let about_me = req.about_me.filter(|text| !text.trim().is_empty());
    if about_me
        .as_deref()
        .is_some_and(|text| text.chars().count() > MAX_ABOUT_ME_LEN)
    {
        return Err(ApiError::field(
            "about_me",
            format!("Field cannot be longer than {MAX_ABOUT_ME_LEN} characters."),
        ));
    }

    blocking(&state, move |s| {
        if username != user.username {
            if let Some(existing) = s.db.get_user_by_username(&username)? {
                if existing.id != user.id {
                    return Err(ApiError::field("username", "Please choose another username."));
                }
            }
        }
        s.db.update_profile(user.id, &username, about_me.as_deref())?;
        info!("User {} updated their profile", user.id);
        Ok(())
    })
    .await?;

    Ok(Json(StatusMessage::new("Your changes have been saved.")))
}
