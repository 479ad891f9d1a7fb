use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use microblog_db::queries::posts::MAX_POST_LEN;
use microblog_types::api::{CreatePostRequest, PageQuery};
use microblog_types::models::{Page, Post};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::{AppState, blocking};

/// Home feed: own posts plus everything from followed users.
pub async fn index(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, move |s| Ok(s.db.following_posts(user.id)?)).await?;
    let posts: Vec<Post> = rows.into_iter().map(Post::from).collect();
    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let body = validate_body(&req.body)?;

    let id = blocking(&state, move |s| Ok(s.db.create_post(user.id, &body)?)).await?;
    debug!("User {} posted {}", user.id, id);

    Ok(StatusCode::CREATED)
}

/// Global timeline, newest first, `posts_per_page` at a time.
pub async fn explore(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.max(1);
    let per_page = state.posts_per_page;

    let (rows, total) = blocking(&state, move |s| Ok(s.db.explore_posts(page, per_page)?)).await?;

    let page = Page::new(rows, page, per_page, total).map(Post::from);
    if page.is_past_end() {
        debug!("Explore page {} requested, max is {}", page.page, page.pages);
    }
    Ok(Json(page))
}

fn validate_body(body: &str) -> Result<String, ApiError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ApiError::field("body", "This field is required."));
    }
    if body.chars().count() > MAX_POST_LEN {
        return Err(ApiError::field(
            "body",
            format!("Field must be between 1 and {MAX_POST_LEN} characters long."),
        ));
    }
    Ok(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_body_rules() {
        assert_eq!(validate_body("  hi  ").unwrap(), "hi");
        assert!(matches!(validate_body("   "), Err(ApiError::Validation(_))));
        assert!(validate_body(&"x".repeat(256)).is_ok());
        assert!(validate_body(&"x".repeat(257)).is_err());
    }
}
