pub mod auth;
pub mod error;
pub mod follows;
pub mod mail;
pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod posts;
pub mod profile;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tracing::error;

use microblog_auth::CredentialStore;
use microblog_db::Database;

use crate::error::ApiError;
use crate::mail::{MailConfig, Mailer};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub credentials: CredentialStore,
    pub mailer: Arc<dyn Mailer>,
    pub mail: MailConfig,
    pub posts_per_page: u32,
}

/// All routes. Transport layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/reset_password/request", post(auth::request_password_reset))
        .route("/auth/reset_password", post(auth::reset_password));

    let protected_routes = Router::new()
        .route("/", get(posts::index))
        .route("/posts", post(posts::create_post))
        .route("/explore", get(posts::explore))
        .route("/users/{username}", get(profile::profile))
        .route("/profile", put(profile::edit_profile))
        .route("/follow/{username}", post(follows::follow))
        .route("/unfollow/{username}", post(follows::unfollow))
        .route("/messages", get(messages::chats))
        .route(
            "/messages/{username}",
            get(messages::conversation).post(messages::send_message),
        )
        .route("/notifications", get(notifications::poll))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&*state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
}
