use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{info, warn};

use microblog_types::api::{
    FieldError, LoginRequest, LoginResponse, PasswordResetForm, PasswordResetRequest,
    RegisterRequest, RegisterResponse, StatusMessage,
};

use crate::error::ApiError;
use crate::mail::ResetEmail;
use crate::{AppState, blocking};

const REQUIRED: &str = "This field is required.";
const PASSWORDS_DIFFER: &str = "Field must be equal to password.";

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = Vec::new();
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();

    if username.is_empty() {
        errors.push(FieldError::new("username", REQUIRED));
    }
    if !looks_like_email(&email) {
        errors.push(FieldError::new("email", "Invalid email address."));
    }
    if req.password.is_empty() {
        errors.push(FieldError::new("password", REQUIRED));
    }
    if req.password != req.repeat_password {
        errors.push(FieldError::new("repeat_password", PASSWORDS_DIFFER));
    }

    let (user_id, username) = blocking(&state, move |s| {
        if !username.is_empty() && s.db.get_user_by_username(&username)?.is_some() {
            errors.push(FieldError::new("username", "Username is already taken!"));
        }
        if !email.is_empty() && s.db.get_user_by_email(&email)?.is_some() {
            errors.push(FieldError::new(
                "email",
                "This email address has already created an account.",
            ));
        }
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        let password_hash = microblog_auth::password::hash_password(&req.password)?;
        let id = s.db.create_user(&username, &email, &password_hash)?;
        Ok((id, username))
    })
    .await?;

    info!("Registered user {} ({})", username, user_id);
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, username }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    let user = blocking(&state, move |s| {
        match s.db.get_user_by_username(&username)? {
            Some(user) if s.credentials.verify_password(&user, &req.password) => Ok(user),
            _ => Err(ApiError::Unauthorized(
                "Username or password is incorrect.".into(),
            )),
        }
    })
    .await?;

    let token = state.credentials.issue_session_token(user.id, &user.username)?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        username: user.username,
        token,
    }))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_string();

    let sent_to = blocking(&state, move |s| {
        let user = s
            .db
            .get_user_by_email(&email)?
            .ok_or_else(|| ApiError::NotFound("Email address is incorrect!".into()))?;

        let token = s.credentials.issue_reset_token(user.id, &user)?;
        let mail = ResetEmail::new(&s.mail, &user.username, &user.email, &token);
        s.mailer.send(&mail)?;

        info!("Password reset issued for user {}", user.id);
        Ok(user.email)
    })
    .await?;

    Ok(Json(StatusMessage::new(format!(
        "An email has been sent to {sent_to}"
    ))))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetForm>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(grant) = state.credentials.validate_reset_token(&req.token) else {
        warn!("Password reset attempted with an invalid token");
        return Err(ApiError::InvalidToken);
    };

    if req.password.is_empty() {
        return Err(ApiError::field("password", REQUIRED));
    }
    if req.password != req.repeat_password {
        return Err(ApiError::field("repeat_password", PASSWORDS_DIFFER));
    }

    blocking(&state, move |s| {
        let mut user = s
            .db
            .get_user_by_id(grant.user_id)?
            .filter(|user| grant.is_current_for(user))
            .ok_or_else(|| {
                warn!("Password reset attempted with a spent token");
                ApiError::InvalidToken
            })?;
        s.credentials.set_password(&mut user, &req.password)?;
        s.db.save_password(&user)?;
        info!("Password changed for user {}", user.id);
        Ok(())
    })
    .await?;

    Ok(Json(StatusMessage::new("Your password changed successfully.")))
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::looks_like_email;

    #[test]
    fn email_shape() {
        assert!(looks_like_email("a@example.com"));
        assert!(!looks_like_email("example.com"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("a@localhost"));
        assert!(!looks_like_email("a@example."));
    }
}
