use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest, TokenResponse},
        extractors::{resolve_identity, Bearer},
        password::{hash_password, verify_password},
        repo_types::User,
    },
    db::Session,
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.name = payload.name.trim().to_string();

    if payload.name.is_empty() {
        return Err(ApiError::BadRequest("Name is required"));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email"));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::BadRequest("Password too short"));
    }

    let mut session = Session::begin(&state.db).await?;

    if User::find_by_email(&mut session, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&mut session, &payload.name, &payload.email, &hash).await?;
    session.commit().await?;

    let token = state.jwt.issue(user.id)?;
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(Json(TokenResponse::bearer(token)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email"));
    }

    let mut session = Session::begin(&state.db).await?;

    // Unknown email and wrong password get the same answer.
    let user = User::find_by_email(&mut session, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::Unauthorized("Invalid credentials")
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let token = state.jwt.issue(user.id)?;
    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(TokenResponse::bearer(token)))
}

#[instrument(skip(state, bearer))]
pub async fn me(
    State(state): State<AppState>,
    bearer: Bearer,
) -> Result<Json<PublicUser>, ApiError> {
    let mut session = Session::begin(&state.db).await?;
    let user = resolve_identity(&state.jwt, &bearer.0, &mut session).await?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("jo@example.com"));
        assert!(is_valid_email("jo.doe+tag@sub.example.org"));
    }

    #[test]
    fn email_validation_rejects_junk() {
        assert!(!is_valid_email("jo@example"));
        assert!(!is_valid_email("example.com"));
        assert!(!is_valid_email("jo @example.com"));
        assert!(!is_valid_email(""));
    }
}
