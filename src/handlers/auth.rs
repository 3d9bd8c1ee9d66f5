// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::{
    error::AppError,
    models::account::{
        AdminLoginResponse, ChangeClassRequest, LoginRequest, LoginResponse, RegisterRequest,
    },
    services::accounts,
    state::AppState,
    utils::jwt::{Claims, Role, sign_jwt},
};

/// Registers a new student and signs them in.
///
/// Returns 201 Created with a token and the account (password hash excluded).
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = accounts::register(state.store.as_ref(), payload).await?;
    let token = student_token(&state, user.id)?;

    Ok((StatusCode::CREATED, Json(LoginResponse { token, user })))
}

/// Authenticates a student and returns a JWT token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = accounts::login(state.store.as_ref(), &payload.email, &payload.password).await?;
    let token = student_token(&state, user.id)?;

    tracing::info!(id = user.id, "Student logged in");
    Ok(Json(LoginResponse { token, user }))
}

/// Password-gated class change. The student has to log in again afterwards.
pub async fn change_class(
    State(state): State<AppState>,
    Json(payload): Json<ChangeClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    accounts::change_class(state.store.as_ref(), payload).await?;
    Ok(Json(json!({})))
}

/// Authenticates against the configured admin credential.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    accounts::admin_login(state.admin.as_deref(), &payload.email, &payload.password)?;

    let token = sign_jwt(
        payload.email.trim(),
        Role::Admin,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    tracing::info!("Admin logged in");
    Ok(Json(AdminLoginResponse { token }))
}

/// The account behind a student token.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let id = claims.student_id()?;
    let account = accounts::lookup(state.store.as_ref(), id)
        .await?
        .ok_or(AppError::NotFound("Account not found".to_string()))?;
    Ok(Json(account))
}

fn student_token(state: &AppState, id: i64) -> Result<String, AppError> {
    sign_jwt(
        &id.to_string(),
        Role::Student,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )
}
