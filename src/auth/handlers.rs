use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::{password, session};
use crate::error::{AppError, AppResult};
use crate::extractors::{self, CurrentUser};
use crate::state::AppState;
use crate::store::users;
use crate::views::UserSummary;

// -- Cookie helpers --

fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", name)
}

// -- Request / response bodies --

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

/// JSON body plus a fresh session cookie.
fn signed_in(state: &AppState, status: StatusCode, token: String, user: UserSummary) -> Response {
    let cookie = session_cookie(
        &state.config.auth.cookie_name,
        &token,
        state.config.auth.session_hours,
    );
    (
        status,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse { token, user }),
    )
        .into_response()
}

// -- Handlers --

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Response> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::bad_request("All fields are required"));
    }

    let hash = password::hash_password(&req.password, state.config.auth.bcrypt_cost)?;

    let conn = state.db.get()?;
    let user = users::insert(&conn, &req.name, &req.email, &hash)?;
    let token = session::create_session(&conn, &user.id, state.config.auth.session_hours)?;
    tracing::info!("Registered user {}", user.id);

    Ok(signed_in(&state, StatusCode::CREATED, token, user.into()))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Response> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::bad_request("All fields are required"));
    }

    let conn = state.db.get()?;
    let user = users::find_by_email(&conn, &req.email)?
        .filter(|user| password::verify_password(&req.password, &user.password_hash))
        .ok_or_else(|| AppError::bad_request("Invalid credentials"))?;

    let token = session::create_session(&conn, &user.id, state.config.auth.session_hours)?;
    tracing::info!("User {} logged in", user.id);

    Ok(signed_in(&state, StatusCode::OK, token, user.into()))
}

/// POST /api/auth/logout. Always succeeds; clears the cookie either way.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(token) = extractors::session_token(&headers, cookie_name) {
        let conn = state.db.get()?;
        if let Err(e) = session::delete_session(&conn, &token) {
            tracing::warn!("Failed to delete session: {}", e);
        }
    }

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie(cookie_name))],
        Json(serde_json::json!({ "message": "Logged out" })),
    )
        .into_response())
}

/// GET /api/users/me
pub async fn me(user: CurrentUser) -> Json<UserSummary> {
    Json(UserSummary::from(&user))
}

/// PUT /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<UserSummary>> {
    let conn = state.db.get()?;
    let updated =
        users::update_profile(&conn, &user.id, req.name.as_deref(), req.email.as_deref())?;
    tracing::info!("User {} updated their profile", user.id);
    Ok(Json(updated.into()))
}
