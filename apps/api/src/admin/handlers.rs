use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::admin::bearer_token;
use crate::admin::session::AdminSession;
use crate::errors::AppError;
use crate::form::controller::Flow;
use crate::form::handlers::{mount_form, FormView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// POST /api/v1/admin/session
pub async fn handle_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<AdminSession>), AppError> {
    let session = state.admin.login(&request.password, Utc::now())?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// DELETE /api/v1/admin/session
pub async fn handle_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    if !state.admin.logout(token) {
        return Err(AppError::Unauthorized);
    }
    info!("Admin session closed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/forms
///
/// Mounts an admin-entered application bound to the caller's session.
pub async fn handle_create_admin_form(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<FormView>), AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let session = state.admin.validate(token, Utc::now())?;
    mount_form(&state, Flow::Admin { session }).await
}
