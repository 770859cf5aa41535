use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_database::BackendClient;
use shared_models::auth::{LoginResponse, Session};
use shared_models::error::AppError;
use shared_utils::state::AppState;

use crate::models::{AuthError, LoginRequest, RegistrationForm};

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials | AuthError::WrongPortal => AppError::Auth(e.to_string()),
            AuthError::Backend(msg) => AppError::ExternalService(msg),
            AuthError::SessionStore(msg) => AppError::Internal(msg),
        }
    }
}

fn backend_error(e: anyhow::Error) -> AuthError {
    let message = e.to_string();
    if message.starts_with("Authentication error") {
        AuthError::InvalidCredentials
    } else {
        AuthError::Backend(message)
    }
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let role = form.role();
    debug!("Registration attempt for {} portal", role);

    if let Err(errors) = form.validate() {
        debug!("Registration rejected with {} field errors", errors.len());
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "success": false,
                "errors": errors,
            })),
        ));
    }

    let body = serde_json::to_value(&form).map_err(|e| AppError::Internal(e.to_string()))?;
    let created: Value = BackendClient::new(&state.config)
        .request(Method::POST, "/auth/register", None, Some(body))
        .await
        .map_err(backend_error)?;

    info!("Registered new {} account", role);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "role": role,
            "user": created,
        })),
    ))
}

/// Signs in against the backend and keeps the resulting session.
#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    debug!("Login attempt for {}", request.email);

    let body = json!({ "email": request.email, "password": request.password });
    let response: LoginResponse = BackendClient::new(&state.config)
        .request(Method::POST, "/auth/login", None, Some(body))
        .await
        .map_err(backend_error)?;

    if let Some(expected) = request.role {
        if response.user.role != expected {
            warn!("User {} tried the {} portal but is a {}", response.user.id, expected, response.user.role);
            return Err(AuthError::WrongPortal.into());
        }
    }

    state.sessions
        .save(Session::new(response.token.clone(), response.user.clone()))
        .await
        .map_err(|e| AuthError::SessionStore(e.to_string()))?;

    info!("User {} signed in as {}", response.user.id, response.user.role);
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn current_session(Extension(session): Extension<Session>) -> Json<Session> {
    Json(session)
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let removed = state.sessions
        .remove(&session.token)
        .await
        .map_err(|e| AuthError::SessionStore(e.to_string()))?;

    info!("User {} signed out", session.user.id);
    Ok(Json(json!({ "success": removed })))
}
