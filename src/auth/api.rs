//! Authentication API Endpoints
//! Mission: Issue bearer tokens and register credentials

use crate::auth::{
    jwt::JwtAuth,
    models::{Credentials, RegisteredUser, TokenResponse},
    user_store::CredentialStore,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<CredentialStore>,
    pub tokens: Arc<JwtAuth>,
}

/// Token endpoint - POST /token (form fields, OAuth2 password flow carrier)
pub async fn issue_token(
    State(state): State<AuthState>,
    Form(credentials): Form<Credentials>,
) -> Result<Json<TokenResponse>, AuthApiError> {
    authenticate(&state, &credentials)
}

/// Login endpoint - POST /login/ (JSON body, same semantics as /token)
pub async fn login(
    State(state): State<AuthState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<TokenResponse>, AuthApiError> {
    authenticate(&state, &credentials)
}

/// Both login carriers funnel here: one generic rejection for unknown user
/// and bad password alike.
fn authenticate(
    state: &AuthState,
    credentials: &Credentials,
) -> Result<Json<TokenResponse>, AuthApiError> {
    let valid = state
        .users
        .verify_password(&credentials.username, &credentials.password)
        .map_err(|_| AuthApiError::InternalError)?;

    if !valid {
        warn!("❌ Failed login attempt: {}", credentials.username);
        return Err(AuthApiError::InvalidCredentials);
    }

    let token = state
        .tokens
        .issue(&credentials.username)
        .map_err(|_| AuthApiError::InternalError)?;

    info!("✅ Login successful: {}", credentials.username);

    Ok(Json(TokenResponse::bearer(token)))
}

/// Registration endpoint - POST /usuarios/
pub async fn register_user(
    State(state): State<AuthState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<RegisteredUser>, AuthApiError> {
    if credentials.username.trim().is_empty() {
        return Err(AuthApiError::EmptyUsername);
    }
    if credentials.password.is_empty() {
        return Err(AuthApiError::EmptyPassword);
    }

    let created = state
        .users
        .create(&credentials.username, &credentials.password)
        .map_err(|e| {
            warn!("Failed to create usuario: {}", e);
            AuthApiError::InternalError
        })?;

    match created {
        Some(usuario) => Ok(Json(RegisteredUser {
            username: usuario.username,
        })),
        None => Err(AuthApiError::UsernameTaken),
    }
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    InvalidCredentials,
    UsernameTaken,
    EmptyUsername,
    EmptyPassword,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Incorrect username or password")
            }
            AuthApiError::UsernameTaken => (StatusCode::BAD_REQUEST, "Username already registered"),
            AuthApiError::EmptyUsername => (StatusCode::BAD_REQUEST, "Username must not be empty"),
            AuthApiError::EmptyPassword => (StatusCode::BAD_REQUEST, "Password must not be empty"),
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}
