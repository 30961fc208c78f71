//! Authentication API Endpoints
//! Mission: Map HTTP requests onto the authentication service

use crate::auth::errors::AuthError;
use crate::auth::jwt::JwtCodec;
use crate::auth::models::{
    AccessClaims, LoginRequest, MessageResponse, NewUser, RefreshRequest, RegisterRequest,
    TokenPair, UpdateUserRequest, UserResponse, UserUpdate,
};
use crate::auth::service::AuthService;
use axum::{
    extract::{ConnectInfo, Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub service: Arc<AuthService>,
    pub codec: Arc<JwtCodec>,
}

/// Register endpoint - POST /users/register
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthError> {
    if payload.email.is_empty() {
        return Err(AuthError::BadRequest("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(AuthError::BadRequest("Password is required"));
    }

    // Every self-registered account starts with the plain user role; only
    // admins hand out anything else.
    let user = state.service.register(NewUser {
        email: payload.email,
        password: payload.password,
        name: payload.name,
        roles: vec!["user".to_string()],
    })?;

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

/// Login endpoint - POST /users/login
pub async fn login(
    State(state): State<AuthState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let client_ip = format_ip(addr);
    info!(%client_ip, "🔐 Login attempt: {}", payload.email);

    match state.service.authenticate(&payload.email, &payload.password) {
        Ok((token, refresh_token)) => {
            info!(%client_ip, "✅ Login successful: {}", payload.email);
            Ok(Json(TokenPair {
                token,
                refresh_token,
            }))
        }
        Err(e) => {
            warn!(%client_ip, "❌ Failed login attempt: {}", payload.email);
            Err(e)
        }
    }
}

/// Refresh endpoint - POST /users/refresh
pub async fn refresh(
    State(state): State<AuthState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    if payload.refresh_token.is_empty() {
        return Err(AuthError::BadRequest("Refresh token not provided"));
    }

    let (token, refresh_token) = state.service.refresh_tokens(&payload.refresh_token)?;
    Ok(Json(TokenPair {
        token,
        refresh_token,
    }))
}

/// Logout endpoint - POST /users/logout (authenticated)
pub async fn logout(
    State(state): State<AuthState>,
    Extension(claims): Extension<AccessClaims>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    if payload.refresh_token.is_empty() {
        return Err(AuthError::BadRequest("Refresh token not provided"));
    }

    state.service.logout(&payload.refresh_token);
    info!(user_id = %claims.sub, "Logout completed");

    Ok(Json(MessageResponse {
        message: "Logout successful",
    }))
}

/// List all users - GET /admin/users (admin only)
pub async fn list_users(
    State(state): State<AuthState>,
) -> Result<Json<Vec<UserResponse>>, AuthError> {
    let users = state.service.list()?;
    Ok(Json(users.iter().map(UserResponse::from_user).collect()))
}

/// Get one user - GET /admin/users/:id (admin only)
pub async fn get_user(
    State(state): State<AuthState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AuthError> {
    let id = parse_user_id(&id)?;
    let user = state.service.get_by_id(&id)?;
    Ok(Json(UserResponse::from_user(&user)))
}

/// Update a user - PUT /admin/users/:id (admin only)
pub async fn update_user(
    State(state): State<AuthState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    let id = parse_user_id(&id)?;

    let user = state.service.update(
        &id,
        UserUpdate {
            email: payload.email,
            name: payload.name,
            roles: payload.roles,
            password: None,
        },
    )?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Delete a user - DELETE /admin/users/:id (admin only)
pub async fn delete_user(
    State(state): State<AuthState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AuthError> {
    let id = parse_user_id(&id)?;
    state.service.delete(&id)?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}

fn parse_user_id(raw: &str) -> Result<Uuid, AuthError> {
    Uuid::parse_str(raw).map_err(|_| AuthError::BadRequest("Invalid user id"))
}

fn format_ip(addr: Option<ConnectInfo<SocketAddr>>) -> String {
    addr.map(|ConnectInfo(a)| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
