//! Authentication Models
//! Mission: Define user, claim, and wire-format data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub name: String,
    /// Role labels, checked by exact string membership. Never empty.
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Access-token claims payload.
///
/// Roles and email are a snapshot taken at issuance; they are not re-checked
/// against the store on every request, so role edits only take effect once a
/// new token is issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: String,
    pub email: String,
    pub roles: Vec<String>,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub sub: String, // always equals user_id
    pub jti: String,
}

/// Refresh-token claims payload. Carries no roles or email: a rotation must
/// re-derive those from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub exp: i64,
    pub jti: String,
}

/// Registration input for the service layer. The transport layer decides the
/// initial role set.
#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub roles: Vec<String>,
}

/// Partial update applied to an existing user. `None` fields are untouched.
#[derive(Debug, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub roles: Option<Vec<String>>,
    pub password: Option<String>,
}

/// Registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body carrying a refresh token (refresh and logout endpoints)
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Admin update request body
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub roles: Option<Vec<String>>,
}

/// Token pair returned by login and refresh
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// User response (sanitized)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            roles: user.roles.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Plain confirmation message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
