//! JWT Token Codec
//! Mission: Mint and validate access/refresh token pairs securely

use crate::auth::errors::AuthError;
use crate::auth::models::{AccessClaims, RefreshClaims, User};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, error};
use uuid::Uuid;

/// Codec for both token kinds. Sole owner of the two signing secrets and the
/// two expiry durations (whole hours; 0 means "expires immediately").
pub struct JwtCodec {
    access_secret: String,
    access_ttl_hours: i64,
    refresh_secret: String,
    refresh_ttl_hours: i64,
}

impl JwtCodec {
    pub fn new(
        access_secret: String,
        access_ttl_hours: i64,
        refresh_secret: String,
        refresh_ttl_hours: i64,
    ) -> Self {
        Self {
            access_secret,
            access_ttl_hours,
            refresh_secret,
            refresh_ttl_hours,
        }
    }

    /// Generate an access token carrying the user's identity snapshot.
    pub fn issue_access_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(chrono::Duration::hours(self.access_ttl_hours))
            .ok_or_else(|| {
                error!("access token expiry overflow");
                AuthError::Internal
            })?;

        let claims = AccessClaims {
            user_id: user.id.to_string(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            sub: user.id.to_string(),
            jti: Uuid::new_v4().to_string(),
        };

        debug!(
            user_id = %user.id,
            ttl_hours = self.access_ttl_hours,
            "Issuing access token"
        );

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.access_secret.as_bytes()),
        )
        .map_err(|e| {
            error!("access token signing failed: {e}");
            AuthError::Internal
        })
    }

    /// Validate an access token and extract its claims.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let decoded = decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.access_secret.as_bytes()),
            &strict_validation(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        let claims = decoded.claims;
        if claims.sub != claims.user_id {
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }

    /// Generate a refresh token. Subject and expiry only; rotation re-derives
    /// roles and email from the store.
    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(chrono::Duration::hours(self.refresh_ttl_hours))
            .ok_or_else(|| {
                error!("refresh token expiry overflow");
                AuthError::Internal
            })?;

        let claims = RefreshClaims {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.refresh_secret.as_bytes()),
        )
        .map_err(|e| {
            error!("refresh token signing failed: {e}");
            AuthError::Internal
        })
    }

    /// Validate a refresh token against the refresh secret.
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        let decoded = decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.refresh_secret.as_bytes()),
            &strict_validation(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        Ok(decoded.claims)
    }
}

/// HS256 validation with zero leeway, so a 0-hour TTL genuinely means
/// expired-now rather than expired-within-the-default-grace-window.
fn strict_validation() -> Validation {
    let mut validation = Validation::default();
    validation.leeway = 0;
    validation
}
