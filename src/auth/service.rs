//! Authentication Service
//! Mission: Own every credential and token-lifecycle decision

use crate::auth::errors::AuthError;
use crate::auth::jwt::JwtCodec;
use crate::auth::models::{NewUser, User, UserUpdate};
use crate::auth::password::PasswordHasher;
use crate::auth::refresh_registry::RefreshRegistry;
use crate::auth::user_store::UserStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Business-logic core. The only component that touches password hashes and
/// decides whether a credential or token presentation is valid.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    codec: Arc<JwtCodec>,
    registry: Arc<RefreshRegistry>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        codec: Arc<JwtCodec>,
        registry: Arc<RefreshRegistry>,
    ) -> Self {
        Self {
            store,
            hasher,
            codec,
            registry,
        }
    }

    /// Create a new account. The caller supplies the initial role set.
    pub fn register(&self, new_user: NewUser) -> Result<User, AuthError> {
        let existing = self.store.find_by_email(&new_user.email).map_err(|e| {
            error!("user lookup failed: {e:#}");
            AuthError::Internal
        })?;
        if existing.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = self.hasher.hash(&new_user.password).map_err(|e| {
            error!("password hashing failed: {e:#}");
            AuthError::Internal
        })?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash,
            name: new_user.name,
            roles: new_user.roles,
            created_at: now,
            updated_at: now,
        };

        self.store.create(&user).map_err(|e| {
            error!("user insert failed: {e:#}");
            AuthError::Internal
        })?;

        info!(user_id = %user.id, "✅ User registered: {}", user.email);
        Ok(user)
    }

    /// Verify credentials and mint a fresh access+refresh pair.
    ///
    /// An unknown email and a wrong password are deliberately
    /// indistinguishable to the caller.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<(String, String), AuthError> {
        let user = self
            .store
            .find_by_email(email)
            .map_err(|e| {
                error!("user lookup failed: {e:#}");
                AuthError::Internal
            })?
            .ok_or(AuthError::InvalidCredentials)?;

        let valid = self
            .hasher
            .verify(&user.password_hash, password)
            .map_err(|e| {
                error!("password verification failed: {e:#}");
                AuthError::Internal
            })?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let access = self.codec.issue_access_token(&user)?;
        let refresh = self.codec.issue_refresh_token(user.id)?;

        info!(user_id = %user.id, "🔓 Authenticated: {}", user.email);
        Ok((access, refresh))
    }

    /// Exchange a refresh token for a new pair, invalidating the presented
    /// one. Each refresh token funds exactly one exchange; a replayed token
    /// is rejected with the same error as a forged one.
    pub fn refresh_tokens(&self, presented: &str) -> Result<(String, String), AuthError> {
        if self.registry.is_consumed(presented) {
            warn!("Refresh attempt with an already-used token");
            return Err(AuthError::InvalidToken);
        }

        let claims = self.codec.validate_refresh_token(presented)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        let user = self
            .store
            .find_by_id(&user_id)
            .map_err(|e| {
                error!("user lookup failed: {e:#}");
                AuthError::Internal
            })?
            .ok_or(AuthError::UserNotFound)?;

        // Single winner among concurrent rotations of the same token; the
        // loser gets the same rejection as a replay.
        if !self.registry.consume(presented, claims.exp) {
            warn!(user_id = %user.id, "Refresh token consumed concurrently");
            return Err(AuthError::InvalidToken);
        }

        // Roles and email come from the current user record, not the old
        // claims, so role edits take effect on the next rotation.
        let access = self.codec.issue_access_token(&user)?;
        let refresh = self.codec.issue_refresh_token(user.id)?;

        info!(user_id = %user.id, "🔄 Refresh token rotated");
        Ok((access, refresh))
    }

    /// Blacklist the presented refresh token. Outstanding access tokens stay
    /// valid until natural expiry; they are stateless and cannot be revoked
    /// here.
    pub fn logout(&self, refresh_token: &str) {
        match self.codec.validate_refresh_token(refresh_token) {
            Ok(claims) => {
                self.registry.mark_consumed(refresh_token, claims.exp);
                info!(user_id = %claims.sub, "👋 Refresh token blacklisted on logout");
            }
            // A token that fails validation can never fund a rotation, so
            // there is nothing to blacklist.
            Err(_) => debug!("Logout presented a token that fails validation"),
        }
    }

    pub fn get_by_id(&self, id: &Uuid) -> Result<User, AuthError> {
        self.store
            .find_by_id(id)
            .map_err(|e| {
                error!("user lookup failed: {e:#}");
                AuthError::Internal
            })?
            .ok_or(AuthError::UserNotFound)
    }

    pub fn get_by_email(&self, email: &str) -> Result<User, AuthError> {
        self.store
            .find_by_email(email)
            .map_err(|e| {
                error!("user lookup failed: {e:#}");
                AuthError::Internal
            })?
            .ok_or(AuthError::UserNotFound)
    }

    /// Apply a partial update. The password is re-hashed only when a new one
    /// is supplied; otherwise the stored hash is kept.
    pub fn update(&self, id: &Uuid, changes: UserUpdate) -> Result<User, AuthError> {
        let mut user = self.get_by_id(id)?;

        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(roles) = changes.roles {
            if roles.is_empty() {
                return Err(AuthError::BadRequest("Role list cannot be empty"));
            }
            user.roles = roles;
        }
        if let Some(password) = changes.password {
            user.password_hash = self.hasher.hash(&password).map_err(|e| {
                error!("password hashing failed: {e:#}");
                AuthError::Internal
            })?;
        }
        user.updated_at = Utc::now();

        self.store.update(&user).map_err(|e| {
            error!("user update failed: {e:#}");
            AuthError::Internal
        })?;

        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    pub fn delete(&self, id: &Uuid) -> Result<(), AuthError> {
        let deleted = self.store.delete(id).map_err(|e| {
            error!("user delete failed: {e:#}");
            AuthError::Internal
        })?;
        if !deleted {
            return Err(AuthError::UserNotFound);
        }

        info!(user_id = %id, "🗑️ User deleted");
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<User>, AuthError> {
        self.store.list().map_err(|e| {
            error!("user list failed: {e:#}");
            AuthError::Internal
        })
    }
}
