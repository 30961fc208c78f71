//! Authentication Middleware
//! Mission: Gate requests on a valid access token and role membership

use crate::auth::api::AuthState;
use crate::auth::errors::AuthError;
use crate::auth::models::AccessClaims;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use tracing::{info, warn};

/// First gate: validates the bearer token and attaches the caller's identity
/// to the request. A missing header and a rejected token are both 401; a
/// header that is not exactly `Bearer <token>` is 400.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let client_ip = client_ip(&req);
    let path = req.uri().path().to_string();

    let Some(header) = req.headers().get(AUTHORIZATION) else {
        warn!(%client_ip, %path, "Request without authentication token");
        return Err(AuthError::MissingToken);
    };

    let header = header.to_str().unwrap_or_default();
    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" {
        warn!(%client_ip, %path, "Malformed authorization header");
        return Err(AuthError::BadRequest("Invalid authorization format"));
    }

    let claims = match state.codec.validate_access_token(parts[1]) {
        Ok(claims) => claims,
        Err(_) => {
            warn!(%client_ip, %path, "Rejected access token");
            return Err(AuthError::InvalidToken);
        }
    };

    info!(
        %client_ip,
        %path,
        user_id = %claims.sub,
        email = %claims.email,
        "Authentication successful"
    );

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Second gate: requires exact membership of `role` in the authenticated
/// identity's role set. Composed after [`authenticate`]; if that gate never
/// ran there are no claims and the request is refused outright.
pub async fn require_role(
    role: &'static str,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let client_ip = client_ip(&req);
    let path = req.uri().path().to_string();

    let Some(claims) = req.extensions().get::<AccessClaims>() else {
        warn!(%client_ip, %path, role, "Role check without authenticated identity");
        return Err(AuthError::Forbidden);
    };

    if !claims.roles.iter().any(|r| r == role) {
        warn!(
            %client_ip,
            %path,
            user_id = %claims.sub,
            role,
            "Access denied: missing role"
        );
        return Err(AuthError::Forbidden);
    }

    info!(%client_ip, %path, user_id = %claims.sub, role, "Role authorized");
    Ok(next.run(req).await)
}

fn client_ip(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
