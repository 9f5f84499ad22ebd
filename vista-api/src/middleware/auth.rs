use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vista_core::{Principal, Role};

use crate::error::AppError;
use crate::state::AppState;

/// Session token claims. Tokens are issued by the identity service; this API only validates them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

impl SessionClaims {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.sub,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

fn authenticate(state: &AppState, req: &Request) -> Result<SessionClaims, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Please sign in to continue".into()))?;

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected session token");
        AppError::Unauthorized("Your session is invalid or has expired".into())
    })
}

pub async fn explorer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &req)?;
    if claims.role != Role::Explorer {
        return Err(AppError::Forbidden("Only explorers can make bookings".into()));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub async fn vendor_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &req)?;
    if !matches!(claims.role, Role::Vendor | Role::Admin) {
        return Err(AppError::Forbidden("Vendor access required".into()));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
