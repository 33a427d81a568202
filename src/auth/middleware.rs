//! Authentication middleware
//!
//! Extracts and validates bearer tokens from requests.

use crate::auth::{decode_token, Claims, TokenType};
use crate::error::AppError;
use crate::identity::Identity;
use crate::state::SharedState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use tracing::debug;

/// Verify the bearer token and stash its claims in request extensions
pub async fn auth_middleware(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::Unauthenticated("Missing bearer token".to_string()))?;

    let claims = decode_token(bearer.token(), &state.jwt_secret)?;
    if claims.token_type != TokenType::Access {
        return Err(AppError::Unauthenticated("Refresh tokens cannot be used for requests".to_string()));
    }

    debug!("Authenticated request from {}", claims.sub);
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .map(|claims| Caller(claims.sub.clone()))
            .ok_or_else(|| AppError::Unauthenticated("Request is not authenticated".to_string()))
    }
}
