//! Authentication route handlers
//!
//! Token issuance and refresh. Proof of address ownership happens upstream;
//! the issue endpoint only exists for local development.

use crate::auth::{create_tokens, refresh_tokens, TokenPair};
use crate::error::AppError;
use crate::identity::Identity;
use crate::state::SharedState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    pub address: Identity,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub tokens: TokenPair,
}

/// POST /api/auth/token
///
/// Mint tokens for an address. Disabled unless ALLOW_DEV_TOKENS is set.
pub async fn issue_token(
    State(state): State<SharedState>,
    Json(req): Json<IssueTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    if !state.allow_dev_tokens {
        warn!("Dev token requested for {} while disabled", req.address);
        return Err(AppError::NotFound("Token issuance is disabled".to_string()));
    }

    let tokens = create_tokens(&req.address, &state.jwt_secret)?;
    info!("Issued dev token for {}", req.address);

    Ok(Json(TokenResponse {
        success: true,
        tokens,
    }))
}

/// POST /api/auth/refresh
///
/// Refresh access token using refresh token.
pub async fn refresh(
    State(state): State<SharedState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let tokens = refresh_tokens(&req.refresh_token, &state.jwt_secret)?;

    Ok(Json(TokenResponse {
        success: true,
        tokens,
    }))
}
