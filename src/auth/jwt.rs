//! JWT token management
//!
//! Tokens carry the caller's account address in `sub`. How that address was
//! proven (wallet signature, SIWE, ...) is up to whoever mints the token.

use crate::error::AppError;
use crate::identity::Identity;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Access token expiration (15 minutes)
const ACCESS_TOKEN_EXPIRATION_MINUTES: i64 = 15;

/// Refresh token expiration (7 days)
const REFRESH_TOKEN_EXPIRATION_DAYS: i64 = 7;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account address)
    pub sub: Identity,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Token pair response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

fn sign(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign {:?} token: {}", claims.token_type, e)))
}

/// Create access and refresh tokens for an account
pub fn create_tokens(identity: &Identity, secret: &str) -> Result<TokenPair, AppError> {
    let now = Utc::now();

    let access_claims = Claims {
        sub: identity.clone(),
        exp: (now + Duration::minutes(ACCESS_TOKEN_EXPIRATION_MINUTES)).timestamp(),
        iat: now.timestamp(),
        token_type: TokenType::Access,
    };

    let refresh_claims = Claims {
        sub: identity.clone(),
        exp: (now + Duration::days(REFRESH_TOKEN_EXPIRATION_DAYS)).timestamp(),
        iat: now.timestamp(),
        token_type: TokenType::Refresh,
    };

    Ok(TokenPair {
        access_token: sign(&access_claims, secret)?,
        refresh_token: sign(&refresh_claims, secret)?,
        token_type: "Bearer".to_string(),
        expires_in: ACCESS_TOKEN_EXPIRATION_MINUTES * 60,
    })
}

/// Decode and validate a JWT token
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthenticated("Token expired".to_string())
        }
        jsonwebtoken::errors::ErrorKind::InvalidToken => {
            AppError::Unauthenticated("Invalid token".to_string())
        }
        _ => AppError::Unauthenticated(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Refresh tokens using a valid refresh token
pub fn refresh_tokens(refresh_token: &str, secret: &str) -> Result<TokenPair, AppError> {
    let claims = decode_token(refresh_token, secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthenticated("Invalid token type for refresh".to_string()));
    }

    create_tokens(&claims.sub, secret)
}
