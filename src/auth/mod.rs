//! Authentication module
//!
//! Provides JWT-based caller identity. Roles are not carried in the token:
//! whether a caller is the Editor or an author is decided by the registry.

mod jwt;
mod middleware;

pub use jwt::{create_tokens, decode_token, refresh_tokens, Claims, TokenPair, TokenType};
pub use middleware::{auth_middleware, Caller};
