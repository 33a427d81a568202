//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::config::Settings;
use crate::error::AppError;
use crate::governance::{Clock, GovernanceRegistry};
use crate::records::{InMemoryRecordStore, RecordStore};
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Editor, proposal lifecycle and authorship (has internal locking)
    pub registry: GovernanceRegistry,

    /// Proposal documents and comments
    pub records: Arc<dyn RecordStore>,

    /// Time source shared with the registry
    pub clock: Arc<dyn Clock>,

    /// JWT secret key for token verification
    pub jwt_secret: String,

    /// Whether the dev token endpoint is enabled
    pub allow_dev_tokens: bool,
}

impl AppState {
    pub fn new(settings: &Settings, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        Self::with_store(settings, clock, Arc::new(InMemoryRecordStore::new()))
    }

    pub fn with_store(
        settings: &Settings,
        clock: Arc<dyn Clock>,
        records: Arc<dyn RecordStore>,
    ) -> Result<Self, AppError> {
        let registry = GovernanceRegistry::new(settings.editor.clone(), clock.clone())
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            registry,
            records,
            clock,
            jwt_secret: settings.auth.jwt_secret.clone(),
            allow_dev_tokens: settings.auth.allow_dev_tokens,
        })
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
