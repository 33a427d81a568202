//! Governance failure taxonomy
//!
//! Every rejected registry operation surfaces a kind plus a reason string.
//! Reason strings are part of the public API and are matched verbatim by
//! clients, so they live here as constants.

use crate::governance::EipStatus;
use serde::Serialize;
use thiserror::Error;

pub const ONLY_EDITOR_UPDATES_EDITOR: &str = "only the current Editor can update the editor";
pub const NULL_EDITOR: &str = "new editor cannot be the null identity";
pub const ONLY_EDITOR_REGISTERS: &str = "only the Editor can register proposals";
pub const DUPLICATE_PROPOSAL: &str = "proposal with this id already exists";
pub const EMPTY_AUTHORS: &str = "at least one author must be specified";
pub const ZERO_PROPOSAL_ID: &str = "proposal id must be positive";
pub const NULL_AUTHOR: &str = "author cannot be the null identity";
pub const PROPOSAL_NOT_FOUND: &str = "proposal does not exist";
pub const NO_STANDING: &str = "caller is neither the Editor nor an author";
pub const ONLY_EDITOR_FROM_LAST_CALL: &str = "only Editor can transition from LastCall";
pub const ONLY_EDITOR_TO_LAST_CALL: &str = "only Editor can move Review→LastCall";
pub const ONLY_AUTHOR_REVIVES: &str = "only an author can move Withdrawn→Draft";
pub const NOT_INACTIVE: &str = "must be inactive 6 months";
pub const TERMINAL: &str = "cannot transition from Final or Living";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Caller lacks the role the operation or edge requires
    Unauthorized,
    NotFound,
    AlreadyExists,
    InvalidArgument,
    /// Role is fine but a time gate is not yet satisfied
    PreconditionFailed,
    InvalidTransition,
    TerminalState,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::PreconditionFailed => "PRECONDITION_FAILED",
            ErrorKind::InvalidTransition => "INVALID_TRANSITION",
            ErrorKind::TerminalState => "TERMINAL_STATE",
        }
    }
}

/// A rejected registry operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct GovernanceError {
    pub kind: ErrorKind,
    pub reason: String,
}

impl GovernanceError {
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, reason)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound, PROPOSAL_NOT_FOUND)
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, reason)
    }

    pub fn invalid_transition(from: EipStatus) -> Self {
        Self::new(
            ErrorKind::InvalidTransition,
            format!("invalid status transition from {}", from.name()),
        )
    }

    pub fn terminal() -> Self {
        Self::new(ErrorKind::TerminalState, TERMINAL)
    }
}

pub type GovernanceResult<T> = Result<T, GovernanceError>;
