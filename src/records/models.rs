//! Proposal document models
//!
//! The human-readable side of an EIP: title, body, category, comments.
//! Lifecycle fields live in the governance registry, not here.

use crate::identity::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// EIP category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EipCategory {
    Core,
    Networking,
    Interface,
    #[serde(rename = "ERC")]
    Erc,
    Meta,
    Informational,
}

impl Default for EipCategory {
    fn default() -> Self {
        EipCategory::Core
    }
}

/// Proposal body as kept in the document store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDocument {
    pub eip_id: u64,
    pub title: String,
    pub description: Option<String>,
    pub category: EipCategory,
    /// EIPs this one depends on
    pub requires: Vec<u64>,
    /// Markdown
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Identity,
}

/// Comment on a proposal. Threads are flat records linked by `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub eip_id: u64,
    pub content: String,
    pub created_by: Identity,
    pub created_at: DateTime<Utc>,
    pub parent_id: Option<Uuid>,
}

impl Comment {
    pub fn new(
        eip_id: u64,
        content: String,
        created_by: Identity,
        parent_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            eip_id,
            content,
            created_by,
            created_at,
            parent_id,
        }
    }
}
