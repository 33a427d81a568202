//! Document storage
//!
//! `RecordStore` is the seam to whatever replicated document store holds
//! proposal bodies. The in-memory implementation backs the service and tests.

use crate::error::AppError;
use crate::records::{Comment, ProposalDocument};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'a>>;

/// Keyed by EIP id
pub trait RecordStore: Send + Sync {
    fn get_document(&self, eip_id: u64) -> StoreFuture<'_, Option<ProposalDocument>>;

    fn put_document(&self, document: ProposalDocument) -> StoreFuture<'_, ProposalDocument>;

    fn list_comments(&self, eip_id: u64) -> StoreFuture<'_, Vec<Comment>>;

    fn add_comment(&self, comment: Comment) -> StoreFuture<'_, Comment>;
}

/// Thread-safe in-memory store
pub struct InMemoryRecordStore {
    documents: RwLock<HashMap<u64, ProposalDocument>>,
    comments: RwLock<HashMap<u64, Vec<Comment>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            comments: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get_document(&self, eip_id: u64) -> StoreFuture<'_, Option<ProposalDocument>> {
        Box::pin(async move {
            let documents = self.documents.read().await;
            Ok(documents.get(&eip_id).cloned())
        })
    }

    fn put_document(&self, document: ProposalDocument) -> StoreFuture<'_, ProposalDocument> {
        Box::pin(async move {
            let mut documents = self.documents.write().await;
            // Keep the original creation time across edits
            let document = match documents.get(&document.eip_id) {
                Some(existing) => ProposalDocument {
                    created_at: existing.created_at,
                    ..document
                },
                None => document,
            };
            documents.insert(document.eip_id, document.clone());
            Ok(document)
        })
    }

    fn list_comments(&self, eip_id: u64) -> StoreFuture<'_, Vec<Comment>> {
        Box::pin(async move {
            let comments = self.comments.read().await;
            Ok(comments.get(&eip_id).cloned().unwrap_or_default())
        })
    }

    fn add_comment(&self, comment: Comment) -> StoreFuture<'_, Comment> {
        Box::pin(async move {
            let mut comments = self.comments.write().await;
            let thread = comments.entry(comment.eip_id).or_default();

            if let Some(parent) = comment.parent_id {
                if !thread.iter().any(|c| c.id == parent) {
                    return Err(AppError::NotFound(format!(
                        "Parent comment {} not found on EIP-{}",
                        parent, comment.eip_id
                    )));
                }
            }

            thread.push(comment.clone());
            Ok(comment)
        })
    }
}

/// Look up a comment by id within one proposal's thread
pub async fn find_comment(
    store: &dyn RecordStore,
    eip_id: u64,
    id: Uuid,
) -> Result<Option<Comment>, AppError> {
    Ok(store.list_comments(eip_id).await?.into_iter().find(|c| c.id == id))
}
