//! Record routes
//!
//! Proposal documents and comments. Writes are only accepted for
//! proposals the registry knows about.

use crate::auth::Caller;
use crate::error::{validation_error, AppError};
use crate::governance::error::NO_STANDING;
use crate::governance::GovernanceError;
use crate::models::SuccessResponse;
use crate::records::{find_comment, Comment, EipCategory, ProposalDocument};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PutDocumentRequest {
    #[validate(length(min = 1, max = 256, message = "Title must be between 1 and 256 characters"))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub category: EipCategory,
    #[serde(default)]
    pub requires: Vec<u64>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    #[validate(length(min = 1, max = 10000, message = "Comment must be between 1 and 10000 characters"))]
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub document: ProposalDocument,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub comment: Comment,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<Comment>,
}

/// GET /api/proposals/{id}/document
pub async fn get_document(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<SuccessResponse<DocumentResponse>>, AppError> {
    let document = state
        .records
        .get_document(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No document stored for EIP-{}", id)))?;

    Ok(Json(SuccessResponse::with_data("Document retrieved", DocumentResponse { document })))
}

/// PUT /api/proposals/{id}/document
///
/// Authors and the Editor may write the document.
pub async fn put_document(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<PutDocumentRequest>,
) -> Result<Json<SuccessResponse<DocumentResponse>>, AppError> {
    if !state.registry.has_standing(&caller, id).await? {
        return Err(GovernanceError::unauthorized(NO_STANDING).into());
    }
    req.validate().map_err(|e| validation_error(e.to_string()))?;
    if req.requires.contains(&id) {
        return Err(validation_error(format!("EIP-{} cannot require itself", id)));
    }

    let now = state.clock.now();
    let document = state
        .records
        .put_document(ProposalDocument {
            eip_id: id,
            title: req.title,
            description: req.description,
            category: req.category,
            requires: req.requires,
            content: req.content,
            created_at: now,
            updated_at: now,
            updated_by: caller,
        })
        .await?;

    info!("Stored document for EIP-{} ('{}')", id, document.title);
    Ok(Json(SuccessResponse::with_data("Document saved", DocumentResponse { document })))
}

/// GET /api/proposals/{id}/comments
pub async fn list_comments(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<SuccessResponse<CommentListResponse>>, AppError> {
    ensure_registered(&state, id).await?;
    let comments = state.records.list_comments(id).await?;

    Ok(Json(SuccessResponse::with_data(
        format!("Found {} comments", comments.len()),
        CommentListResponse { comments },
    )))
}

/// GET /api/proposals/{id}/comments/{comment_id}
pub async fn get_comment(
    State(state): State<SharedState>,
    Path((id, comment_id)): Path<(u64, Uuid)>,
) -> Result<Json<SuccessResponse<CommentResponse>>, AppError> {
    let comment = find_comment(state.records.as_ref(), id, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;

    Ok(Json(SuccessResponse::with_data("Comment retrieved", CommentResponse { comment })))
}

/// POST /api/proposals/{id}/comments
///
/// Any authenticated account may comment on a registered proposal.
pub async fn add_comment(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<CommentResponse>>), AppError> {
    ensure_registered(&state, id).await?;
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let comment = state
        .records
        .add_comment(Comment::new(id, req.content, caller, req.parent_id, state.clock.now()))
        .await?;

    info!("Comment {} added to EIP-{} by {}", comment.id, id, comment.created_by);
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Comment added", CommentResponse { comment })),
    ))
}

async fn ensure_registered(state: &SharedState, id: u64) -> Result<(), AppError> {
    state.registry.proposal(id).await?;
    Ok(())
}
