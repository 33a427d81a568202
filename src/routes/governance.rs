//! Governance routes
//!
//! HTTP surface of the registry: editor management, registration,
//! status transitions and the event journal.

use crate::auth::Caller;
use crate::error::AppError;
use crate::governance::{EipStatus, JournalEntry, ProposalRecord, ProposalView};
use crate::identity::Identity;
use crate::models::{MessageResponse, SuccessResponse};
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

const DEFAULT_EVENT_PAGE: usize = 100;
const MAX_EVENT_PAGE: usize = 1000;

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEditorRequest {
    pub new_editor: Identity,
}

#[derive(Debug, Deserialize)]
pub struct RegisterProposalRequest {
    pub id: u64,
    pub authors: Vec<Identity>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: EipStatus,
}

#[derive(Debug, Deserialize)]
pub struct ProposalListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    pub since: Option<u64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EditorResponse {
    pub editor: Identity,
}

#[derive(Debug, Serialize)]
pub struct ProposalResponse {
    pub proposal: ProposalView,
}

#[derive(Debug, Serialize)]
pub struct ProposalListResponse {
    pub proposals: Vec<ProposalRecord>,
}

#[derive(Debug, Serialize)]
pub struct AuthorsResponse {
    pub authors: Vec<Identity>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsAuthorResponse {
    pub address: Identity,
    pub is_author: bool,
}

#[derive(Debug, Serialize)]
pub struct TransitionsResponse {
    pub current: EipStatus,
    pub allowed: Vec<EipStatus>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<JournalEntry>,
}

// =============================================================================
// EDITOR
// =============================================================================

/// GET /api/editor
pub async fn get_editor(State(state): State<SharedState>) -> Json<SuccessResponse<EditorResponse>> {
    let editor = state.registry.current_editor().await;
    Json(SuccessResponse::with_data("Current editor", EditorResponse { editor }))
}

/// PUT /api/editor
pub async fn update_editor(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Json(req): Json<UpdateEditorRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let new_editor = req.new_editor;
    state.registry.update_editor(&caller, new_editor.clone()).await?;
    Ok(Json(MessageResponse::new(format!("Editor is now {}", new_editor))))
}

// =============================================================================
// PROPOSALS
// =============================================================================

/// POST /api/proposals
pub async fn register_proposal(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Json(req): Json<RegisterProposalRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<ProposalResponse>>), AppError> {
    let proposal = state
        .registry
        .register_proposal(&caller, req.id, req.authors)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Proposal registered", ProposalResponse { proposal })),
    ))
}

/// GET /api/proposals
pub async fn list_proposals(
    State(state): State<SharedState>,
    Query(query): Query<ProposalListQuery>,
) -> Result<Json<SuccessResponse<ProposalListResponse>>, AppError> {
    let status = query
        .status
        .map(|s| s.parse::<EipStatus>())
        .transpose()
        .map_err(AppError::BadRequest)?;

    let proposals = state.registry.list_proposals(status).await;

    Ok(Json(SuccessResponse::with_data(
        format!("Found {} proposals", proposals.len()),
        ProposalListResponse { proposals },
    )))
}

/// GET /api/proposals/{id}
pub async fn get_proposal(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<SuccessResponse<ProposalResponse>>, AppError> {
    let proposal = state.registry.proposal(id).await?;
    Ok(Json(SuccessResponse::with_data("Proposal retrieved", ProposalResponse { proposal })))
}

/// GET /api/proposals/{id}/authors
pub async fn get_authors(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<SuccessResponse<AuthorsResponse>>, AppError> {
    let authors = state.registry.authors(id).await?;
    Ok(Json(SuccessResponse::with_data("Authors retrieved", AuthorsResponse { authors })))
}

/// GET /api/proposals/{id}/authors/{address}
pub async fn is_author(
    State(state): State<SharedState>,
    Path((id, address)): Path<(u64, String)>,
) -> Result<Json<SuccessResponse<IsAuthorResponse>>, AppError> {
    let address = Identity::parse(&address).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let is_author = state.registry.is_author(id, &address).await?;

    Ok(Json(SuccessResponse::with_data(
        if is_author { "Address is an author" } else { "Address is not an author" },
        IsAuthorResponse { address, is_author },
    )))
}

/// POST /api/proposals/{id}/status
pub async fn change_status(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<SuccessResponse<ProposalResponse>>, AppError> {
    let proposal = state.registry.change_status(&caller, id, req.status).await?;

    Ok(Json(SuccessResponse::with_data(
        format!("Status changed to {}", proposal.status),
        ProposalResponse { proposal },
    )))
}

/// GET /api/proposals/{id}/transitions
pub async fn allowed_transitions(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
) -> Result<Json<SuccessResponse<TransitionsResponse>>, AppError> {
    let current = state.registry.proposal(id).await?.status;
    let allowed = state.registry.allowed_transitions(&caller, id).await?;

    Ok(Json(SuccessResponse::with_data(
        format!("{} transition(s) available", allowed.len()),
        TransitionsResponse { current, allowed },
    )))
}

// =============================================================================
// EVENTS
// =============================================================================

/// GET /api/events
pub async fn list_events(
    State(state): State<SharedState>,
    Query(query): Query<EventQuery>,
) -> Json<SuccessResponse<EventsResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_PAGE).min(MAX_EVENT_PAGE);
    let events = state.registry.events(query.since.unwrap_or(0), limit).await;

    Json(SuccessResponse::with_data(
        format!("Found {} events", events.len()),
        EventsResponse { events },
    ))
}
