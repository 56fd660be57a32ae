//! Swap request handlers: propose, respond, list, inspect, dashboard.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    DashboardResponse, ProposalListQuery, ProposeSwapRequest, RespondSwapRequest,
    SwapRequestDto, SwapRequestListResponse,
};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::{ProposalId, SwapDecision};
use crate::error::{ErrorResponse, SwapError};
use crate::service::PageRequest;

/// `POST /swap-requests`: Offer one of the caller's slots for another.
///
/// # Errors
///
/// Returns [`SwapError`] if the slots are identical, missing, not owned as
/// required, or not both swappable.
#[utoipa::path(
    post,
    path = "/api/v1/swap-requests",
    tag = "Swaps",
    summary = "Propose a swap",
    description = "Creates a PENDING swap request and locks both slots in SWAP_PENDING until the receiver answers.",
    request_body = ProposeSwapRequest,
    responses(
        (status = 201, description = "Swap request created", body = SwapRequestDto),
        (status = 400, description = "Both ids name the same slot", body = ErrorResponse),
        (status = 403, description = "Offered slot is not the caller's", body = ErrorResponse),
        (status = 404, description = "Slot not found", body = ErrorResponse),
        (status = 409, description = "A slot is not swappable", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn propose_swap(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ProposeSwapRequest>,
) -> Result<impl IntoResponse, SwapError> {
    let proposal = state
        .swap_service
        .propose(user.id(), req.my_slot_id, req.their_slot_id)
        .await?;
    Ok((StatusCode::CREATED, Json(SwapRequestDto::from(proposal))))
}

/// `POST /swap-requests/{id}/response`: Accept or reject a swap request.
///
/// # Errors
///
/// Returns [`SwapError`] if the request is missing, addressed to someone
/// else, already resolved, or its slots changed underneath it.
#[utoipa::path(
    post,
    path = "/api/v1/swap-requests/{id}/response",
    tag = "Swaps",
    summary = "Respond to a swap",
    description = "Accepting exchanges slot ownership and marks both slots BUSY; rejecting returns both to SWAPPABLE.",
    params(
        ("id" = uuid::Uuid, Path, description = "Swap request UUID"),
    ),
    request_body = RespondSwapRequest,
    responses(
        (status = 200, description = "Resolved swap request", body = SwapRequestDto),
        (status = 403, description = "Caller is not the receiver", body = ErrorResponse),
        (status = 404, description = "Swap request not found", body = ErrorResponse),
        (status = 409, description = "Already resolved or slots no longer pending", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn respond_to_swap(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiJson(req): ApiJson<RespondSwapRequest>,
) -> Result<impl IntoResponse, SwapError> {
    let proposal = state
        .swap_service
        .respond(
            user.id(),
            ProposalId::from_uuid(id),
            SwapDecision::from(req.accept),
        )
        .await?;
    Ok(Json(SwapRequestDto::from(proposal)))
}

/// `GET /swap-requests`: List swap requests the caller takes part in.
///
/// # Errors
///
/// Returns [`SwapError`] if the store is unavailable.
#[utoipa::path(
    get,
    path = "/api/v1/swap-requests",
    tag = "Swaps",
    summary = "List my swap requests",
    description = "Returns the caller's incoming and/or outgoing swap requests, newest first.",
    params(ProposalListQuery),
    responses(
        (status = 200, description = "Paginated swap requests", body = SwapRequestListResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_swap_requests(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ProposalListQuery>,
) -> Result<impl IntoResponse, SwapError> {
    let defaults = PageRequest::default();
    let page = PageRequest::new(
        query.page.unwrap_or(defaults.page),
        query.per_page.unwrap_or(defaults.per_page),
    );
    let proposals = state
        .query_service
        .my_proposals(user.id(), query.role, query.status, page)
        .await?;
    Ok(Json(SwapRequestListResponse::from(proposals)))
}

/// `GET /swap-requests/{id}`: Inspect one swap request.
///
/// # Errors
///
/// Returns [`SwapError`] if the request is missing or the caller is not a
/// party to it.
#[utoipa::path(
    get,
    path = "/api/v1/swap-requests/{id}",
    tag = "Swaps",
    summary = "Get a swap request",
    params(
        ("id" = uuid::Uuid, Path, description = "Swap request UUID"),
    ),
    responses(
        (status = 200, description = "Swap request", body = SwapRequestDto),
        (status = 403, description = "Caller is not a party", body = ErrorResponse),
        (status = 404, description = "Swap request not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_swap_request(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, SwapError> {
    let proposal = state
        .query_service
        .get_proposal(user.id(), ProposalId::from_uuid(id))
        .await?;
    Ok(Json(SwapRequestDto::from(proposal)))
}

/// `GET /dashboard`: The caller's slots and pending request counts.
///
/// # Errors
///
/// Returns [`SwapError`] if the store is unavailable.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Swaps",
    summary = "Dashboard",
    responses(
        (status = 200, description = "Dashboard", body = DashboardResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, SwapError> {
    let dashboard = state.query_service.dashboard(user.id()).await?;
    Ok(Json(DashboardResponse::from(dashboard)))
}

/// Swap routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/swap-requests", get(list_swap_requests).post(propose_swap))
        .route("/swap-requests/{id}", get(get_swap_request))
        .route("/swap-requests/{id}/response", post(respond_to_swap))
        .route("/dashboard", get(dashboard))
}
