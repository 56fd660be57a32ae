//! Slot handlers: create, list own, change status, delete, browse swappable.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};

use crate::api::dto::{
    CreateSlotRequest, PaginationParams, SlotDto, SlotListResponse, UpdateSlotStatusRequest,
};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::{NewSlot, SlotId, SlotStatus};
use crate::error::{ErrorResponse, SwapError};

/// `POST /slots`: Create a slot owned by the caller.
///
/// # Errors
///
/// Returns [`SwapError`] on invalid input or an initial `SWAP_PENDING` status.
#[utoipa::path(
    post,
    path = "/api/v1/slots",
    tag = "Slots",
    summary = "Create a slot",
    description = "Creates a slot owned by the caller. `status` defaults to `BUSY`; `SWAP_PENDING` is reserved for open swap requests.",
    request_body = CreateSlotRequest,
    responses(
        (status = 201, description = "Slot created", body = SlotDto),
        (status = 400, description = "Invalid title, time range, or status", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 409, description = "Initial status not allowed", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_slot(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateSlotRequest>,
) -> Result<impl IntoResponse, SwapError> {
    let new = NewSlot::try_from(req)?;
    let slot = state.slot_service.create(user.id(), new).await?;
    Ok((StatusCode::CREATED, Json(SlotDto::from(slot))))
}

/// `GET /slots`: List the caller's slots.
///
/// # Errors
///
/// Returns [`SwapError`] if the store is unavailable.
#[utoipa::path(
    get,
    path = "/api/v1/slots",
    tag = "Slots",
    summary = "List my slots",
    description = "Returns every slot the caller owns, in any status, ordered by start time.",
    responses(
        (status = 200, description = "The caller's slots", body = Vec<SlotDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_my_slots(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, SwapError> {
    let slots = state.query_service.my_slots(user.id()).await?;
    let data: Vec<SlotDto> = slots.into_iter().map(SlotDto::from).collect();
    Ok(Json(data))
}

/// `PATCH /slots/{id}`: Mark one of the caller's slots busy or swappable.
///
/// # Errors
///
/// Returns [`SwapError`] if the slot is missing, not owned by the caller,
/// or locked in a swap.
#[utoipa::path(
    patch,
    path = "/api/v1/slots/{id}",
    tag = "Slots",
    summary = "Change slot status",
    description = "Toggles a slot between `BUSY` and `SWAPPABLE`. Slots in a pending swap cannot be changed.",
    params(
        ("id" = uuid::Uuid, Path, description = "Slot UUID"),
    ),
    request_body = UpdateSlotStatusRequest,
    responses(
        (status = 200, description = "Updated slot", body = SlotDto),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 403, description = "Slot owned by another user", body = ErrorResponse),
        (status = 404, description = "Slot not found", body = ErrorResponse),
        (status = 409, description = "Slot is part of a pending swap", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_slot_status(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiJson(req): ApiJson<UpdateSlotStatusRequest>,
) -> Result<impl IntoResponse, SwapError> {
    let status: SlotStatus = req.status.parse()?;
    let slot = state
        .slot_service
        .update_status(user.id(), SlotId::from_uuid(id), status)
        .await?;
    Ok(Json(SlotDto::from(slot)))
}

/// `DELETE /slots/{id}`: Delete one of the caller's slots.
///
/// # Errors
///
/// Returns [`SwapError`] if the slot is missing, not owned by the caller,
/// or locked in a swap.
#[utoipa::path(
    delete,
    path = "/api/v1/slots/{id}",
    tag = "Slots",
    summary = "Delete a slot",
    description = "Deletes a slot and returns it. Slots in a pending swap cannot be deleted.",
    params(
        ("id" = uuid::Uuid, Path, description = "Slot UUID"),
    ),
    responses(
        (status = 200, description = "Deleted slot", body = SlotDto),
        (status = 403, description = "Slot owned by another user", body = ErrorResponse),
        (status = 404, description = "Slot not found", body = ErrorResponse),
        (status = 409, description = "Slot is part of a pending swap", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn delete_slot(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, SwapError> {
    let slot = state
        .slot_service
        .delete(user.id(), SlotId::from_uuid(id))
        .await?;
    Ok(Json(SlotDto::from(slot)))
}

/// `GET /swappable-slots`: Browse other users' swappable slots.
///
/// # Errors
///
/// Returns [`SwapError`] if the store is unavailable.
#[utoipa::path(
    get,
    path = "/api/v1/swappable-slots",
    tag = "Slots",
    summary = "List swappable slots",
    description = "Returns a paginated list of `SWAPPABLE` slots owned by other users, ordered by start time.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated swappable slots", body = SlotListResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_swappable_slots(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Result<impl IntoResponse, SwapError> {
    let page = state
        .swap_service
        .list_swappable(user.id(), params.into())
        .await?;
    Ok(Json(SlotListResponse::from(page)))
}

/// Slot routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/slots", get(list_my_slots).post(create_slot))
        .route("/slots/{id}", patch(update_slot_status).delete(delete_slot))
        .route("/swappable-slots", get(list_swappable_slots))
}
