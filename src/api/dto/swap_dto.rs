//! Swap request DTOs and dashboard response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{PaginationMeta, SlotDto};
use crate::domain::{ProposalId, SlotId, SwapProposal, SwapStatus, UserId};
use crate::persistence::ProposalRole;
use crate::service::{Dashboard, Page};

/// Request body for `POST /api/v1/swap-requests`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProposeSwapRequest {
    /// Slot the caller offers.
    pub my_slot_id: SlotId,
    /// Slot the caller wants in return.
    pub their_slot_id: SlotId,
}

/// Request body for `POST /api/v1/swap-requests/{id}/response`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondSwapRequest {
    /// `true` accepts the swap, `false` rejects it.
    pub accept: bool,
}

/// Query parameters for `GET /api/v1/swap-requests`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProposalListQuery {
    /// `incoming`, `outgoing`, or `any` (default).
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub role: ProposalRole,
    /// Only proposals with this status.
    #[param(value_type = Option<String>)]
    pub status: Option<SwapStatus>,
    /// Page number (1-indexed). Defaults to 1.
    pub page: Option<u32>,
    /// Items per page (max 100). Defaults to 20.
    pub per_page: Option<u32>,
}

/// A swap request as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequestDto {
    /// Swap request UUID.
    pub id: ProposalId,
    /// Slot offered by the requester.
    pub my_slot_id: SlotId,
    /// Slot requested from the receiver.
    pub their_slot_id: SlotId,
    /// User who made the request.
    pub requester_id: UserId,
    /// User the request is addressed to.
    pub receiver_id: UserId,
    /// `PENDING`, `ACCEPTED`, or `REJECTED`.
    pub status: SwapStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<SwapProposal> for SwapRequestDto {
    fn from(p: SwapProposal) -> Self {
        Self {
            id: p.id(),
            my_slot_id: p.my_slot_id(),
            their_slot_id: p.their_slot_id(),
            requester_id: p.requester_id(),
            receiver_id: p.receiver_id(),
            status: p.status(),
            created_at: p.created_at(),
            updated_at: p.updated_at(),
        }
    }
}

/// Response body for `GET /api/v1/swap-requests`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SwapRequestListResponse {
    /// Swap requests on this page, newest first.
    pub data: Vec<SwapRequestDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

impl From<Page<SwapProposal>> for SwapRequestListResponse {
    fn from(page: Page<SwapProposal>) -> Self {
        let pagination = PaginationMeta::from(&page);
        Self {
            data: page.map(SwapRequestDto::from).items,
            pagination,
        }
    }
}

/// Response body for `GET /api/v1/dashboard`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    /// The caller's user id.
    pub user_id: UserId,
    /// Slots the caller owns.
    pub slots: Vec<SlotDto>,
    /// Pending swap requests waiting for the caller's answer.
    pub incoming_pending: usize,
    /// Pending swap requests the caller has sent.
    pub outgoing_pending: usize,
}

impl From<Dashboard> for DashboardResponse {
    fn from(d: Dashboard) -> Self {
        Self {
            user_id: d.user_id,
            slots: d.slots.into_iter().map(SlotDto::from).collect(),
            incoming_pending: d.incoming_pending,
            outgoing_pending: d.outgoing_pending,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn propose_request_reads_camel_case() {
        let (mine, theirs) = (SlotId::new(), SlotId::new());
        let body = format!(r#"{{"mySlotId":"{mine}","theirSlotId":"{theirs}"}}"#);
        let Ok(req) = serde_json::from_str::<ProposeSwapRequest>(&body) else {
            panic!("body should parse");
        };
        assert_eq!((req.my_slot_id, req.their_slot_id), (mine, theirs));
    }

    #[test]
    fn list_query_defaults_to_any_role() {
        let Ok(query) = serde_json::from_str::<ProposalListQuery>("{}") else {
            panic!("empty query should parse");
        };
        assert_eq!(query.role, ProposalRole::Any);
        assert!(query.status.is_none());
    }
}
