//! Slot request and response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PaginationMeta;
use crate::domain::{NewSlot, Slot, SlotId, SlotStatus, UserId};
use crate::error::SwapError;
use crate::service::Page;

/// Request body for `POST /api/v1/slots`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    /// Human-readable title (at most 300 characters).
    pub title: String,
    /// Start of the slot (RFC 3339).
    pub start_time: DateTime<Utc>,
    /// End of the slot (RFC 3339); must be after `startTime`.
    pub end_time: DateTime<Utc>,
    /// `BUSY` (default) or `SWAPPABLE`.
    #[serde(default)]
    pub status: Option<String>,
}

impl TryFrom<CreateSlotRequest> for NewSlot {
    type Error = SwapError;

    fn try_from(req: CreateSlotRequest) -> Result<Self, Self::Error> {
        Ok(NewSlot {
            title: req.title,
            start_time: req.start_time,
            end_time: req.end_time,
            status: req
                .status
                .as_deref()
                .map(str::parse::<SlotStatus>)
                .transpose()?,
        })
    }
}

/// Request body for `PATCH /api/v1/slots/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSlotStatusRequest {
    /// `BUSY` or `SWAPPABLE`.
    pub status: String,
}

/// A slot as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotDto {
    /// Slot UUID.
    pub id: SlotId,
    /// Title.
    pub title: String,
    /// Start of the slot.
    pub start_time: DateTime<Utc>,
    /// End of the slot.
    pub end_time: DateTime<Utc>,
    /// Trading status.
    pub status: SlotStatus,
    /// Current owner.
    pub owner_id: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Slot> for SlotDto {
    fn from(slot: Slot) -> Self {
        Self {
            id: slot.id(),
            start_time: slot.start_time(),
            end_time: slot.end_time(),
            status: slot.status(),
            owner_id: slot.owner_id(),
            created_at: slot.created_at(),
            updated_at: slot.updated_at(),
            title: slot.title().to_string(),
        }
    }
}

/// Response body for slot list endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct SlotListResponse {
    /// Slots on this page.
    pub data: Vec<SlotDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

impl From<Page<Slot>> for SlotListResponse {
    fn from(page: Page<Slot>) -> Self {
        let pagination = PaginationMeta::from(&page);
        Self {
            data: page.map(SlotDto::from).items,
            pagination,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn create_request_reads_camel_case() {
        let body = r#"{
            "title": "Gym",
            "startTime": "2026-03-01T09:00:00Z",
            "endTime": "2026-03-01T10:00:00Z",
            "status": "SWAPPABLE"
        }"#;
        let Ok(req) = serde_json::from_str::<CreateSlotRequest>(body) else {
            panic!("body should parse");
        };
        let Ok(new) = NewSlot::try_from(req) else {
            panic!("status should parse");
        };
        assert_eq!(new.status, Some(SlotStatus::Swappable));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let req = CreateSlotRequest {
            title: "Gym".into(),
            start_time: Utc::now(),
            end_time: Utc::now(),
            status: Some("FREE".into()),
        };
        assert!(matches!(
            NewSlot::try_from(req),
            Err(SwapError::InvalidSlotStatus(_))
        ));
    }
}
