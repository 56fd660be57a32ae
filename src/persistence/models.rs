//! Database rows for slots and swap requests.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{ProposalId, Slot, SlotId, SlotStatus, SwapProposal, SwapStatus, UserId};
use crate::error::SwapError;

/// Column list shared by every slot query.
pub const SLOT_COLUMNS: &str =
    "id, title, start_time, end_time, status, owner_id, created_at, updated_at";

/// Column list shared by every swap request query.
pub const PROPOSAL_COLUMNS: &str =
    "id, my_slot_id, their_slot_id, requester_id, receiver_id, status, created_at, updated_at";

/// A row from the `slots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SlotRow {
    /// Primary key.
    pub id: Uuid,
    /// Slot title.
    pub title: String,
    /// Start timestamp.
    pub start_time: DateTime<Utc>,
    /// End timestamp.
    pub end_time: DateTime<Utc>,
    /// Status wire name (e.g. `"SWAPPABLE"`).
    pub status: String,
    /// Current owner.
    pub owner_id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SlotRow> for Slot {
    type Error = SwapError;

    fn try_from(row: SlotRow) -> Result<Self, Self::Error> {
        let status: SlotStatus = row.status.parse().map_err(|_| {
            SwapError::Persistence(format!("slot {} has unknown status {}", row.id, row.status))
        })?;
        Ok(Slot::restore(
            SlotId::from_uuid(row.id),
            row.title,
            row.start_time,
            row.end_time,
            status,
            UserId::from_uuid(row.owner_id),
            row.created_at,
            row.updated_at,
        ))
    }
}

/// A row from the `swap_requests` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProposalRow {
    /// Primary key.
    pub id: Uuid,
    /// Slot offered by the requester.
    pub my_slot_id: Uuid,
    /// Slot requested from the receiver.
    pub their_slot_id: Uuid,
    /// Requesting user.
    pub requester_id: Uuid,
    /// Receiving user.
    pub receiver_id: Uuid,
    /// Status wire name (e.g. `"PENDING"`).
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProposalRow> for SwapProposal {
    type Error = SwapError;

    fn try_from(row: ProposalRow) -> Result<Self, Self::Error> {
        let status: SwapStatus = row.status.parse().map_err(|_| {
            SwapError::Persistence(format!(
                "swap request {} has unknown status {}",
                row.id, row.status
            ))
        })?;
        Ok(SwapProposal::restore(
            ProposalId::from_uuid(row.id),
            SlotId::from_uuid(row.my_slot_id),
            SlotId::from_uuid(row.their_slot_id),
            UserId::from_uuid(row.requester_id),
            UserId::from_uuid(row.receiver_id),
            status,
            row.created_at,
            row.updated_at,
        ))
    }
}
