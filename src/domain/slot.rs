//! Slot entity: a time-bounded resource owned by exactly one user.
//!
//! The status field is private. Owners change it through
//! [`Slot::change_status_by_owner`], which never reaches or leaves
//! [`SlotStatus::SwapPending`]; those transitions are only reachable through
//! [`super::SwapProposal`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{SlotId, UserId};
use crate::error::SwapError;

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 300;

/// Trading status of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    /// Not offered for trading.
    Busy,
    /// Eligible to be offered in a new swap proposal.
    Swappable,
    /// Locked inside exactly one open swap proposal.
    SwapPending,
}

impl SlotStatus {
    /// Returns the wire representation (e.g. `"SWAP_PENDING"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Busy => "BUSY",
            Self::Swappable => "SWAPPABLE",
            Self::SwapPending => "SWAP_PENDING",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotStatus {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUSY" => Ok(Self::Busy),
            "SWAPPABLE" => Ok(Self::Swappable),
            "SWAP_PENDING" => Ok(Self::SwapPending),
            other => Err(SwapError::InvalidSlotStatus(other.to_string())),
        }
    }
}

/// Owner-supplied attributes of a slot that is about to be created.
#[derive(Debug, Clone)]
pub struct NewSlot {
    /// Human-readable title.
    pub title: String,
    /// Inclusive start of the slot.
    pub start_time: DateTime<Utc>,
    /// Exclusive end of the slot; must be after `start_time`.
    pub end_time: DateTime<Utc>,
    /// Initial status; `None` means [`SlotStatus::Busy`].
    pub status: Option<SlotStatus>,
}

/// A scheduled time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    id: SlotId,
    title: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: SlotStatus,
    owner_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Slot {
    /// Creates a new slot owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Validation`] if the title is blank or too long,
    /// or if `end_time` is not after `start_time`, and
    /// [`SwapError::Conflict`] if the requested initial status is
    /// [`SlotStatus::SwapPending`].
    pub fn create(owner: UserId, new: NewSlot) -> Result<Self, SwapError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(SwapError::Validation("title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(SwapError::Validation(format!(
                "title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        if new.end_time <= new.start_time {
            return Err(SwapError::Validation(
                "endTime must be after startTime".to_string(),
            ));
        }

        let status = new.status.unwrap_or(SlotStatus::Busy);
        if status == SlotStatus::SwapPending {
            return Err(SwapError::Conflict(
                "a slot only becomes SWAP_PENDING through a swap request".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: SlotId::new(),
            title: title.to_string(),
            start_time: new.start_time,
            end_time: new.end_time,
            status,
            owner_id: owner,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a slot from stored attributes.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: SlotId,
        title: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        status: SlotStatus,
        owner_id: UserId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            start_time,
            end_time,
            status,
            owner_id,
            created_at,
            updated_at,
        }
    }

    /// Slot identifier.
    #[must_use]
    pub const fn id(&self) -> SlotId {
        self.id
    }

    /// Slot title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Start timestamp.
    #[must_use]
    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// End timestamp.
    #[must_use]
    pub const fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> SlotStatus {
        self.status
    }

    /// Current owner.
    #[must_use]
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` if `user` currently owns this slot.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    /// Applies an owner-initiated status change.
    ///
    /// Owners may move between [`SlotStatus::Busy`] and
    /// [`SlotStatus::Swappable`]; requesting the current status is a no-op.
    /// Returns `true` if the status actually changed.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Forbidden`] if `actor` is not the owner and
    /// [`SwapError::Conflict`] for any transition into or out of
    /// [`SlotStatus::SwapPending`].
    pub fn change_status_by_owner(
        &mut self,
        actor: UserId,
        next: SlotStatus,
    ) -> Result<bool, SwapError> {
        if !self.is_owned_by(actor) {
            return Err(SwapError::Forbidden(format!(
                "slot {} is not owned by the caller",
                self.id
            )));
        }
        match (self.status, next) {
            (SlotStatus::SwapPending, _) => Err(SwapError::Conflict(format!(
                "slot {} is locked by a pending swap request",
                self.id
            ))),
            (_, SlotStatus::SwapPending) => Err(SwapError::Conflict(
                "a slot only becomes SWAP_PENDING through a swap request".to_string(),
            )),
            (current, next) if current == next => Ok(false),
            (_, next) => {
                self.status = next;
                self.updated_at = Utc::now();
                Ok(true)
            }
        }
    }

    /// Checks that `actor` may delete this slot.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Forbidden`] if `actor` is not the owner and
    /// [`SwapError::Conflict`] while the slot is locked by a pending swap.
    pub fn ensure_deletable_by(&self, actor: UserId) -> Result<(), SwapError> {
        if !self.is_owned_by(actor) {
            return Err(SwapError::Forbidden(format!(
                "slot {} is not owned by the caller",
                self.id
            )));
        }
        if self.status == SlotStatus::SwapPending {
            return Err(SwapError::Conflict(format!(
                "slot {} is locked by a pending swap request",
                self.id
            )));
        }
        Ok(())
    }

    /// Locks a swappable slot into a proposal.
    pub(super) fn lock_for_swap(&mut self, now: DateTime<Utc>) {
        self.status = SlotStatus::SwapPending;
        self.updated_at = now;
    }

    /// Releases a locked slot into `status`, optionally handing it to a new owner.
    pub(super) fn release(
        &mut self,
        status: SlotStatus,
        new_owner: Option<UserId>,
        now: DateTime<Utc>,
    ) {
        if let Some(owner) = new_owner {
            self.owner_id = owner;
        }
        self.status = status;
        self.updated_at = now;
    }
}
