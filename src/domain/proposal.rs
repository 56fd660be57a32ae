//! Swap proposal entity and the slot-and-swap state machine.
//!
//! [`SwapProposal::open`] and [`SwapProposal::respond`] are the only code
//! paths that move a [`Slot`] into or out of [`SlotStatus::SwapPending`].
//! Both validate every precondition before touching either slot, so a
//! failed call leaves all three entities unchanged. Callers are expected to
//! run them inside one atomic unit of the store (see
//! [`crate::persistence::SlotStore`]).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::slot::{Slot, SlotStatus};
use super::{ProposalId, SlotId, UserId};
use crate::error::SwapError;

/// Status of a swap proposal. `Accepted` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapStatus {
    /// Waiting for the receiver's response.
    Pending,
    /// The receiver accepted; slot owners were exchanged.
    Accepted,
    /// The receiver rejected; both slots were re-opened for trading.
    Rejected,
}

impl SwapStatus {
    /// Returns the wire representation (e.g. `"PENDING"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Returns `true` once the proposal can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwapStatus {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(SwapError::Validation(format!(
                "invalid swap status: {other}"
            ))),
        }
    }
}

/// The receiver's answer to a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDecision {
    /// Exchange the two slots.
    Accept,
    /// Decline and re-open both slots.
    Reject,
}

impl From<bool> for SwapDecision {
    fn from(accept: bool) -> Self {
        if accept { Self::Accept } else { Self::Reject }
    }
}

/// A request to exchange ownership of two slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapProposal {
    id: ProposalId,
    my_slot_id: SlotId,
    their_slot_id: SlotId,
    requester_id: UserId,
    receiver_id: UserId,
    status: SwapStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SwapProposal {
    /// Checks that a proposal over `mine` and `theirs` is well-formed.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Validation`] if both ids are the same slot.
    pub fn validate_pair(mine: SlotId, theirs: SlotId) -> Result<(), SwapError> {
        if mine == theirs {
            return Err(SwapError::Validation(
                "mySlotId and theirSlotId must refer to different slots".to_string(),
            ));
        }
        Ok(())
    }

    /// Opens a new pending proposal and locks both slots.
    ///
    /// Owners are snapshotted: the requester is the current owner of
    /// `mine`, the receiver the current owner of `theirs`.
    ///
    /// # Errors
    ///
    /// - [`SwapError::Validation`] if both slots are the same slot.
    /// - [`SwapError::Forbidden`] if `requester` does not own `mine`.
    /// - [`SwapError::Conflict`] unless both slots are `SWAPPABLE`.
    pub fn open(
        requester: UserId,
        mine: &mut Slot,
        theirs: &mut Slot,
    ) -> Result<Self, SwapError> {
        Self::validate_pair(mine.id(), theirs.id())?;
        if !mine.is_owned_by(requester) {
            return Err(SwapError::Forbidden(format!(
                "slot {} is not owned by the caller",
                mine.id()
            )));
        }
        if mine.status() != SlotStatus::Swappable || theirs.status() != SlotStatus::Swappable {
            return Err(SwapError::Conflict(
                "both slots must be SWAPPABLE".to_string(),
            ));
        }

        let now = Utc::now();
        let proposal = Self {
            id: ProposalId::new(),
            my_slot_id: mine.id(),
            their_slot_id: theirs.id(),
            requester_id: mine.owner_id(),
            receiver_id: theirs.owner_id(),
            status: SwapStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        mine.lock_for_swap(now);
        theirs.lock_for_swap(now);
        Ok(proposal)
    }

    /// Checks that `responder` may resolve this proposal right now.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Conflict`] if the proposal is already resolved
    /// and [`SwapError::Forbidden`] if `responder` is not the receiver.
    pub fn ensure_respondable_by(&self, responder: UserId) -> Result<(), SwapError> {
        if self.status.is_terminal() {
            return Err(SwapError::Conflict(format!(
                "swap request {} is already {}",
                self.id, self.status
            )));
        }
        if responder != self.receiver_id {
            return Err(SwapError::Forbidden(format!(
                "only the receiver may respond to swap request {}",
                self.id
            )));
        }
        Ok(())
    }

    /// Resolves the proposal and both of its slots.
    ///
    /// On [`SwapDecision::Accept`] the two owners are exchanged and both
    /// slots become `BUSY`; on [`SwapDecision::Reject`] owners are kept and
    /// both slots become `SWAPPABLE` again.
    ///
    /// # Errors
    ///
    /// - [`SwapError::Conflict`] if the proposal is already resolved, or if
    ///   the given slots are not the two locked slots of this proposal.
    /// - [`SwapError::Forbidden`] if `responder` is not the receiver.
    pub fn respond(
        &mut self,
        responder: UserId,
        decision: SwapDecision,
        mine: &mut Slot,
        theirs: &mut Slot,
    ) -> Result<(), SwapError> {
        self.ensure_respondable_by(responder)?;
        if mine.id() != self.my_slot_id || theirs.id() != self.their_slot_id {
            return Err(SwapError::Conflict(format!(
                "slots do not match swap request {}",
                self.id
            )));
        }
        if mine.status() != SlotStatus::SwapPending || theirs.status() != SlotStatus::SwapPending
        {
            return Err(SwapError::Conflict(format!(
                "slots of swap request {} are no longer locked",
                self.id
            )));
        }

        let now = Utc::now();
        match decision {
            SwapDecision::Accept => {
                let mine_owner = mine.owner_id();
                let theirs_owner = theirs.owner_id();
                mine.release(SlotStatus::Busy, Some(theirs_owner), now);
                theirs.release(SlotStatus::Busy, Some(mine_owner), now);
                self.status = SwapStatus::Accepted;
            }
            SwapDecision::Reject => {
                mine.release(SlotStatus::Swappable, None, now);
                theirs.release(SlotStatus::Swappable, None, now);
                self.status = SwapStatus::Rejected;
            }
        }
        self.updated_at = now;
        Ok(())
    }

    /// Rebuilds a proposal from stored attributes.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: ProposalId,
        my_slot_id: SlotId,
        their_slot_id: SlotId,
        requester_id: UserId,
        receiver_id: UserId,
        status: SwapStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            my_slot_id,
            their_slot_id,
            requester_id,
            receiver_id,
            status,
            created_at,
            updated_at,
        }
    }

    /// Proposal identifier.
    #[must_use]
    pub const fn id(&self) -> ProposalId {
        self.id
    }

    /// Slot offered by the requester.
    #[must_use]
    pub const fn my_slot_id(&self) -> SlotId {
        self.my_slot_id
    }

    /// Slot requested from the receiver.
    #[must_use]
    pub const fn their_slot_id(&self) -> SlotId {
        self.their_slot_id
    }

    /// Owner of the offered slot at proposal time.
    #[must_use]
    pub const fn requester_id(&self) -> UserId {
        self.requester_id
    }

    /// Owner of the requested slot at proposal time.
    #[must_use]
    pub const fn receiver_id(&self) -> UserId {
        self.receiver_id
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> SwapStatus {
        self.status
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

    /// Returns `true` if `user` is the requester or the receiver.
    #[must_use]
    pub fn involves(&self, user: UserId) -> bool {
        self.requester_id == user || self.receiver_id == user
    }
}
