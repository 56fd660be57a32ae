//! Persistence layer: the [`SlotStore`] contract and its implementations.
//!
//! Every write method of [`SlotStore`] is one atomic unit: it re-reads the
//! rows it touches under a write lock, re-validates them through the domain
//! entities, writes, and commits. A failed call leaves the store unchanged.
//!
//! - [`MemoryStore`]: in-process tables behind a single `RwLock`.
//! - [`PostgresStore`]: `sqlx::PgPool` with one transaction per write and
//!   `SELECT … FOR UPDATE` row locks.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{
    ProposalId, Slot, SlotId, SlotStatus, SwapDecision, SwapProposal, SwapStatus, UserId,
};
use crate::error::SwapError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Row filter for slot scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotFilter {
    /// Only slots owned by this user.
    pub owner: Option<UserId>,
    /// Skip slots owned by this user.
    pub exclude_owner: Option<UserId>,
    /// Only slots with this status.
    pub status: Option<SlotStatus>,
}

impl SlotFilter {
    /// All slots owned by `user`, any status.
    #[must_use]
    pub fn owned_by(user: UserId) -> Self {
        Self {
            owner: Some(user),
            ..Self::default()
        }
    }

    /// All swappable slots not owned by `user`.
    #[must_use]
    pub fn swappable_for(user: UserId) -> Self {
        Self {
            exclude_owner: Some(user),
            status: Some(SlotStatus::Swappable),
            ..Self::default()
        }
    }

    /// Returns `true` if `slot` passes the filter.
    #[must_use]
    pub fn matches(&self, slot: &Slot) -> bool {
        self.owner.is_none_or(|owner| slot.owner_id() == owner)
            && self
                .exclude_owner
                .is_none_or(|excluded| slot.owner_id() != excluded)
            && self.status.is_none_or(|status| slot.status() == status)
    }
}

/// Which side of a proposal a user is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProposalRole {
    /// Proposals the user received.
    Incoming,
    /// Proposals the user sent.
    Outgoing,
    /// Either side.
    #[default]
    Any,
}

/// Row filter for proposal scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposalFilter {
    /// User whose proposals are listed.
    pub participant: UserId,
    /// Side of the proposal the participant must be on.
    pub role: ProposalRole,
    /// Only proposals with this status.
    pub status: Option<SwapStatus>,
}

impl ProposalFilter {
    /// Returns `true` if `proposal` passes the filter.
    #[must_use]
    pub fn matches(&self, proposal: &SwapProposal) -> bool {
        let side = match self.role {
            ProposalRole::Incoming => proposal.receiver_id() == self.participant,
            ProposalRole::Outgoing => proposal.requester_id() == self.participant,
            ProposalRole::Any => proposal.involves(self.participant),
        };
        side && self.status.is_none_or(|status| proposal.status() == status)
    }
}

/// Result of an owner status change.
#[derive(Debug, Clone)]
pub struct SlotUpdate {
    /// Status before the change.
    pub previous: SlotStatus,
    /// Slot after the change.
    pub slot: Slot,
}

impl SlotUpdate {
    /// Returns `true` if the status actually changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous != self.slot.status()
    }
}

/// Result of resolving a proposal: the proposal and both slots as committed.
#[derive(Debug, Clone)]
pub struct SwapResolution {
    /// Resolved proposal.
    pub proposal: SwapProposal,
    /// Slot originally offered by the requester.
    pub my_slot: Slot,
    /// Slot originally owned by the receiver.
    pub their_slot: Slot,
}

/// Durable storage for slots and swap proposals.
///
/// Implementations must make every write method atomic with respect to
/// every other write method.
#[async_trait]
pub trait SlotStore: Send + Sync + fmt::Debug {
    /// Stores a newly created slot.
    ///
    /// # Errors
    ///
    /// [`SwapError::Conflict`] if the id is taken, [`SwapError::Persistence`]
    /// on storage failure.
    async fn insert_slot(&self, slot: Slot) -> Result<Slot, SwapError>;

    /// Point lookup of a slot.
    ///
    /// # Errors
    ///
    /// [`SwapError::Persistence`] on storage failure.
    async fn get_slot(&self, id: SlotId) -> Result<Option<Slot>, SwapError>;

    /// Filtered scan, ordered by start time.
    ///
    /// # Errors
    ///
    /// [`SwapError::Persistence`] on storage failure.
    async fn list_slots(&self, filter: &SlotFilter) -> Result<Vec<Slot>, SwapError>;

    /// Atomically applies an owner-initiated status change.
    ///
    /// # Errors
    ///
    /// [`SwapError::SlotNotFound`], or whatever
    /// [`Slot::change_status_by_owner`] rejects the change with.
    async fn update_slot_status(
        &self,
        actor: UserId,
        id: SlotId,
        status: SlotStatus,
    ) -> Result<SlotUpdate, SwapError>;

    /// Atomically deletes a slot on behalf of its owner.
    ///
    /// # Errors
    ///
    /// [`SwapError::SlotNotFound`], or whatever
    /// [`Slot::ensure_deletable_by`] rejects the deletion with.
    async fn delete_slot(&self, actor: UserId, id: SlotId) -> Result<Slot, SwapError>;

    /// Atomically opens a proposal and locks both slots.
    ///
    /// # Errors
    ///
    /// [`SwapError::SlotNotFound`] for a missing slot, or whatever
    /// [`SwapProposal::open`] rejects the proposal with.
    async fn propose_swap(
        &self,
        requester: UserId,
        my_slot_id: SlotId,
        their_slot_id: SlotId,
    ) -> Result<SwapProposal, SwapError>;

    /// Atomically resolves a proposal and both of its slots.
    ///
    /// # Errors
    ///
    /// [`SwapError::ProposalNotFound`], [`SwapError::Conflict`] if a slot
    /// has vanished, or whatever [`SwapProposal::respond`] rejects.
    async fn respond_to_swap(
        &self,
        responder: UserId,
        proposal_id: ProposalId,
        decision: SwapDecision,
    ) -> Result<SwapResolution, SwapError>;

    /// Point lookup of a proposal.
    ///
    /// # Errors
    ///
    /// [`SwapError::Persistence`] on storage failure.
    async fn get_proposal(&self, id: ProposalId) -> Result<Option<SwapProposal>, SwapError>;

    /// Filtered scan, newest first.
    ///
    /// # Errors
    ///
    /// [`SwapError::Persistence`] on storage failure.
    async fn list_proposals(
        &self,
        filter: &ProposalFilter,
    ) -> Result<Vec<SwapProposal>, SwapError>;

    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// [`SwapError::Persistence`] if it is not.
    async fn ping(&self) -> Result<(), SwapError>;
}

/// Error for a proposal whose slot disappeared while it was pending.
pub(crate) fn vanished_slot(proposal: &SwapProposal, slot_id: SlotId) -> SwapError {
    SwapError::Conflict(format!(
        "slot {slot_id} of swap request {} no longer exists",
        proposal.id()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::slot::tests::make_slot;

    #[test]
    fn swappable_filter_excludes_own_and_non_swappable() {
        let me = UserId::new();
        let other = UserId::new();
        let filter = SlotFilter::swappable_for(me);
        assert!(!filter.matches(&make_slot(me, SlotStatus::Swappable)));
        assert!(!filter.matches(&make_slot(other, SlotStatus::Busy)));
        assert!(!filter.matches(&make_slot(other, SlotStatus::SwapPending)));
        assert!(filter.matches(&make_slot(other, SlotStatus::Swappable)));
    }

    #[test]
    fn owner_filter_matches_any_status() {
        let me = UserId::new();
        let filter = SlotFilter::owned_by(me);
        assert!(filter.matches(&make_slot(me, SlotStatus::SwapPending)));
        assert!(!filter.matches(&make_slot(UserId::new(), SlotStatus::Busy)));
    }
}
