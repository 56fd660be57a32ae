//! In-process slot store.
//!
//! [`MemoryStore`] keeps both tables in `HashMap`s behind one
//! [`tokio::sync::RwLock`]. Reads share the lock; every write method holds
//! the write lock for its whole read-check-write sequence and mutates
//! copies of the rows, which are written back only once the domain checks
//! have passed.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ProposalFilter, SlotFilter, SlotStore, SlotUpdate, SwapResolution, vanished_slot};
use crate::domain::{
    ProposalId, Slot, SlotId, SlotStatus, SwapDecision, SwapProposal, UserId,
};
use crate::error::SwapError;

#[derive(Debug, Default)]
struct Tables {
    slots: HashMap<SlotId, Slot>,
    proposals: HashMap<ProposalId, SwapProposal>,
}

/// Slot store held entirely in memory.
///
/// # Concurrency
///
/// - Any number of concurrent readers.
/// - Writes are serialized, so two proposals can never claim the same slot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn insert_slot(&self, slot: Slot) -> Result<Slot, SwapError> {
        let mut tables = self.tables.write().await;
        if tables.slots.contains_key(&slot.id()) {
            return Err(SwapError::Conflict(format!(
                "slot {} already exists",
                slot.id()
            )));
        }
        tables.slots.insert(slot.id(), slot.clone());
        Ok(slot)
    }

    async fn get_slot(&self, id: SlotId) -> Result<Option<Slot>, SwapError> {
        Ok(self.tables.read().await.slots.get(&id).cloned())
    }

    async fn list_slots(&self, filter: &SlotFilter) -> Result<Vec<Slot>, SwapError> {
        let tables = self.tables.read().await;
        let mut slots: Vec<Slot> = tables
            .slots
            .values()
            .filter(|slot| filter.matches(slot))
            .cloned()
            .collect();
        slots.sort_by_key(|slot| (slot.start_time(), slot.id()));
        Ok(slots)
    }

    async fn update_slot_status(
        &self,
        actor: UserId,
        id: SlotId,
        status: SlotStatus,
    ) -> Result<SlotUpdate, SwapError> {
        let mut tables = self.tables.write().await;
        let mut slot = tables
            .slots
            .get(&id)
            .cloned()
            .ok_or(SwapError::SlotNotFound(id))?;
        let previous = slot.status();
        if slot.change_status_by_owner(actor, status)? {
            tables.slots.insert(id, slot.clone());
        }
        Ok(SlotUpdate { previous, slot })
    }

    async fn delete_slot(&self, actor: UserId, id: SlotId) -> Result<Slot, SwapError> {
        let mut tables = self.tables.write().await;
        let slot = tables.slots.get(&id).ok_or(SwapError::SlotNotFound(id))?;
        slot.ensure_deletable_by(actor)?;
        tables.slots.remove(&id).ok_or(SwapError::SlotNotFound(id))
    }

    async fn propose_swap(
        &self,
        requester: UserId,
        my_slot_id: SlotId,
        their_slot_id: SlotId,
    ) -> Result<SwapProposal, SwapError> {
        SwapProposal::validate_pair(my_slot_id, their_slot_id)?;

        let mut tables = self.tables.write().await;
        let mut mine = tables
            .slots
            .get(&my_slot_id)
            .cloned()
            .ok_or(SwapError::SlotNotFound(my_slot_id))?;
        let mut theirs = tables
            .slots
            .get(&their_slot_id)
            .cloned()
            .ok_or(SwapError::SlotNotFound(their_slot_id))?;

        let proposal = SwapProposal::open(requester, &mut mine, &mut theirs)?;

        tables.slots.insert(my_slot_id, mine);
        tables.slots.insert(their_slot_id, theirs);
        tables.proposals.insert(proposal.id(), proposal.clone());
        Ok(proposal)
    }

    async fn respond_to_swap(
        &self,
        responder: UserId,
        proposal_id: ProposalId,
        decision: SwapDecision,
    ) -> Result<SwapResolution, SwapError> {
        let mut tables = self.tables.write().await;
        let mut proposal = tables
            .proposals
            .get(&proposal_id)
            .cloned()
            .ok_or(SwapError::ProposalNotFound(proposal_id))?;
        proposal.ensure_respondable_by(responder)?;

        let mut mine = tables
            .slots
            .get(&proposal.my_slot_id())
            .cloned()
            .ok_or_else(|| vanished_slot(&proposal, proposal.my_slot_id()))?;
        let mut theirs = tables
            .slots
            .get(&proposal.their_slot_id())
            .cloned()
            .ok_or_else(|| vanished_slot(&proposal, proposal.their_slot_id()))?;

        proposal.respond(responder, decision, &mut mine, &mut theirs)?;

        tables.slots.insert(mine.id(), mine.clone());
        tables.slots.insert(theirs.id(), theirs.clone());
        tables.proposals.insert(proposal_id, proposal.clone());
        Ok(SwapResolution {
            proposal,
            my_slot: mine,
            their_slot: theirs,
        })
    }

    async fn get_proposal(&self, id: ProposalId) -> Result<Option<SwapProposal>, SwapError> {
        Ok(self.tables.read().await.proposals.get(&id).cloned())
    }

    async fn list_proposals(
        &self,
        filter: &ProposalFilter,
    ) -> Result<Vec<SwapProposal>, SwapError> {
        let tables = self.tables.read().await;
        let mut proposals: Vec<SwapProposal> = tables
            .proposals
            .values()
            .filter(|proposal| filter.matches(proposal))
            .cloned()
            .collect();
        proposals.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(proposals)
    }

    async fn ping(&self) -> Result<(), SwapError> {
        Ok(())
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Removes a slot without any checks, as an out-of-band administrative
    /// delete would.
    pub(crate) async fn force_remove_slot(&self, id: SlotId) {
        self.tables.write().await.slots.remove(&id);
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::slot::tests::new_slot;
    use crate::domain::SwapStatus;
    use crate::persistence::ProposalRole;

    async fn seed(store: &MemoryStore, owner: UserId, status: SlotStatus) -> SlotId {
        let Ok(slot) = Slot::create(owner, new_slot(Some(status))) else {
            panic!("valid slot");
        };
        let Ok(slot) = store.insert_slot(slot).await else {
            panic!("insert failed");
        };
        slot.id()
    }

    async fn status_of(store: &MemoryStore, id: SlotId) -> SlotStatus {
        let Ok(Some(slot)) = store.get_slot(id).await else {
            panic!("slot {id} missing");
        };
        slot.status()
    }

    /// Every slot is SWAP_PENDING iff some pending proposal references it.
    async fn assert_pending_invariant(store: &MemoryStore) {
        let tables = store.tables.read().await;
        for slot in tables.slots.values() {
            let referenced = tables
                .proposals
                .values()
                .filter(|p| p.status() == SwapStatus::Pending)
                .filter(|p| p.my_slot_id() == slot.id() || p.their_slot_id() == slot.id())
                .count();
            assert!(referenced <= 1, "slot {} claimed twice", slot.id());
            assert_eq!(
                slot.status() == SlotStatus::SwapPending,
                referenced == 1,
                "slot {} violates the pending invariant",
                slot.id()
            );
        }
    }

    #[tokio::test]
    async fn propose_then_accept_scenario() {
        let store = MemoryStore::new();
        let (a, b) = (UserId::new(), UserId::new());
        let s1 = seed(&store, a, SlotStatus::Swappable).await;
        let s2 = seed(&store, b, SlotStatus::Swappable).await;

        let Ok(proposal) = store.propose_swap(a, s1, s2).await else {
            panic!("proposal failed");
        };
        assert_eq!(proposal.status(), SwapStatus::Pending);
        assert_eq!(status_of(&store, s1).await, SlotStatus::SwapPending);
        assert_eq!(status_of(&store, s2).await, SlotStatus::SwapPending);
        assert_pending_invariant(&store).await;

        let Ok(resolution) = store
            .respond_to_swap(b, proposal.id(), SwapDecision::Accept)
            .await
        else {
            panic!("response failed");
        };
        assert_eq!(resolution.proposal.status(), SwapStatus::Accepted);
        let Ok(Some(slot1)) = store.get_slot(s1).await else {
            panic!("slot missing");
        };
        let Ok(Some(slot2)) = store.get_slot(s2).await else {
            panic!("slot missing");
        };
        assert_eq!(slot1.owner_id(), b);
        assert_eq!(slot2.owner_id(), a);
        assert_eq!(slot1.status(), SlotStatus::Busy);
        assert_eq!(slot2.status(), SlotStatus::Busy);
        assert_pending_invariant(&store).await;
    }

    #[tokio::test]
    async fn propose_with_missing_slot_is_not_found() {
        let store = MemoryStore::new();
        let a = UserId::new();
        let s1 = seed(&store, a, SlotStatus::Swappable).await;
        let result = store.propose_swap(a, s1, SlotId::new()).await;
        assert!(matches!(result, Err(SwapError::SlotNotFound(_))));
        assert_eq!(status_of(&store, s1).await, SlotStatus::Swappable);
    }

    #[tokio::test]
    async fn propose_same_slot_is_validation_error() {
        let store = MemoryStore::new();
        let a = UserId::new();
        let s1 = seed(&store, a, SlotStatus::Swappable).await;
        let result = store.propose_swap(a, s1, s1).await;
        assert!(matches!(result, Err(SwapError::Validation(_))));
        let missing = SlotId::new();
        let result = store.propose_swap(a, missing, missing).await;
        assert!(matches!(result, Err(SwapError::Validation(_))));
        assert_pending_invariant(&store).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_proposals_for_one_slot_have_one_winner() {
        let store = Arc::new(MemoryStore::new());
        let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());
        let target = seed(&store, c, SlotStatus::Swappable).await;
        let offer_a = seed(&store, a, SlotStatus::Swappable).await;
        let offer_b = seed(&store, b, SlotStatus::Swappable).await;

        let first = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.propose_swap(a, offer_a, target).await }
        });
        let second = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.propose_swap(b, offer_b, target).await }
        });
        let (Ok(first), Ok(second)) = (first.await, second.await) else {
            panic!("task panicked");
        };

        let (winner_offer, loser_offer, loser_result) = match (first.is_ok(), second.is_ok()) {
            (true, false) => (offer_a, offer_b, second),
            (false, true) => (offer_b, offer_a, first),
            _ => panic!("expected exactly one success"),
        };
        assert!(matches!(loser_result, Err(SwapError::Conflict(_))));
        assert_eq!(status_of(&store, winner_offer).await, SlotStatus::SwapPending);
        assert_eq!(status_of(&store, loser_offer).await, SlotStatus::Swappable);
        assert_eq!(status_of(&store, target).await, SlotStatus::SwapPending);
        assert_pending_invariant(&store).await;
    }

    #[tokio::test]
    async fn reject_reopens_both_slots() {
        let store = MemoryStore::new();
        let (a, b) = (UserId::new(), UserId::new());
        let s1 = seed(&store, a, SlotStatus::Swappable).await;
        let s2 = seed(&store, b, SlotStatus::Swappable).await;
        let Ok(proposal) = store.propose_swap(a, s1, s2).await else {
            panic!("proposal failed");
        };

        let Ok(resolution) = store
            .respond_to_swap(b, proposal.id(), SwapDecision::Reject)
            .await
        else {
            panic!("response failed");
        };
        assert_eq!(resolution.proposal.status(), SwapStatus::Rejected);
        assert_eq!(resolution.my_slot.owner_id(), a);
        assert_eq!(resolution.their_slot.owner_id(), b);
        assert_eq!(status_of(&store, s1).await, SlotStatus::Swappable);
        assert_eq!(status_of(&store, s2).await, SlotStatus::Swappable);
        assert_pending_invariant(&store).await;
    }

    #[tokio::test]
    async fn second_response_conflicts_and_changes_nothing() {
        let store = MemoryStore::new();
        let (a, b) = (UserId::new(), UserId::new());
        let s1 = seed(&store, a, SlotStatus::Swappable).await;
        let s2 = seed(&store, b, SlotStatus::Swappable).await;
        let Ok(proposal) = store.propose_swap(a, s1, s2).await else {
            panic!("proposal failed");
        };
        let Ok(first) = store
            .respond_to_swap(b, proposal.id(), SwapDecision::Accept)
            .await
        else {
            panic!("response failed");
        };

        let again = store
            .respond_to_swap(b, proposal.id(), SwapDecision::Reject)
            .await;
        assert!(matches!(again, Err(SwapError::Conflict(_))));

        let (Ok(Some(p)), Ok(Some(slot1)), Ok(Some(slot2))) = (
            store.get_proposal(proposal.id()).await,
            store.get_slot(s1).await,
            store.get_slot(s2).await,
        ) else {
            panic!("entities missing");
        };
        assert_eq!(p, first.proposal);
        assert_eq!(slot1, first.my_slot);
        assert_eq!(slot2, first.their_slot);
    }

    #[tokio::test]
    async fn respond_by_non_receiver_is_forbidden() {
        let store = MemoryStore::new();
        let (a, b) = (UserId::new(), UserId::new());
        let s1 = seed(&store, a, SlotStatus::Swappable).await;
        let s2 = seed(&store, b, SlotStatus::Swappable).await;
        let Ok(proposal) = store.propose_swap(a, s1, s2).await else {
            panic!("proposal failed");
        };
        for intruder in [a, UserId::new()] {
            let result = store
                .respond_to_swap(intruder, proposal.id(), SwapDecision::Accept)
                .await;
            assert!(matches!(result, Err(SwapError::Forbidden(_))));
        }
        assert_pending_invariant(&store).await;
    }

    #[tokio::test]
    async fn respond_with_vanished_slot_conflicts_and_stays_pending() {
        let store = MemoryStore::new();
        let (a, b) = (UserId::new(), UserId::new());
        let s1 = seed(&store, a, SlotStatus::Swappable).await;
        let s2 = seed(&store, b, SlotStatus::Swappable).await;
        let Ok(proposal) = store.propose_swap(a, s1, s2).await else {
            panic!("proposal failed");
        };
        store.force_remove_slot(s2).await;

        let result = store
            .respond_to_swap(b, proposal.id(), SwapDecision::Accept)
            .await;
        assert!(matches!(result, Err(SwapError::Conflict(_))));
        let Ok(Some(p)) = store.get_proposal(proposal.id()).await else {
            panic!("proposal missing");
        };
        assert_eq!(p.status(), SwapStatus::Pending);
        assert_eq!(status_of(&store, s1).await, SlotStatus::SwapPending);
    }

    #[tokio::test]
    async fn respond_to_unknown_proposal_is_not_found() {
        let store = MemoryStore::new();
        let result = store
            .respond_to_swap(UserId::new(), ProposalId::new(), SwapDecision::Accept)
            .await;
        assert!(matches!(result, Err(SwapError::ProposalNotFound(_))));
    }

    #[tokio::test]
    async fn owner_status_update_and_delete() {
        let store = MemoryStore::new();
        let a = UserId::new();
        let s1 = seed(&store, a, SlotStatus::Busy).await;

        let Ok(update) = store
            .update_slot_status(a, s1, SlotStatus::Swappable)
            .await
        else {
            panic!("update failed");
        };
        assert!(update.changed());
        assert_eq!(update.previous, SlotStatus::Busy);
        assert_eq!(status_of(&store, s1).await, SlotStatus::Swappable);

        let stranger = store.delete_slot(UserId::new(), s1).await;
        assert!(matches!(stranger, Err(SwapError::Forbidden(_))));
        assert!(store.delete_slot(a, s1).await.is_ok());
        assert!(matches!(store.get_slot(s1).await, Ok(None)));
        assert!(matches!(
            store.delete_slot(a, s1).await,
            Err(SwapError::SlotNotFound(_))
        ));
    }

    #[tokio::test]
    async fn locked_slot_cannot_be_deleted_or_edited() {
        let store = MemoryStore::new();
        let (a, b) = (UserId::new(), UserId::new());
        let s1 = seed(&store, a, SlotStatus::Swappable).await;
        let s2 = seed(&store, b, SlotStatus::Swappable).await;
        assert!(store.propose_swap(a, s1, s2).await.is_ok());

        assert!(matches!(
            store.delete_slot(a, s1).await,
            Err(SwapError::Conflict(_))
        ));
        assert!(matches!(
            store.update_slot_status(b, s2, SlotStatus::Busy).await,
            Err(SwapError::Conflict(_))
        ));
        assert_pending_invariant(&store).await;
    }

    #[tokio::test]
    async fn lists_filter_and_order() {
        let store = MemoryStore::new();
        let (a, b) = (UserId::new(), UserId::new());
        let s1 = seed(&store, a, SlotStatus::Swappable).await;
        let s2 = seed(&store, b, SlotStatus::Swappable).await;
        let _busy = seed(&store, b, SlotStatus::Busy).await;

        let Ok(for_a) = store.list_slots(&SlotFilter::swappable_for(a)).await else {
            panic!("list failed");
        };
        assert_eq!(for_a.iter().map(Slot::id).collect::<Vec<_>>(), vec![s2]);

        let Ok(mine) = store.list_slots(&SlotFilter::owned_by(b)).await else {
            panic!("list failed");
        };
        assert_eq!(mine.len(), 2);

        let Ok(proposal) = store.propose_swap(a, s1, s2).await else {
            panic!("proposal failed");
        };
        let incoming = ProposalFilter {
            participant: b,
            role: ProposalRole::Incoming,
            status: None,
        };
        let outgoing = ProposalFilter {
            participant: b,
            role: ProposalRole::Outgoing,
            status: None,
        };
        let Ok(received) = store.list_proposals(&incoming).await else {
            panic!("list failed");
        };
        assert_eq!(received.len(), 1);
        assert_eq!(received.first().map(SwapProposal::id), Some(proposal.id()));
        assert!(matches!(store.list_proposals(&outgoing).await, Ok(v) if v.is_empty()));
    }
}
