//! Swap orchestrator: discovery, proposal, and response.
//!
//! The orchestrator is the only caller that moves slots into or out of
//! `SWAP_PENDING`. Each proposal or response is a single atomic store call
//! so that, after every call, a slot is `SWAP_PENDING` exactly when a
//! pending proposal references it.

use std::sync::Arc;

use crate::domain::{
    EventBus, ProposalId, Slot, SlotId, SwapDecision, SwapEvent, SwapProposal, UserId,
};
use crate::error::SwapError;
use crate::persistence::{SlotFilter, SlotStore};
use crate::service::{Page, PageRequest};

/// Coordinates the two-party swap protocol.
#[derive(Debug, Clone)]
pub struct SwapService {
    store: Arc<dyn SlotStore>,
    event_bus: EventBus,
}

impl SwapService {
    /// Creates a new `SwapService`.
    #[must_use]
    pub fn new(store: Arc<dyn SlotStore>, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Lists swappable slots owned by anyone except `requester`, ordered by
    /// start time.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Persistence`] if the store is unavailable.
    pub async fn list_swappable(
        &self,
        requester: UserId,
        page: PageRequest,
    ) -> Result<Page<Slot>, SwapError> {
        let slots = self
            .store
            .list_slots(&SlotFilter::swappable_for(requester))
            .await?;
        Ok(page.slice(slots))
    }

    /// Offers `my_slot_id` in exchange for `their_slot_id`.
    ///
    /// On success both slots are `SWAP_PENDING` and a `PENDING` proposal
    /// records the current owners.
    ///
    /// # Errors
    ///
    /// - [`SwapError::Validation`] if both ids are the same.
    /// - [`SwapError::SlotNotFound`] if either slot does not exist.
    /// - [`SwapError::Forbidden`] if `requester` does not own `my_slot_id`.
    /// - [`SwapError::Conflict`] unless both slots are `SWAPPABLE`.
    pub async fn propose(
        &self,
        requester: UserId,
        my_slot_id: SlotId,
        their_slot_id: SlotId,
    ) -> Result<SwapProposal, SwapError> {
        let proposal = self
            .store
            .propose_swap(requester, my_slot_id, their_slot_id)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    %requester,
                    %my_slot_id,
                    %their_slot_id,
                    error = %e,
                    "swap proposal rejected"
                );
            })?;

        self.event_bus.publish_committed(SwapEvent::SwapProposed {
            proposal_id: proposal.id(),
            my_slot_id,
            their_slot_id,
            requester_id: proposal.requester_id(),
            receiver_id: proposal.receiver_id(),
            timestamp: proposal.created_at(),
        });
        tracing::info!(
            proposal_id = %proposal.id(),
            %requester,
            receiver = %proposal.receiver_id(),
            "swap proposed"
        );
        Ok(proposal)
    }

    /// Accepts or rejects a pending proposal addressed to `responder`.
    ///
    /// Accepting exchanges the owners of the two slots and marks both
    /// `BUSY`; rejecting returns both to `SWAPPABLE` with owners unchanged.
    ///
    /// # Errors
    ///
    /// - [`SwapError::ProposalNotFound`] if the proposal does not exist.
    /// - [`SwapError::Forbidden`] if `responder` is not the receiver.
    /// - [`SwapError::Conflict`] if the proposal is already resolved or one
    ///   of its slots was deleted or is no longer `SWAP_PENDING`.
    pub async fn respond(
        &self,
        responder: UserId,
        proposal_id: ProposalId,
        decision: SwapDecision,
    ) -> Result<SwapProposal, SwapError> {
        let resolution = self
            .store
            .respond_to_swap(responder, proposal_id, decision)
            .await
            .inspect_err(|e| {
                tracing::warn!(%proposal_id, %responder, ?decision, error = %e, "swap response rejected");
            })?;
        let proposal = resolution.proposal;

        let (my_slot_id, their_slot_id) = (proposal.my_slot_id(), proposal.their_slot_id());
        let requester_id = proposal.requester_id();
        let receiver_id = proposal.receiver_id();
        let timestamp = proposal.updated_at();
        let event = match decision {
            SwapDecision::Accept => SwapEvent::SwapAccepted {
                proposal_id,
                my_slot_id,
                their_slot_id,
                requester_id,
                receiver_id,
                timestamp,
            },
            SwapDecision::Reject => SwapEvent::SwapRejected {
                proposal_id,
                my_slot_id,
                their_slot_id,
                requester_id,
                receiver_id,
                timestamp,
            },
        };
        self.event_bus.publish_committed(event);

        tracing::info!(
            %proposal_id,
            status = %proposal.status(),
            my_slot_owner = %resolution.my_slot.owner_id(),
            their_slot_owner = %resolution.their_slot.owner_id(),
            "swap resolved"
        );
        Ok(proposal)
    }
}
