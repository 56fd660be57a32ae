//! Domain events reflecting slot and swap state mutations.
//!
//! Every committed mutation emits a [`SwapEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ProposalId, SlotId, SlotStatus, UserId};

/// Domain event emitted after every committed state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SwapEvent {
    /// Emitted when an owner creates a slot.
    SlotCreated {
        /// New slot.
        slot_id: SlotId,
        /// Owner of the slot.
        owner_id: UserId,
        /// Initial status.
        status: SlotStatus,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when an owner changes the status of a slot.
    SlotStatusChanged {
        /// Affected slot.
        slot_id: SlotId,
        /// Owner of the slot.
        owner_id: UserId,
        /// Status before the change.
        old_status: SlotStatus,
        /// Status after the change.
        new_status: SlotStatus,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when an owner deletes a slot.
    SlotDeleted {
        /// Deleted slot.
        slot_id: SlotId,
        /// Former owner.
        owner_id: UserId,
        /// Deletion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a swap proposal is opened.
    SwapProposed {
        /// New proposal.
        proposal_id: ProposalId,
        /// Slot offered by the requester.
        my_slot_id: SlotId,
        /// Slot requested from the receiver.
        their_slot_id: SlotId,
        /// Requesting user.
        requester_id: UserId,
        /// Receiving user.
        receiver_id: UserId,
        /// Proposal timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the receiver accepts a proposal.
    SwapAccepted {
        /// Resolved proposal.
        proposal_id: ProposalId,
        /// Slot now owned by the receiver.
        my_slot_id: SlotId,
        /// Slot now owned by the requester.
        their_slot_id: SlotId,
        /// Requesting user.
        requester_id: UserId,
        /// Receiving user.
        receiver_id: UserId,
        /// Resolution timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the receiver rejects a proposal.
    SwapRejected {
        /// Resolved proposal.
        proposal_id: ProposalId,
        /// Slot re-opened for the requester.
        my_slot_id: SlotId,
        /// Slot re-opened for the receiver.
        their_slot_id: SlotId,
        /// Requesting user.
        requester_id: UserId,
        /// Receiving user.
        receiver_id: UserId,
        /// Resolution timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl SwapEvent {
    /// Returns `true` if `user` is a party to this event.
    #[must_use]
    pub fn involves(&self, user: UserId) -> bool {
        match self {
            Self::SlotCreated { owner_id, .. }
            | Self::SlotStatusChanged { owner_id, .. }
            | Self::SlotDeleted { owner_id, .. } => *owner_id == user,
            Self::SwapProposed {
                requester_id,
                receiver_id,
                ..
            }
            | Self::SwapAccepted {
                requester_id,
                receiver_id,
                ..
            }
            | Self::SwapRejected {
                requester_id,
                receiver_id,
                ..
            } => *requester_id == user || *receiver_id == user,
        }
    }

    /// Returns the slots touched by this event.
    #[must_use]
    pub fn slot_ids(&self) -> Vec<SlotId> {
        match self {
            Self::SlotCreated { slot_id, .. }
            | Self::SlotStatusChanged { slot_id, .. }
            | Self::SlotDeleted { slot_id, .. } => vec![*slot_id],
            Self::SwapProposed {
                my_slot_id,
                their_slot_id,
                ..
            }
            | Self::SwapAccepted {
                my_slot_id,
                their_slot_id,
                ..
            }
            | Self::SwapRejected {
                my_slot_id,
                their_slot_id,
                ..
            } => vec![*my_slot_id, *their_slot_id],
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::SlotCreated { .. } => "slot_created",
            Self::SlotStatusChanged { .. } => "slot_status_changed",
            Self::SlotDeleted { .. } => "slot_deleted",
            Self::SwapProposed { .. } => "swap_proposed",
            Self::SwapAccepted { .. } => "swap_accepted",
            Self::SwapRejected { .. } => "swap_rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposed(requester_id: UserId, receiver_id: UserId) -> SwapEvent {
        SwapEvent::SwapProposed {
            proposal_id: ProposalId::new(),
            my_slot_id: SlotId::new(),
            their_slot_id: SlotId::new(),
            requester_id,
            receiver_id,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn swap_event_involves_both_parties() {
        let (a, b) = (UserId::new(), UserId::new());
        let event = proposed(a, b);
        assert!(event.involves(a));
        assert!(event.involves(b));
        assert!(!event.involves(UserId::new()));
        assert_eq!(event.slot_ids().len(), 2);
    }

    #[test]
    fn slot_event_involves_owner_only() {
        let owner = UserId::new();
        let event = SwapEvent::SlotDeleted {
            slot_id: SlotId::new(),
            owner_id: owner,
            timestamp: Utc::now(),
        };
        assert!(event.involves(owner));
        assert!(!event.involves(UserId::new()));
        assert_eq!(event.event_type_str(), "slot_deleted");
    }

    #[test]
    fn serializes_with_event_type_tag() {
        let event = proposed(UserId::new(), UserId::new());
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"swap_proposed\""));
    }
}
