//! Domain layer: slot and swap entities, identifiers, and event system.
//!
//! This module contains the slot-and-swap state machine. [`Slot`] and
//! [`SwapProposal`] guard their own invariants; the [`EventBus`] broadcasts
//! committed changes.

pub mod event_bus;
pub mod ids;
pub mod proposal;
pub mod slot;
pub mod swap_event;

pub use event_bus::EventBus;
pub use ids::{ProposalId, SlotId, UserId};
pub use proposal::{SwapDecision, SwapProposal, SwapStatus};
pub use slot::{NewSlot, Slot, SlotStatus};
pub use swap_event::SwapEvent;
