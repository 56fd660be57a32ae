//! Per-connection subscription manager.
//!
//! Tracks which slots a WebSocket client follows. Events are only ever
//! offered to a connection if they involve its user; the subscription
//! narrows that further.

use std::collections::HashSet;

use crate::domain::{SlotId, SwapEvent, UserId};

/// Slot subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Followed slots. Ignored while `subscribe_all` is set.
    slot_ids: HashSet<SlotId>,
    /// Wildcard `"*"`: every event involving the user.
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates an empty subscription set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Follows `ids`; `wildcard` follows everything.
    pub fn subscribe(&mut self, ids: &[SlotId], wildcard: bool) {
        self.subscribe_all |= wildcard;
        self.slot_ids.extend(ids.iter().copied());
    }

    /// Stops following `ids`; `wildcard` also clears the wildcard.
    pub fn unsubscribe(&mut self, ids: &[SlotId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.slot_ids.remove(id);
        }
    }

    /// Returns `true` if `event` should be delivered to `user`.
    #[must_use]
    pub fn wants(&self, user: UserId, event: &SwapEvent) -> bool {
        event.involves(user)
            && (self.subscribe_all
                || event
                    .slot_ids()
                    .iter()
                    .any(|id| self.slot_ids.contains(id)))
    }

    /// Number of explicitly followed slots.
    #[must_use]
    pub fn count(&self) -> usize {
        self.slot_ids.len()
    }

    /// Returns `true` if the wildcard is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn created(slot_id: SlotId, owner_id: UserId) -> SwapEvent {
        SwapEvent::SlotCreated {
            slot_id,
            owner_id,
            status: crate::domain::SlotStatus::Busy,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_wants_nothing() {
        let user = UserId::new();
        let mgr = SubscriptionManager::new();
        assert!(!mgr.wants(user, &created(SlotId::new(), user)));
    }

    #[test]
    fn followed_slot_is_delivered() {
        let user = UserId::new();
        let slot = SlotId::new();
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[slot], false);
        assert!(mgr.wants(user, &created(slot, user)));
        assert!(!mgr.wants(user, &created(SlotId::new(), user)));
    }

    #[test]
    fn wildcard_never_leaks_other_users_events() {
        let user = UserId::new();
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true);
        assert!(mgr.wants(user, &created(SlotId::new(), user)));
        assert!(!mgr.wants(user, &created(SlotId::new(), UserId::new())));
    }

    #[test]
    fn unsubscribe_removes_slot_and_wildcard() {
        let user = UserId::new();
        let slot = SlotId::new();
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[slot, SlotId::new()], true);
        assert_eq!(mgr.count(), 2);

        mgr.unsubscribe(&[slot], true);
        assert!(!mgr.is_subscribed_all());
        assert_eq!(mgr.count(), 1);
        assert!(!mgr.wants(user, &created(slot, user)));
    }
}
