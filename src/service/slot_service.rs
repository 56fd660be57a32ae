//! Owner operations on slots: create, change status, delete.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{EventBus, NewSlot, Slot, SlotId, SlotStatus, SwapEvent, UserId};
use crate::error::SwapError;
use crate::persistence::SlotStore;

/// Owner-initiated slot operations.
///
/// Every method runs as a single store call; the event for a change is
/// published only once that call has committed.
#[derive(Debug, Clone)]
pub struct SlotService {
    store: Arc<dyn SlotStore>,
    event_bus: EventBus,
}

impl SlotService {
    /// Creates a new `SlotService`.
    #[must_use]
    pub fn new(store: Arc<dyn SlotStore>, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Creates a slot owned by `owner`.
    ///
    /// # Errors
    ///
    /// - [`SwapError::Validation`] for a blank or over-long title or an
    ///   empty time range.
    /// - [`SwapError::Conflict`] if the initial status is `SWAP_PENDING`.
    pub async fn create(&self, owner: UserId, new: NewSlot) -> Result<Slot, SwapError> {
        let slot = Slot::create(owner, new).inspect_err(|e| {
            tracing::warn!(%owner, error = %e, "slot creation rejected");
        })?;
        let slot = self.store.insert_slot(slot).await?;

        self.event_bus.publish_committed(SwapEvent::SlotCreated {
            slot_id: slot.id(),
            owner_id: owner,
            status: slot.status(),
            timestamp: slot.created_at(),
        });
        tracing::info!(slot_id = %slot.id(), %owner, status = %slot.status(), "slot created");
        Ok(slot)
    }

    /// Sets the status of one of the caller's slots.
    ///
    /// Only `BUSY` and `SWAPPABLE` may be chosen; setting the current
    /// status again succeeds without emitting an event.
    ///
    /// # Errors
    ///
    /// - [`SwapError::SlotNotFound`] if the slot does not exist.
    /// - [`SwapError::Forbidden`] if `actor` does not own it.
    /// - [`SwapError::Conflict`] if the slot is, or would become, `SWAP_PENDING`.
    pub async fn update_status(
        &self,
        actor: UserId,
        slot_id: SlotId,
        status: SlotStatus,
    ) -> Result<Slot, SwapError> {
        let update = self
            .store
            .update_slot_status(actor, slot_id, status)
            .await
            .inspect_err(|e| {
                tracing::warn!(%slot_id, %actor, requested = %status, error = %e, "status change rejected");
            })?;

        if update.changed() {
            self.event_bus.publish_committed(SwapEvent::SlotStatusChanged {
                slot_id,
                owner_id: actor,
                old_status: update.previous,
                new_status: update.slot.status(),
                timestamp: Utc::now(),
            });
            tracing::info!(
                %slot_id,
                old_status = %update.previous,
                new_status = %update.slot.status(),
                "slot status changed"
            );
        }
        Ok(update.slot)
    }

    /// Deletes one of the caller's slots and returns it.
    ///
    /// # Errors
    ///
    /// - [`SwapError::SlotNotFound`] if the slot does not exist.
    /// - [`SwapError::Forbidden`] if `actor` does not own it.
    /// - [`SwapError::Conflict`] if it is part of a pending swap.
    pub async fn delete(&self, actor: UserId, slot_id: SlotId) -> Result<Slot, SwapError> {
        let slot = self
            .store
            .delete_slot(actor, slot_id)
            .await
            .inspect_err(|e| {
                tracing::warn!(%slot_id, %actor, error = %e, "slot deletion rejected");
            })?;

        self.event_bus.publish_committed(SwapEvent::SlotDeleted {
            slot_id,
            owner_id: actor,
            timestamp: Utc::now(),
        });
        tracing::info!(%slot_id, "slot deleted");
        Ok(slot)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::slot::tests::new_slot;
    use crate::persistence::MemoryStore;

    fn make_service() -> SlotService {
        SlotService::new(Arc::new(MemoryStore::new()), EventBus::new(64))
    }

    #[tokio::test]
    async fn create_emits_event() {
        let service = make_service();
        let mut rx = service.event_bus.subscribe();
        let owner = UserId::new();

        let Ok(slot) = service.create(owner, new_slot(None)).await else {
            panic!("slot should be created");
        };
        assert_eq!(slot.status(), SlotStatus::Busy);

        let Ok(SwapEvent::SlotCreated { slot_id, owner_id, .. }) = rx.try_recv() else {
            panic!("expected SlotCreated");
        };
        assert_eq!(slot_id, slot.id());
        assert_eq!(owner_id, owner);
    }

    #[tokio::test]
    async fn invalid_slot_emits_nothing() {
        let service = make_service();
        let mut rx = service.event_bus.subscribe();
        let result = service
            .create(UserId::new(), new_slot(Some(SlotStatus::SwapPending)))
            .await;
        assert!(matches!(result, Err(SwapError::Conflict(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn status_change_emits_only_when_changed() {
        let service = make_service();
        let owner = UserId::new();
        let Ok(slot) = service.create(owner, new_slot(None)).await else {
            panic!("slot should be created");
        };
        let mut rx = service.event_bus.subscribe();

        let before = service.event_bus.published_count();
        let same = service.update_status(owner, slot.id(), SlotStatus::Busy).await;
        assert!(same.is_ok());
        assert!(rx.try_recv().is_err());
        assert_eq!(service.event_bus.published_count(), before);

        let Ok(updated) = service
            .update_status(owner, slot.id(), SlotStatus::Swappable)
            .await
        else {
            panic!("owner may mark slot swappable");
        };
        assert_eq!(updated.status(), SlotStatus::Swappable);
        assert!(matches!(
            rx.try_recv(),
            Ok(SwapEvent::SlotStatusChanged {
                old_status: SlotStatus::Busy,
                new_status: SlotStatus::Swappable,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn stranger_cannot_delete() {
        let service = make_service();
        let Ok(slot) = service.create(UserId::new(), new_slot(None)).await else {
            panic!("slot should be created");
        };
        let result = service.delete(UserId::new(), slot.id()).await;
        assert!(matches!(result, Err(SwapError::Forbidden(_))));
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let service = make_service();
        let result = service.delete(UserId::new(), SlotId::new()).await;
        assert!(matches!(result, Err(SwapError::SlotNotFound(_))));
    }
}
