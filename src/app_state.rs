//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::domain::EventBus;
use crate::persistence::SlotStore;
use crate::service::{QueryService, SlotService, SwapService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Owner operations on slots.
    pub slot_service: SlotService,
    /// Swap orchestrator.
    pub swap_service: SwapService,
    /// Read-only views.
    pub query_service: QueryService,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Store handle, used by the health check.
    pub store: Arc<dyn SlotStore>,
    /// Bearer token validation.
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    /// Wires every service to one store and one event bus.
    #[must_use]
    pub fn new(store: Arc<dyn SlotStore>, event_bus: EventBus, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            slot_service: SlotService::new(Arc::clone(&store), event_bus.clone()),
            swap_service: SwapService::new(Arc::clone(&store), event_bus.clone()),
            query_service: QueryService::new(Arc::clone(&store)),
            event_bus,
            store,
            auth,
        }
    }
}
