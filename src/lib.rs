//! # slotswap-gateway
//!
//! REST API and WebSocket gateway for trading scheduled time slots between
//! users.
//!
//! Users mark slots `SWAPPABLE`, offer one of theirs for someone else's,
//! and the receiver accepts (ownership is exchanged) or rejects (both slots
//! are re-opened). While a proposal is open both slots are `SWAP_PENDING`
//! and cannot be edited, deleted, or offered again.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── AuthUser extractor (auth/)
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── SlotService / SwapService / QueryService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── Slot, SwapProposal state machine (domain/)
//!     │
//!     └── SlotStore: MemoryStore | PostgresStore (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
