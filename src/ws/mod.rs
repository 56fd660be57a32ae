//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` pushes slot and swap events to the
//! users they involve. Clients choose which slots to follow with
//! `subscribe`/`unsubscribe` commands.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
