//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names are camelCase on the wire.

pub mod common_dto;
pub mod slot_dto;
pub mod swap_dto;

pub use common_dto::*;
pub use slot_dto::*;
pub use swap_dto::*;
