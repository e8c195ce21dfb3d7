//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names follow the overlay wire shape (`outputIndex`,
//! `lockingScript`). Locking scripts travel as hex strings.

pub mod admission_dto;
pub mod lookup_dto;
pub mod output_dto;

pub use admission_dto::*;
pub use lookup_dto::*;
pub use output_dto::*;
