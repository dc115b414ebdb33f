//! Shared types for the IPS payment ledger.
//!
//! This crate defines the payment intent data model, the caller identity
//! passed explicitly through every ledger operation, the error taxonomy,
//! and the HTTP request/response types.

pub mod api;
pub mod caller;
pub mod errors;
pub mod intent;

pub use api::*;
pub use caller::*;
pub use errors::*;
pub use intent::*;
