//! Domain models for the storefront.
//!
//! These types represent validated domain objects separate from database
//! row types and from the JSON payloads the cache layer persists.

pub mod order;
pub mod part;
pub mod session;
pub mod user;
