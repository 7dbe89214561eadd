//! Pitstop Core - Shared types library.
//!
//! This crate provides common types used across all Pitstop components:
//! - `storefront` - The customer-facing webshop (catalog, cart, checkout, admin)
//! - `cli` - Command-line tools for migrations, seeding and management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP handling. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, owner keys, emails,
//!   statuses and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
