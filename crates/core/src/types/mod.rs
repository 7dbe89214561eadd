//! Core types for Pitstop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod owner;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use owner::OwnerKey;
pub use status::*;
