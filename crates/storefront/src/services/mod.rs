//! Business logic services for the shop.
//!
//! # Services
//!
//! - `auth` - Registration, login, and password changes (argon2)
//! - `checkout` - Order totals and order placement

pub mod auth;
pub mod checkout;

pub use auth::{AuthError, AuthService};
pub use checkout::{CheckoutError, CheckoutService, OrderTotals};
