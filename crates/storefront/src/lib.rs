//! Pitstop storefront library.
//!
//! The Hungarian auto-parts webshop as a library crate, so handlers,
//! services and the cache layer can be tested without a running binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
