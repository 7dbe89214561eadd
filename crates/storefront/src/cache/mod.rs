//! User-scoped client cache.
//!
//! The cart and the compare list are convenience state, not records: they
//! belong to whoever is signed in on a device (or to the shared guest
//! identity) and survive restarts through per-device slot files.
//!
//! - [`store`] is the durable layer: string slots keyed `<prefix>_<owner>`
//! - [`cart`] and [`compare`] are the owner-bound state containers
//! - [`registry`] hands out one container pair per device id
//!
//! Containers bind to exactly one owner at a time. Sign-in and sign-out
//! rebind them, which replaces the visible collection wholesale; mutations
//! carry the owner the caller resolved and are discarded when a rebind got
//! there first.

pub mod cart;
pub mod compare;
pub mod registry;
pub mod store;

pub use cart::{CART_PREFIX, CartCache, CartError, CartLine, CartSnapshot};
pub use compare::{COMPARE_PREFIX, CompareCache, CompareError, CompareSnapshot, MAX_COMPARE_ITEMS};
pub use registry::{CacheRegistry, DeviceCaches};
pub use store::{FileStore, MemoryStore, SlotStore, StoreError};
