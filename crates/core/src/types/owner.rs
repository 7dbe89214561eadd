//! Owner keys for partitioning device-local cached state.
//!
//! Cart and compare-list contents are stored per owner: either a signed-in
//! user or the shared `guest` placeholder for a browser nobody is signed in
//! on. The owner key doubles as the suffix of the storage slot the
//! collection persists under, so two owners can never read or overwrite each
//! other's state.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Identity a cached collection is bound to.
///
/// ```
/// use pitstop_core::{OwnerKey, UserId};
///
/// let guest = OwnerKey::Guest;
/// assert_eq!(guest.slot_key("cart"), "cart_guest");
///
/// let user = OwnerKey::User(UserId::generate());
/// assert!(!user.is_guest());
/// assert!(user.slot_key("compare").starts_with("compare_"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerKey {
    /// No authenticated identity; the shared per-device placeholder.
    Guest,
    /// A signed-in user.
    User(UserId),
}

impl OwnerKey {
    /// The sentinel string used for the guest owner.
    pub const GUEST: &'static str = "guest";

    /// Build an owner key from an optional signed-in user.
    #[must_use]
    pub const fn from_user(user: Option<UserId>) -> Self {
        match user {
            Some(id) => Self::User(id),
            None => Self::Guest,
        }
    }

    /// Whether this key is the guest sentinel.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Guest => None,
            Self::User(id) => Some(*id),
        }
    }

    /// Storage key for this owner under the given collection prefix,
    /// e.g. `cart_guest` or `compare_6f9d…`.
    #[must_use]
    pub fn slot_key(&self, prefix: &str) -> String {
        format!("{prefix}_{self}")
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guest => f.write_str(Self::GUEST),
            Self::User(id) => write!(f, "{id}"),
        }
    }
}

impl From<Option<UserId>> for OwnerKey {
    fn from(user: Option<UserId>) -> Self {
        Self::from_user(user)
    }
}

/// Parses the `Display` form back: `guest` or a user UUID. Mutation forms
/// echo the owner they were rendered under, which comes back through here.
impl std::str::FromStr for OwnerKey {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::GUEST {
            return Ok(Self::Guest);
        }
        s.parse().map(Self::User)
    }
}
