//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use pitstop_core::{Email, OwnerKey, UserId, UserRole};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Customer or admin.
    pub role: UserRole,
}

impl CurrentUser {
    /// The owner key cached collections are partitioned by for this user.
    #[must_use]
    pub const fn owner_key(&self) -> OwnerKey {
        OwnerKey::User(self.id)
    }

    /// Whether this session belongs to an admin.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Session keys for authentication and cache-scoping data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the per-browser device ID that namespaces cart/compare storage.
    pub const DEVICE_ID: &str = "device_id";
}
