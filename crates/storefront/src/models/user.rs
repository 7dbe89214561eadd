//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use pitstop_core::{Email, UserId, UserRole};

/// A registered user (domain type).
///
/// The password hash never leaves the db/auth layers; this type is what the
/// rest of the application sees.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Full name given at registration, editable on the profile page.
    pub full_name: Option<String>,
    /// Phone number, editable on the profile page.
    pub phone_number: Option<String>,
    /// Customer or admin.
    pub role: UserRole,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the profile was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this user may access the admin dashboard.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Profile fields a user can edit about themselves.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
}
