//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Promote a registered account to admin
//! ps-cli admin promote -e admin@example.com
//! ```
//!
//! There is no "create admin" command: the account owner registers through
//! the shop first, then gets promoted here. That way every admin has a
//! password hash created by the same code path as everyone else's.

use thiserror::Error;

use pitstop_core::{Email, UserRole};
use pitstop_storefront::db::{RepositoryError, UserRepository};

use super::ConnectError;

/// Errors that can occur during user management.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid email address.
    #[error("invalid email: {0}")]
    InvalidEmail(String),

    /// No account registered under the given email.
    #[error("no account found for {0}; ask them to register first")]
    NoSuchUser(String),

    /// Database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Promote the account registered under `email` to admin.
///
/// # Errors
///
/// Returns [`AdminError::NoSuchUser`] if no account exists for the email,
/// or a database error if the lookup or update fails.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    let email: Email = email
        .parse()
        .map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let pool = super::connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AdminError::NoSuchUser(email.as_str().to_owned()))?;

    if user.role.is_admin() {
        tracing::info!(email = %email.as_str(), "Account is already an admin");
        return Ok(());
    }

    let user = users.set_role(user.id, UserRole::Admin).await?;
    tracing::info!(email = %email.as_str(), id = %user.id, "Promoted to admin");
    Ok(())
}
