//! Authentication service.
//!
//! Registration, login, and password changes with argon2 hashes. Role
//! assignment is not part of registration; accounts start as customers and
//! are promoted through the CLI.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use pitstop_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{ProfileUpdate, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Longest accepted full name.
const MAX_FULL_NAME_LENGTH: usize = 50;

/// Registration form fields, as submitted.
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    /// Optional; when present it must be a Hungarian mobile number
    /// (`06` followed by nine digits).
    pub phone_number: Option<String>,
}

/// Authentication service.
///
/// Handles user registration, login, and password management.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer account.
    ///
    /// The new account is not signed in; callers send the visitor to the
    /// login page afterwards.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::MissingFullName` if the name is blank.
    /// Returns `AuthError::InvalidPhoneNumber` if a phone number is given
    /// but malformed.
    /// Returns `AuthError::UserAlreadyExists` if the email is registered.
    pub async fn register(&self, input: &RegisterInput) -> Result<User, AuthError> {
        let email = Email::parse(&input.email)?;

        validate_password(&input.password)?;
        if input.password != input.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let full_name = input.full_name.trim();
        if full_name.is_empty() {
            return Err(AuthError::MissingFullName);
        }

        let phone_number = match input.phone_number.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(phone) if is_registration_phone(phone) => Some(phone),
            Some(_) => return Err(AuthError::InvalidPhoneNumber),
        };

        let password_hash = hash_password(&input.password)?;

        let user = self
            .users
            .create(&email, &password_hash, full_name, phone_number)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Update the signed-in user's profile fields.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFullName` if the name is blank or too long.
    /// Returns `AuthError::InvalidPhoneNumber` if the phone is malformed.
    /// Returns `AuthError::UserNotFound` if the account vanished.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        full_name: &str,
        phone_number: Option<&str>,
    ) -> Result<User, AuthError> {
        let full_name = full_name.trim();
        if full_name.is_empty() || full_name.chars().count() > MAX_FULL_NAME_LENGTH {
            return Err(AuthError::MissingFullName);
        }

        let phone_number = match phone_number.map(str::trim) {
            None | Some("") => None,
            Some(phone) if is_profile_phone(phone) => Some(phone.to_owned()),
            Some(_) => return Err(AuthError::InvalidPhoneNumber),
        };

        let update = ProfileUpdate {
            full_name: Some(full_name.to_owned()),
            phone_number,
        };

        self.users
            .update_profile(user_id, &update)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Change the signed-in user's password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is wrong.
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        let current_hash = self
            .users
            .get_password_hash_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(current_password, &current_hash)?;

        validate_password(new_password)?;
        if new_password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let new_hash = hash_password(new_password)?;
        self.users
            .update_password(user_id, &new_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Registration accepts Hungarian mobile numbers only: `06` + nine digits.
fn is_registration_phone(phone: &str) -> bool {
    phone.len() == 11 && phone.starts_with("06") && phone.bytes().all(|b| b.is_ascii_digit())
}

/// The profile form is laxer: digits, `+`, spaces and dashes, 6-20 chars.
fn is_profile_phone(phone: &str) -> bool {
    let len = phone.chars().count();
    (6..=20).contains(&len)
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || c == '+' || c == ' ' || c == '-')
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_floor() {
        assert!(validate_password("tit0k").is_err());
        assert!(validate_password("titok1").is_ok());
    }

    #[test]
    fn test_registration_phone_format() {
        assert!(is_registration_phone("06301234567"));
        assert!(!is_registration_phone("0630123456"));
        assert!(!is_registration_phone("063012345678"));
        assert!(!is_registration_phone("07301234567"));
        assert!(!is_registration_phone("06-30-123-45"));
    }

    #[test]
    fn test_profile_phone_format() {
        assert!(is_profile_phone("+36 30 123 4567"));
        assert!(is_profile_phone("06-30-123-4567"));
        assert!(!is_profile_phone("12345"));
        assert!(!is_profile_phone("telefon"));
        assert!(!is_profile_phone("123456789012345678901"));
    }

    #[test]
    fn test_hash_then_verify_roundtrip() {
        let hash = hash_password("nagyon-titkos").unwrap();
        assert!(verify_password("nagyon-titkos", &hash).is_ok());
        assert!(matches!(
            verify_password("rossz-jelszo", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
