//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, CheckoutError};

/// Application-wide error type for route handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Database(_) | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(AuthError::InvalidCredentials | AuthError::UserNotFound) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Auth(_) => StatusCode::BAD_REQUEST,
            Self::Checkout(CheckoutError::Repository(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Checkout(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Returns a user-safe message. Server-side details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => {
                "A keresett oldal nem található.".to_owned()
            }
            Self::Database(_)
            | Self::Session(_)
            | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
            | Self::Checkout(CheckoutError::Repository(_)) => {
                "Váratlan hiba történt. Kérjük, próbálja újra később.".to_owned()
            }
            Self::Auth(AuthError::InvalidCredentials | AuthError::UserNotFound) => {
                "Hibás e-mail cím vagy jelszó.".to_owned()
            }
            Self::Auth(_) | Self::Checkout(_) => "Érvénytelen kérés.".to_owned(),
        }
    }

    /// Whether this error should be reported to Sentry.
    fn should_capture(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Session(_)
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
                | Self::Checkout(CheckoutError::Repository(_))
        ) && !matches!(self, Self::Database(RepositoryError::NotFound))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.should_capture() {
            tracing::error!(error = %self, status = %status, "request failed");
            sentry::capture_message(&self.to_string(), sentry::Level::Error);
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }

        (status, self.public_message()).into_response()
    }
}

/// Convenience alias for handler return types.
pub type Result<T> = std::result::Result<T, AppError>;

/// Attaches the signed-in user to the Sentry scope so captured events
/// carry the account that hit the error.
pub fn set_sentry_user(user_id: &str, email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_owned()),
            email: Some(email.to_owned()),
            ..Default::default()
        }));
    });
}

/// Clears the Sentry scope user on sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Records a breadcrumb for significant user actions (sign-in, cart
/// mutations, order placement).
pub fn add_breadcrumb(category: &str, message: &str) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::NotFound("part 42".to_owned());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(!err.should_capture());
    }

    #[test]
    fn repository_not_found_maps_to_404() {
        let err = AppError::Database(RepositoryError::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(!err.should_capture());
    }

    #[test]
    fn database_errors_are_captured_and_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "bad email in row".to_owned(),
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.should_capture());
        assert!(!err.public_message().contains("bad email"));
    }

    #[test]
    fn invalid_credentials_map_to_401() {
        let err = AppError::Auth(AuthError::InvalidCredentials);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(!err.should_capture());
    }

    #[test]
    fn validation_errors_map_to_400() {
        let err = AppError::Auth(AuthError::PasswordMismatch);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.should_capture());
    }

    #[test]
    fn checkout_validation_maps_to_400() {
        let err = AppError::Checkout(CheckoutError::EmptyCart);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.should_capture());
    }
}
