//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in user (or admin) in route
//! handlers, plus session helpers for sign-in state and the per-browser
//! device ID that namespaces cart and compare storage.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::models::session::{CurrentUser, keys};

/// Extractor that requires a signed-in user.
///
/// If nobody is signed in, browser navigation is redirected to the login
/// page while HTMX fragment requests get a plain 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but nobody is signed in.
pub enum AuthRejection {
    /// Redirect to login page (for full-page requests).
    RedirectToLogin,
    /// Unauthorized response (for HTMX fragment requests).
    Unauthorized,
    /// Signed in, but the account lacks the required role.
    Forbidden,
    /// Signed in as the wrong kind of account for this page.
    RedirectHome,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
            Self::RedirectHome => Redirect::to("/").into_response(),
        }
    }
}

/// Whether this request came from HTMX rather than browser navigation.
fn is_fragment_request(parts: &Parts) -> bool {
    parts.headers.contains_key("hx-request")
}

async fn current_user_from(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session.get(keys::CURRENT_USER).await.ok().flatten()
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user_from(parts).await.ok_or({
            if is_fragment_request(parts) {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectToLogin
            }
        })?;

        Ok(Self(user))
    }
}

/// Extractor that requires a signed-in admin.
///
/// Non-admin accounts get a 403; anonymous visitors are redirected to login.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user_from(parts).await.ok_or({
            if is_fragment_request(parts) {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectToLogin
            }
        })?;

        if !user.is_admin() {
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(user))
    }
}

/// Extractor for pages that only make sense for shoppers.
///
/// Cart and checkout require a signed-in customer account: anonymous
/// visitors are sent to login, admin accounts back to the home page (they
/// manage the shop, they do not shop).
pub struct RequireCustomer(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user_from(parts).await.ok_or({
            if is_fragment_request(parts) {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectToLogin
            }
        })?;

        if user.is_admin() {
            return Err(AuthRejection::RedirectHome);
        }

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is
/// signed in.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     OptionalAuth(user): OptionalAuth,
/// ) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}!", u.email),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user_from(parts).await))
    }
}

/// Helper to set the current user in the session after sign-in.
///
/// Cycles the session ID first so a session fixated before login cannot be
/// replayed afterwards. Other session data, including the device ID, is
/// preserved.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// The session itself survives with a fresh ID: the device ID stays, so the
/// browser's guest cart and compare list remain reachable after sign-out.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(keys::CURRENT_USER).await?;
    session.cycle_id().await?;
    Ok(())
}

/// The per-browser device ID, created on first use.
///
/// Cart and compare contents are stored on the server per device, keyed by
/// this ID, so they survive logout and browser restarts while never leaking
/// between browsers.
///
/// # Errors
///
/// Returns an error if the session cannot be read or modified.
pub async fn device_id(session: &Session) -> Result<Uuid, tower_sessions::session::Error> {
    if let Some(id) = session.get::<Uuid>(keys::DEVICE_ID).await? {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    session.insert(keys::DEVICE_ID, &id).await?;
    Ok(id)
}
