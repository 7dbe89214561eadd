//! Authentication route handlers.
//!
//! Login, registration, and logout against the local account store. Signing
//! in or out changes the owner identity, so both handlers rebind the
//! device's cart and compare list before redirecting; the visitor lands on
//! the next page already looking at the right collections.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, Session};
use tracing::instrument;

use pitstop_core::OwnerKey;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    OptionalAuth, SESSION_EXPIRY_SECONDS, clear_current_user, device_id, set_current_user,
};
use crate::models::session::CurrentUser;
use crate::services::auth::{AuthError, AuthService, RegisterInput};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Checkbox; present when the visitor wants to stay signed in.
    pub stay_signed_in: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub phone_number: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
///
/// Visitors who are already signed in have no business here and land on
/// their profile instead.
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/profile").into_response();
    }
    LoginTemplate {
        user: None,
        error: query.error,
        success: query.success,
    }
    .into_response()
}

/// Handle login form submission.
///
/// A successful login cycles the session id, stores the identity, and
/// rebinds the device's cached collections to the user before redirecting.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let user = match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) => {
            // One code for both cases; the form must not reveal which
            // part was wrong.
            return Ok(Redirect::to("/login?error=credentials").into_response());
        }
        Err(e) => return Err(AppError::Auth(e)),
    };

    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
    };
    set_current_user(&session, &current).await?;

    // "Stay signed in" keeps the sliding window; otherwise the cookie
    // lasts only until the browser closes.
    let expiry = if form.stay_signed_in.is_some() {
        Expiry::OnInactivity(Duration::seconds(SESSION_EXPIRY_SECONDS))
    } else {
        Expiry::OnSessionEnd
    };
    session.set_expiry(Some(expiry));

    let device = device_id(&session).await?;
    state.caches().device(device, current.owner_key());

    set_sentry_user(&user.id.to_string(), user.email.as_str());
    add_breadcrumb("auth", "signed in");

    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
///
/// Signed-in visitors are redirected to their profile, same as the login
/// page.
pub async fn register_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/profile").into_response();
    }
    RegisterTemplate {
        user: None,
        error: query.error,
    }
    .into_response()
}

/// Handle registration form submission.
///
/// A new account is not signed in; the visitor is sent to the login page
/// with a success banner instead.
#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let input = RegisterInput {
        email: form.email,
        password: form.password,
        confirm_password: form.confirm_password,
        full_name: form.full_name,
        phone_number: form.phone_number,
    };

    match AuthService::new(state.pool()).register(&input).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "customer registered");
            Ok(Redirect::to("/login?success=registered").into_response())
        }
        Err(e) => {
            let code = match e {
                AuthError::UserAlreadyExists => "email_taken",
                AuthError::InvalidEmail(_) => "invalid_email",
                AuthError::WeakPassword(_) => "weak_password",
                AuthError::PasswordMismatch => "password_mismatch",
                AuthError::MissingFullName => "missing_name",
                AuthError::InvalidPhoneNumber => "invalid_phone",
                other => return Err(AppError::Auth(other)),
            };
            Ok(Redirect::to(&format!("/register?error={code}")).into_response())
        }
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
///
/// Removes the stored identity but keeps the device id, then rebinds the
/// cached collections to the guest owner. The visitor's guest cart and
/// compare list from before they signed in come back into view.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Response> {
    clear_current_user(&session).await?;

    let device = device_id(&session).await?;
    state.caches().device(device, OwnerKey::Guest);

    clear_sentry_user();
    add_breadcrumb("auth", "signed out");

    Ok(Redirect::to("/").into_response())
}
