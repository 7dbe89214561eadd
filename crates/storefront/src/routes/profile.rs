//! Profile route handlers.
//!
//! Name, phone and password management for the signed-in user. Outcomes
//! travel as query codes the way the login page does it; the template turns
//! them into Hungarian banners.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::session::CurrentUser;
use crate::models::user::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Forms
// =============================================================================

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub full_name: String,
    pub phone_number: Option<String>,
}

/// Password change form data.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/show.html")]
pub struct ProfileTemplate {
    pub user: Option<CurrentUser>,
    pub profile: User,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the profile page.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<ProfileTemplate> {
    let profile = AuthService::new(state.pool())
        .get_user(user.id)
        .await
        .map_err(AppError::Auth)?;

    Ok(ProfileTemplate {
        user: Some(user),
        profile,
        error: query.error,
        success: query.success,
    })
}

/// Handle the profile form.
#[instrument(skip(state, user, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .update_profile(user.id, &form.full_name, form.phone_number.as_deref())
        .await
    {
        Ok(_) => Ok(Redirect::to("/profile?success=saved").into_response()),
        Err(AuthError::MissingFullName) => {
            Ok(Redirect::to("/profile?error=missing_name").into_response())
        }
        Err(AuthError::InvalidPhoneNumber) => {
            Ok(Redirect::to("/profile?error=invalid_phone").into_response())
        }
        Err(e) => Err(AppError::Auth(e)),
    }
}

/// Handle the password change form.
#[instrument(skip(state, user, form))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PasswordForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .change_password(
            user.id,
            &form.current_password,
            &form.new_password,
            &form.confirm_password,
        )
        .await
    {
        Ok(()) => Ok(Redirect::to("/profile?success=password_changed").into_response()),
        Err(AuthError::InvalidCredentials) => {
            Ok(Redirect::to("/profile?error=wrong_password").into_response())
        }
        Err(AuthError::WeakPassword(_)) => {
            Ok(Redirect::to("/profile?error=weak_password").into_response())
        }
        Err(AuthError::PasswordMismatch) => {
            Ok(Redirect::to("/profile?error=password_mismatch").into_response())
        }
        Err(e) => Err(AppError::Auth(e)),
    }
}
