//! Compare-list routes.
//!
//! Same shape as the cart routes, minus the sign-in gate: guests may build
//! a compare list. Mutation forms echo the `owner` the page was rendered
//! under so that a sign-in or sign-out in another tab turns stale writes
//! into a full-page refresh instead of silently landing on the wrong list.

use askama::Template;
use askama_web::WebTemplate;
use axum::Form;
use axum::extract::State;
use axum::response::{AppendHeaders, IntoResponse, Response};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use pitstop_core::{OwnerKey, PartId};

use crate::cache::{CompareError, CompareSnapshot, MAX_COMPARE_ITEMS};
use crate::db::PartRepository;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::part::PartSummary;
use crate::models::session::CurrentUser;
use crate::state::AppState;

use super::cart::bound_caches;

// =============================================================================
// Forms
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddToCompareForm {
    pub part_id: PartId,
    /// Owner the originating page was rendered under.
    pub owner: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCompareForm {
    pub part_id: PartId,
    pub owner: String,
}

#[derive(Debug, Deserialize)]
pub struct ClearCompareForm {
    pub owner: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Full compare page.
#[derive(Template, WebTemplate)]
#[template(path = "compare/show.html")]
pub struct CompareShowTemplate {
    pub user: Option<CurrentUser>,
    pub owner: OwnerKey,
    pub snapshot: CompareSnapshot,
}

/// Comparison table fragment, swapped in after remove/clear.
#[derive(Template, WebTemplate)]
#[template(path = "partials/compare_table.html")]
pub struct CompareTableTemplate {
    pub owner: OwnerKey,
    pub snapshot: CompareSnapshot,
}

/// Header badge fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/compare_count.html")]
pub struct CompareCountTemplate {
    pub count: usize,
}

fn table_response(owner: OwnerKey, snapshot: CompareSnapshot) -> Response {
    (
        AppendHeaders([("HX-Trigger", "compare-updated")]),
        CompareTableTemplate { owner, snapshot },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the compare page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<CompareShowTemplate> {
    let (caches, owner) = bound_caches(&state, &session, user.as_ref()).await?;
    let snapshot = caches.compare.snapshot();

    Ok(CompareShowTemplate {
        user,
        owner,
        snapshot,
    })
}

/// Put a part on the compare list (HTMX).
///
/// A part that is already listed and a full list get different toasts; the
/// duplicate case wins when both apply, so re-clicking a listed part on a
/// full list never scolds the user about the limit.
#[instrument(skip(state, session, user, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddToCompareForm>,
) -> Result<Response> {
    let (caches, _) = bound_caches(&state, &session, user.as_ref()).await?;
    let Ok(origin) = form.owner.parse::<OwnerKey>() else {
        return Ok(super::hx_refresh());
    };

    let Some(part) = PartRepository::new(state.pool()).get(form.part_id).await? else {
        return Ok(super::toast("Ez az alkatrész már nem elérhető.", "error"));
    };

    match caches.compare.add(origin, &PartSummary::from(&part)) {
        Ok(snapshot) => {
            add_breadcrumb("compare", &format!("listed {}", part.name));
            Ok((
                AppendHeaders([("HX-Trigger", "compare-updated")]),
                CompareCountTemplate {
                    count: snapshot.len(),
                },
            )
                .into_response())
        }
        Err(CompareError::AlreadyListed) => {
            Ok(super::toast("Ez az alkatrész már a listán van.", "info"))
        }
        Err(CompareError::LimitReached) => Ok(super::toast(
            &format!("Legfeljebb {MAX_COMPARE_ITEMS} alkatrész hasonlítható össze."),
            "error",
        )),
        Err(CompareError::Superseded) => Ok(super::hx_refresh()),
    }
}

/// Take a part off the compare list (HTMX).
#[instrument(skip(state, session, user, form))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<RemoveFromCompareForm>,
) -> Result<Response> {
    let (caches, _) = bound_caches(&state, &session, user.as_ref()).await?;
    let Ok(origin) = form.owner.parse::<OwnerKey>() else {
        return Ok(super::hx_refresh());
    };

    match caches.compare.remove(origin, form.part_id) {
        Ok(snapshot) => Ok(table_response(origin, snapshot)),
        Err(CompareError::Superseded) => Ok(super::hx_refresh()),
        Err(CompareError::AlreadyListed | CompareError::LimitReached) => {
            Ok(super::toast("Érvénytelen kérés.", "error"))
        }
    }
}

/// Empty the compare list (HTMX). Also deletes its storage slot.
#[instrument(skip(state, session, user, form))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<ClearCompareForm>,
) -> Result<Response> {
    let (caches, _) = bound_caches(&state, &session, user.as_ref()).await?;
    let Ok(origin) = form.owner.parse::<OwnerKey>() else {
        return Ok(super::hx_refresh());
    };

    match caches.compare.clear(origin) {
        Ok(snapshot) => Ok(table_response(origin, snapshot)),
        Err(CompareError::Superseded) => Ok(super::hx_refresh()),
        Err(CompareError::AlreadyListed | CompareError::LimitReached) => {
            Ok(super::toast("Érvénytelen kérés.", "error"))
        }
    }
}

/// Header badge fragment with the current list size.
#[instrument(skip(state, session, user))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<CompareCountTemplate> {
    let (caches, _) = bound_caches(&state, &session, user.as_ref()).await?;

    Ok(CompareCountTemplate {
        count: caches.compare.snapshot().len(),
    })
}
