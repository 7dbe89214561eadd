//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives server-side, per device and per owner; mutation
//! forms echo the owner they were rendered under so a stale tab cannot
//! write into another identity's cart.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use pitstop_core::{OwnerKey, PartId};

use crate::cache::{CartError, CartSnapshot, DeviceCaches};
use crate::db::PartRepository;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireCustomer, device_id};
use crate::models::part::PartSummary;
use crate::models::session::CurrentUser;
use crate::services::OrderTotals;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub part_id: PartId,
    pub quantity: Option<u32>,
    /// Owner the submitting page was rendered for.
    pub owner: String,
}

/// Update cart quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub part_id: PartId,
    pub quantity: i64,
    pub owner: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub part_id: PartId,
    pub owner: String,
}

/// Clear cart form data.
#[derive(Debug, Deserialize)]
pub struct ClearCartForm {
    pub owner: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub user: Option<CurrentUser>,
    pub owner: OwnerKey,
    pub cart: CartSnapshot,
    pub totals: OrderTotals,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub owner: OwnerKey,
    pub cart: CartSnapshot,
    pub totals: OrderTotals,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Helpers
// =============================================================================

/// The device's cache pair bound to the current owner, plus that owner.
pub(super) async fn bound_caches(
    state: &AppState,
    session: &Session,
    user: Option<&CurrentUser>,
) -> Result<(Arc<DeviceCaches>, OwnerKey)> {
    let owner = OwnerKey::from_user(user.map(|u| u.id));
    let device = device_id(session).await?;
    Ok((state.caches().device(device, owner), owner))
}

fn items_response(owner: OwnerKey, cart: CartSnapshot) -> Response {
    let totals = OrderTotals::for_cart(&cart);
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            owner,
            cart,
            totals,
        },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
///
/// The page itself is for signed-in customers; the add buttons on the
/// public catalog pages handle guests with their own sign-in prompt.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(user): RequireCustomer,
) -> Result<CartShowTemplate> {
    let (caches, owner) = bound_caches(&state, &session, Some(&user)).await?;
    let cart = caches.cart.snapshot();
    let totals = OrderTotals::for_cart(&cart);

    Ok(CartShowTemplate {
        user: Some(user),
        owner,
        cart,
        totals,
    })
}

/// Add a part to the cart (HTMX).
///
/// Returns the refreshed count badge and fires `cart-updated`; rejections
/// come back as a toast instead. Guests are told to sign in - the cart is
/// for customers who can actually order.
#[instrument(skip(state, session, user, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let (caches, _) = bound_caches(&state, &session, user.as_ref()).await?;
    let Ok(origin) = form.owner.parse::<OwnerKey>() else {
        return Ok(super::hx_refresh());
    };

    let Some(part) = PartRepository::new(state.pool()).get(form.part_id).await? else {
        return Ok(super::toast("Ez az alkatrész már nem elérhető.", "error"));
    };

    let quantity = form.quantity.unwrap_or(1);
    match caches.cart.add(origin, &PartSummary::from(&part), quantity) {
        Ok(snapshot) => {
            add_breadcrumb("cart", &format!("added {} x{quantity}", part.name));
            Ok((
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                CartCountTemplate {
                    count: snapshot.total_item_count(),
                },
            )
                .into_response())
        }
        Err(CartError::SignInRequired) => Ok(super::toast(
            "A kosár használatához jelentkezzen be!",
            "error",
        )),
        Err(CartError::InvalidQuantity) => Ok(super::toast("Érvénytelen mennyiség.", "error")),
        Err(CartError::Superseded) => Ok(super::hx_refresh()),
    }
}

/// Update a line's quantity (HTMX). Zero or less removes the line.
#[instrument(skip(state, session, user, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let (caches, _) = bound_caches(&state, &session, user.as_ref()).await?;
    let Ok(origin) = form.owner.parse::<OwnerKey>() else {
        return Ok(super::hx_refresh());
    };

    match caches.cart.update_quantity(origin, form.part_id, form.quantity) {
        Ok(snapshot) => Ok(items_response(origin, snapshot)),
        Err(CartError::Superseded) => Ok(super::hx_refresh()),
        Err(CartError::SignInRequired | CartError::InvalidQuantity) => {
            Ok(super::toast("Érvénytelen kérés.", "error"))
        }
    }
}

/// Remove a part from the cart (HTMX).
#[instrument(skip(state, session, user, form))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let (caches, _) = bound_caches(&state, &session, user.as_ref()).await?;
    let Ok(origin) = form.owner.parse::<OwnerKey>() else {
        return Ok(super::hx_refresh());
    };

    match caches.cart.remove(origin, form.part_id) {
        Ok(snapshot) => Ok(items_response(origin, snapshot)),
        Err(CartError::Superseded) => Ok(super::hx_refresh()),
        Err(CartError::SignInRequired | CartError::InvalidQuantity) => {
            Ok(super::toast("Érvénytelen kérés.", "error"))
        }
    }
}

/// Empty the cart (HTMX). Also deletes the cart's storage slot.
#[instrument(skip(state, session, user, form))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<ClearCartForm>,
) -> Result<Response> {
    let (caches, _) = bound_caches(&state, &session, user.as_ref()).await?;
    let Ok(origin) = form.owner.parse::<OwnerKey>() else {
        return Ok(super::hx_refresh());
    };

    match caches.cart.clear(origin) {
        Ok(snapshot) => Ok(items_response(origin, snapshot)),
        Err(CartError::Superseded) => Ok(super::hx_refresh()),
        Err(CartError::SignInRequired | CartError::InvalidQuantity) => {
            Ok(super::toast("Érvénytelen kérés.", "error"))
        }
    }
}

/// Get the cart count badge (HTMX).
///
/// The header badge loads this on page load and again on every
/// `cart-updated` event.
#[instrument(skip(state, session, user))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<CartCountTemplate> {
    let (caches, _) = bound_caches(&state, &session, user.as_ref()).await?;

    Ok(CartCountTemplate {
        count: caches.cart.total_item_count(),
    })
}
