//! Checkout route handlers.
//!
//! Checkout is the one mutation that is a full page instead of a fragment.
//! The form still echoes the `owner` it was rendered under; a submission
//! whose owner no longer matches is bounced back to the page so the
//! customer re-reads the cart they are actually about to order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use pitstop_core::OwnerKey;

use crate::cache::CartSnapshot;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireCustomer;
use crate::models::session::CurrentUser;
use crate::services::auth::AuthService;
use crate::services::checkout::{CheckoutError, CheckoutService, OrderTotals, ShippingInput};
use crate::state::AppState;

use super::cart::bound_caches;

// =============================================================================
// Forms
// =============================================================================

/// Shipping form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub phone_number: String,
    /// Owner the originating page was rendered under.
    pub owner: String,
}

impl CheckoutForm {
    fn into_input(self) -> ShippingInput {
        ShippingInput {
            full_name: self.full_name,
            address: self.address,
            city: self.city,
            postal_code: self.postal_code,
            phone_number: self.phone_number,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub user: Option<CurrentUser>,
    pub owner: OwnerKey,
    pub cart: CartSnapshot,
    pub totals: OrderTotals,
    /// Field values, prefilled from the profile or re-shown after an error.
    pub input: ShippingInput,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout page with the cart summary and shipping form.
///
/// An empty cart has nothing to check out; the visitor is sent back to the
/// cart page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(user): RequireCustomer,
) -> Result<Response> {
    let (caches, owner) = bound_caches(&state, &session, Some(&user)).await?;
    let cart = caches.cart.snapshot();
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }
    let totals = OrderTotals::for_cart(&cart);

    // Prefill recipient fields from the profile where it has them.
    let profile = AuthService::new(state.pool())
        .get_user(user.id)
        .await
        .map_err(AppError::Auth)?;
    let input = ShippingInput {
        full_name: profile.full_name.unwrap_or_default(),
        phone_number: profile.phone_number.unwrap_or_default(),
        ..ShippingInput::default()
    };

    Ok(CheckoutTemplate {
        user: Some(user),
        owner,
        cart,
        totals,
        input,
        error: None,
    }
    .into_response())
}

/// Handle the shipping form and place the order.
///
/// Validation failures re-render the page with the submitted values and a
/// field message. On success the cart is cleared only after the order row
/// exists, so a failed insert never costs the customer their cart.
#[instrument(skip(state, session, user, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(user): RequireCustomer,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let (caches, owner) = bound_caches(&state, &session, Some(&user)).await?;
    let origin = match form.owner.parse::<OwnerKey>() {
        Ok(origin) if origin == owner => origin,
        // A rebind beat this submission; show the page as it stands now.
        _ => return Ok(Redirect::to("/checkout").into_response()),
    };

    let cart = caches.cart.snapshot();
    let input = form.into_input();

    let order = match CheckoutService::new(state.pool())
        .place_order(user.id, &cart, &input)
        .await
    {
        Ok(order) => order,
        Err(CheckoutError::EmptyCart) => return Ok(Redirect::to("/cart").into_response()),
        Err(CheckoutError::Repository(e)) => return Err(AppError::Database(e)),
        Err(e) => {
            let message = match e {
                CheckoutError::MissingFullName => "Adja meg a nevét!",
                CheckoutError::MissingAddress => "Adja meg a szállítási címet!",
                CheckoutError::MissingCity => "Adja meg a várost!",
                CheckoutError::InvalidPostalCode => "Érvénytelen irányítószám.",
                CheckoutError::InvalidPhoneNumber => "Érvénytelen telefonszám.",
                CheckoutError::EmptyCart | CheckoutError::Repository(_) => "Érvénytelen kérés.",
            };
            let totals = OrderTotals::for_cart(&cart);
            return Ok(CheckoutTemplate {
                user: Some(user),
                owner,
                cart,
                totals,
                input,
                error: Some(message.to_owned()),
            }
            .into_response());
        }
    };

    // The order exists; an out-of-date clear only means the cart page
    // shows lines that were already bought.
    if let Err(e) = caches.cart.clear(origin) {
        tracing::warn!(order_id = %order.id, error = %e, "cart not cleared after checkout");
    }

    add_breadcrumb("checkout", &format!("order {} placed", order.id));
    tracing::info!(order_id = %order.id, total = %order.total, "order placed");

    Ok(Redirect::to(&format!("/orders/{}?placed=1", order.id)).into_response())
}
