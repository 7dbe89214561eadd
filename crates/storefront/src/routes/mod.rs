//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (featured parts)
//! GET  /health                 - Health check
//!
//! # Catalog
//! GET  /parts                  - Part listing with search/filter/sort
//! GET  /parts/{id}             - Part detail
//!
//! # Cart (page for customer accounts; fragments answer anyone)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add part (guests get a sign-in toast)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove part (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Compare (HTMX fragments, guests welcome)
//! GET  /compare                - Comparison table (max 3 parts)
//! POST /compare/add            - Add part (duplicate/limit feedback)
//! POST /compare/remove         - Remove part
//! POST /compare/clear          - Empty the list
//! GET  /compare/count          - Compare count badge (fragment)
//!
//! # Checkout (customer accounts only)
//! GET  /checkout               - Shipping address form with totals
//! POST /checkout               - Place the order
//!
//! # Orders (requires auth)
//! GET  /orders                 - Order history
//! GET  /orders/{id}            - Order detail (own orders only)
//!
//! # Auth (pages redirect signed-in visitors to /profile)
//! GET  /login                  - Login page
//! POST /login                  - Login action (optional stay-signed-in)
//! GET  /register               - Registration page
//! POST /register               - Registration action
//! POST /logout                 - Logout action
//!
//! # Profile (requires auth)
//! GET  /profile                - Profile form
//! POST /profile                - Update name/phone
//! POST /profile/password       - Change password
//!
//! # Admin (requires admin role)
//! GET  /admin                  - Dashboard with stats
//! GET  /admin/users            - Registered accounts
//! GET  /admin/parts            - Catalog management list
//! GET  /admin/parts/new        - New part form
//! POST /admin/parts            - Create part (multipart, optional image)
//! GET  /admin/parts/{id}/edit  - Edit part form
//! POST /admin/parts/{id}       - Update part
//! POST /admin/parts/{id}/delete - Delete part
//! POST /admin/orders/{id}/status - Update order status
//!
//! Unknown paths redirect to the home page.
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod compare;
pub mod home;
pub mod orders;
pub mod parts;
pub mod profile;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, fragment_rate_limiter};
use crate::state::AppState;

/// Transient feedback fragment, swapped into the page's `#toast` area.
///
/// Cart and compare mutations answer HTMX requests with this when the
/// operation was rejected (sign-in required, duplicate, limit reached).
#[derive(Template, WebTemplate)]
#[template(path = "partials/toast.html")]
pub struct ToastTemplate {
    pub message: String,
    /// Visual tone: `error` or `info`.
    pub tone: &'static str,
}

/// Respond with a toast, retargeting the HTMX swap away from the form's
/// normal target.
pub(crate) fn toast(message: &str, tone: &'static str) -> Response {
    (
        AppendHeaders([("HX-Retarget", "#toast"), ("HX-Reswap", "innerHTML")]),
        ToastTemplate {
            message: message.to_owned(),
            tone,
        },
    )
        .into_response()
}

/// Tell HTMX to reload the whole page.
///
/// Used when a mutation arrives from a page rendered for a different owner
/// (the visitor signed in or out in another tab): the stale view is not
/// worth patching, it needs a full re-render.
pub(crate) fn hx_refresh() -> Response {
    (AppendHeaders([("HX-Refresh", "true")]), StatusCode::OK).into_response()
}

/// Create the catalog routes router.
pub fn part_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(parts::index))
        .route("/{id}", get(parts::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the compare routes router.
pub fn compare_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(compare::show))
        .route("/add", post(compare::add))
        .route("/remove", post(compare::remove))
        .route("/clear", post(compare::clear))
        .route("/count", get(compare::count))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).post(profile::update))
        .route("/password", post(profile::change_password))
}

/// Create the admin routes router.
///
/// The part form carries an optional product photo, so this router gets a
/// body limit sized for it instead of the 2 MB default.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/users", get(admin::users_index))
        .route("/parts", get(admin::parts_index).post(admin::create_part))
        .route("/parts/new", get(admin::new_part))
        .route("/parts/{id}", post(admin::update_part))
        .route("/parts/{id}/edit", get(admin::edit_part))
        .route("/parts/{id}/delete", post(admin::delete_part))
        .route("/orders/{id}/status", post(admin::update_order_status))
        .layer(DefaultBodyLimit::max(admin::UPLOAD_BODY_LIMIT))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .nest("/parts", part_routes())
        // Cart and compare fragments get the relaxed per-IP limiter
        .nest("/cart", cart_routes().layer(fragment_rate_limiter()))
        .nest("/compare", compare_routes().layer(fragment_rate_limiter()))
        // Checkout
        .route("/checkout", get(checkout::show).post(checkout::submit))
        // Orders
        .nest("/orders", order_routes())
        // Profile
        .nest("/profile", profile_routes())
        // Admin
        .nest("/admin", admin_routes())
        // Login/registration get the strict limiter
        .merge(auth_routes().layer(auth_rate_limiter()))
        // Unknown paths go home rather than 404, matching the SPA the
        // shop's customers were used to
        .fallback(|| async { Redirect::to("/") })
}
