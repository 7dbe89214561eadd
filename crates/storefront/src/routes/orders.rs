//! Order history route handlers.
//!
//! Customers see their own orders; admins may open any order from the
//! dashboard. Everyone else gets a 404 rather than a 403, so order ids
//! leak nothing about whether they exist.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use pitstop_core::{OrderId, OrderStatus};

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::order::Order;
use crate::models::session::CurrentUser;
use crate::state::AppState;

/// Query parameters for the post-checkout banner.
#[derive(Debug, Deserialize)]
pub struct ShowQuery {
    /// Set by the checkout redirect; shows the thank-you banner once.
    pub placed: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Order list page.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub user: Option<CurrentUser>,
    pub orders: Vec<Order>,
}

/// Single order page.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub user: Option<CurrentUser>,
    pub order: Order,
    pub placed: bool,
}

impl OrderShowTemplate {
    /// Status choices for the admin's status form.
    #[allow(clippy::unused_self)]
    fn statuses(&self) -> [OrderStatus; 5] {
        OrderStatus::ALL
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the signed-in user's orders, newest first.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<OrdersIndexTemplate> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(OrdersIndexTemplate {
        user: Some(user),
        orders,
    })
}

/// Display one order.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Query(query): Query<ShowQuery>,
) -> Result<OrderShowTemplate> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    if order.user_id != user.id && !user.is_admin() {
        return Err(AppError::NotFound(format!("order {id}")));
    }

    Ok(OrderShowTemplate {
        user: Some(user),
        order,
        placed: query.placed.is_some(),
    })
}
