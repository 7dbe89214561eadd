//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::db::PartRepository;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::part::Part;
use crate::models::session::CurrentUser;
use crate::state::AppState;

/// Number of featured parts on the home page.
const FEATURED_PARTS: i64 = 4;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub user: Option<CurrentUser>,
    /// The highest-value parts in the catalog.
    pub featured: Vec<Part>,
}

/// Display the home page with the shop's featured parts.
#[instrument(skip(state, user))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let featured = PartRepository::new(state.pool())
        .featured(FEATURED_PARTS)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch featured parts: {e}");
            Vec::new()
        });

    HomeTemplate { user, featured }
}
