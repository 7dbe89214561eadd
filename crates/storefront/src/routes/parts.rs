//! Catalog route handlers.
//!
//! The listing supports free-text search, category/brand filters, and price
//! or name sorting, all driven by query parameters so filtered views stay
//! bookmarkable.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use pitstop_core::{OwnerKey, PartId};

use crate::db::PartRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::part::{Part, PartFilter, PartSort};
use crate::models::session::CurrentUser;
use crate::state::AppState;

/// Catalog listing query parameters.
#[derive(Debug, Deserialize)]
pub struct PartListQuery {
    /// Free-text search term.
    pub q: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub sort: Option<String>,
}

impl PartListQuery {
    /// Normalize the raw query into filter criteria, dropping blank values
    /// so an empty search box means "no filter".
    fn into_filter(self) -> PartFilter {
        PartFilter {
            search: normalize(self.q),
            category: normalize(self.category),
            brand: normalize(self.brand),
            sort: PartSort::from_param(self.sort.as_deref()),
        }
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Part listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "parts/index.html")]
pub struct PartsIndexTemplate {
    pub user: Option<CurrentUser>,
    /// Owner the page's cart/compare forms mutate on behalf of.
    pub owner: OwnerKey,
    pub parts: Vec<Part>,
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    pub filter: PartFilter,
}

/// Part detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "parts/show.html")]
pub struct PartShowTemplate {
    pub user: Option<CurrentUser>,
    pub owner: OwnerKey,
    pub part: Part,
}

/// Display the filterable part listing.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<PartListQuery>,
) -> Result<PartsIndexTemplate> {
    let repo = PartRepository::new(state.pool());
    let filter = query.into_filter();

    let parts = repo.list(&filter).await?;
    let categories = repo.categories().await?;
    let brands = repo.brands().await?;

    let owner = OwnerKey::from_user(user.as_ref().map(|u| u.id));
    Ok(PartsIndexTemplate {
        user,
        owner,
        parts,
        categories,
        brands,
        filter,
    })
}

/// Display a part's detail page.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<PartId>,
) -> Result<PartShowTemplate> {
    let part = PartRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("part {id}")))?;

    let owner = OwnerKey::from_user(user.as_ref().map(|u| u.id));
    Ok(PartShowTemplate { user, owner, part })
}
