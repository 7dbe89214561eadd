//! Admin route handlers.
//!
//! Catalog management and order administration, gated by [`RequireAdmin`].
//! The part form posts as `multipart/form-data` so a product photo can ride
//! along; the photo is optional, capped at five megabytes, and losing it
//! never loses the part data.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use pitstop_core::{OrderId, OrderStatus, PartId};

use crate::db::orders::{OrderRepository, StatusCount};
use crate::db::{PartRepository, RepositoryError, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::order::Order;
use crate::models::part::{Part, PartFilter, PartInput};
use crate::models::session::CurrentUser;
use crate::models::user::User;
use crate::state::AppState;

/// Product photos larger than this are rejected.
const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Body limit for the part form: the photo cap plus room for text fields.
pub(super) const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

/// Orders shown on the dashboard before the full list takes over.
const RECENT_ORDERS: usize = 8;

// =============================================================================
// Forms
// =============================================================================

/// Order status form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: OrderStatus,
}

/// Query parameters for error display on the part form.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// The part form, read out of its multipart body.
#[derive(Debug, Default)]
struct PartFormData {
    name: String,
    category: String,
    brand: String,
    price: Option<Decimal>,
    description: String,
    /// Extension and bytes of an uploaded photo, when one was attached.
    image: Option<(String, Bytes)>,
    remove_image: bool,
}

impl PartFormData {
    /// Validate the text fields into a [`PartInput`], without an image URL.
    ///
    /// Returns the query code for the first failing field.
    fn into_input(
        self,
    ) -> std::result::Result<(PartInput, Option<(String, Bytes)>, bool), &'static str> {
        let name = self.name.trim().to_owned();
        let category = self.category.trim().to_owned();
        let brand = self.brand.trim().to_owned();
        if name.is_empty() || category.is_empty() || brand.is_empty() {
            return Err("missing_field");
        }

        let Some(price) = self.price else {
            return Err("invalid_price");
        };
        if price < Decimal::ZERO {
            return Err("invalid_price");
        }

        let description = self.description.trim();
        let description = (!description.is_empty()).then(|| description.to_owned());

        Ok((
            PartInput {
                name,
                category,
                brand,
                price,
                description,
                image_url: None,
            },
            self.image,
            self.remove_image,
        ))
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub user: Option<CurrentUser>,
    pub part_count: i64,
    pub average_price: Option<Decimal>,
    pub user_count: i64,
    pub admin_count: i64,
    pub order_count: i64,
    /// `None` while the shop has no accounts at all.
    pub orders_per_user: Option<Decimal>,
    pub total_value: Decimal,
    pub status_counts: Vec<StatusCount>,
    pub recent_orders: Vec<Order>,
}

/// Admin part list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/parts_index.html")]
pub struct AdminPartsTemplate {
    pub user: Option<CurrentUser>,
    pub parts: Vec<Part>,
}

/// Admin user list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users_index.html")]
pub struct AdminUsersTemplate {
    pub user: Option<CurrentUser>,
    pub users: Vec<User>,
}

/// Part create/edit form template. `part` is `None` when creating.
#[derive(Template, WebTemplate)]
#[template(path = "admin/part_form.html")]
pub struct PartFormTemplate {
    pub user: Option<CurrentUser>,
    pub part: Option<Part>,
    pub error: Option<String>,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Display the admin dashboard.
#[instrument(skip(state, user))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
) -> Result<DashboardTemplate> {
    let parts = PartRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let users = UserRepository::new(state.pool());

    let part_count = parts.count().await?;
    let average_price = parts.average_price().await?;
    let user_count = users.count().await?;
    let admin_count = users.count_admins().await?;
    let order_count = orders.count().await?;
    let total_value = orders.total_value().await?;
    let status_counts = orders.count_by_status().await?;

    let orders_per_user = Decimal::from(order_count)
        .checked_div(Decimal::from(user_count))
        .map(|v| v.round_dp(1));

    let mut recent_orders = orders.list_all().await?;
    recent_orders.truncate(RECENT_ORDERS);

    Ok(DashboardTemplate {
        user: Some(user),
        part_count,
        average_price,
        user_count,
        admin_count,
        order_count,
        orders_per_user,
        total_value,
        status_counts,
        recent_orders,
    })
}

// =============================================================================
// User overview
// =============================================================================

/// Display every registered account, newest first.
#[instrument(skip(state, user))]
pub async fn users_index(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
) -> Result<AdminUsersTemplate> {
    let users = UserRepository::new(state.pool()).list_all().await?;

    Ok(AdminUsersTemplate {
        user: Some(user),
        users,
    })
}

// =============================================================================
// Catalog management
// =============================================================================

/// Display the full catalog for management.
#[instrument(skip(state, user))]
pub async fn parts_index(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
) -> Result<AdminPartsTemplate> {
    let parts = PartRepository::new(state.pool())
        .list(&PartFilter::default())
        .await?;

    Ok(AdminPartsTemplate {
        user: Some(user),
        parts,
    })
}

/// Display the empty part form.
pub async fn new_part(
    RequireAdmin(user): RequireAdmin,
    Query(query): Query<MessageQuery>,
) -> PartFormTemplate {
    PartFormTemplate {
        user: Some(user),
        part: None,
        error: query.error,
    }
}

/// Handle the part form and create a catalog entry.
#[instrument(skip(state, user, multipart))]
pub async fn create_part(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    multipart: Multipart,
) -> Result<Response> {
    let form = match read_part_form(multipart).await {
        Ok(form) => form,
        Err(code) => return Ok(form_error("/admin/parts/new", code)),
    };
    let (mut input, image, _) = match form.into_input() {
        Ok(parts) => parts,
        Err(code) => return Ok(form_error("/admin/parts/new", code)),
    };

    // The part is worth keeping even when the photo write fails.
    if let Some((extension, bytes)) = image {
        match save_image(&state, &extension, &bytes).await {
            Ok(url) => input.image_url = Some(url),
            Err(e) => tracing::warn!(error = %e, "image not saved, creating part without it"),
        }
    }

    let part = PartRepository::new(state.pool()).create(&input).await?;
    add_breadcrumb("admin", &format!("part {} created", part.id));
    tracing::info!(part_id = %part.id, name = %part.name, admin = %user.email, "part created");

    Ok(Redirect::to("/admin/parts").into_response())
}

/// Display the part form prefilled for editing.
#[instrument(skip(state, user))]
pub async fn edit_part(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<PartId>,
    Query(query): Query<MessageQuery>,
) -> Result<PartFormTemplate> {
    let part = PartRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("part {id}")))?;

    Ok(PartFormTemplate {
        user: Some(user),
        part: Some(part),
        error: query.error,
    })
}

/// Handle the part form and update a catalog entry.
///
/// Without a new photo the existing one is kept, unless the form asked for
/// its removal. A replaced or removed photo's file is deleted best-effort.
#[instrument(skip(state, user, multipart))]
pub async fn update_part(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<PartId>,
    multipart: Multipart,
) -> Result<Response> {
    let edit_url = format!("/admin/parts/{id}/edit");
    let form = match read_part_form(multipart).await {
        Ok(form) => form,
        Err(code) => return Ok(form_error(&edit_url, code)),
    };
    let (mut input, image, remove_image) = match form.into_input() {
        Ok(parts) => parts,
        Err(code) => return Ok(form_error(&edit_url, code)),
    };

    let repo = PartRepository::new(state.pool());
    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("part {id}")))?;

    input.image_url = match image {
        Some((extension, bytes)) => match save_image(&state, &extension, &bytes).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, "image not saved, keeping the previous one");
                existing.image_url.clone()
            }
        },
        None if remove_image => None,
        None => existing.image_url.clone(),
    };

    let part = repo.update(id, &input).await?;
    if existing.image_url != part.image_url
        && let Some(old) = existing.image_url
    {
        delete_image(&state, &old).await;
    }

    add_breadcrumb("admin", &format!("part {id} updated"));
    tracing::info!(part_id = %id, admin = %user.email, "part updated");
    Ok(Redirect::to("/admin/parts").into_response())
}

/// Delete a part and its photo.
///
/// Cached collections keep their snapshot of the part; only new cart adds
/// notice it is gone.
#[instrument(skip(state, user))]
pub async fn delete_part(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<PartId>,
) -> Result<Response> {
    let repo = PartRepository::new(state.pool());
    let part = repo.get(id).await?;

    match repo.delete(id).await {
        Ok(()) => {
            if let Some(Some(url)) = part.map(|p| p.image_url) {
                delete_image(&state, &url).await;
            }
            add_breadcrumb("admin", &format!("part {id} deleted"));
            tracing::info!(part_id = %id, admin = %user.email, "part deleted");
        }
        // Already gone; the list the admin is sent back to says so.
        Err(RepositoryError::NotFound) => {}
        Err(e) => return Err(AppError::Database(e)),
    }

    Ok(Redirect::to("/admin/parts").into_response())
}

// =============================================================================
// Order administration
// =============================================================================

/// Set an order's status and return to its page.
#[instrument(skip(state, user, form))]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let order = OrderRepository::new(state.pool())
        .update_status(id, form.status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("order {id}")),
            other => AppError::Database(other),
        })?;

    tracing::info!(
        order_id = %order.id,
        status = %order.status.as_str(),
        admin = %user.email,
        "order status updated"
    );
    Ok(Redirect::to(&format!("/orders/{id}")).into_response())
}

// =============================================================================
// Multipart plumbing
// =============================================================================

/// Read the part form's multipart body into [`PartFormData`].
///
/// Returns the query code for the first rejected field.
async fn read_part_form(
    mut multipart: Multipart,
) -> std::result::Result<PartFormData, &'static str> {
    let mut data = PartFormData::default();

    while let Some(field) = multipart.next_field().await.map_err(|_| "bad_form")? {
        match field.name() {
            Some("name") => data.name = field.text().await.map_err(|_| "bad_form")?,
            Some("category") => data.category = field.text().await.map_err(|_| "bad_form")?,
            Some("brand") => data.brand = field.text().await.map_err(|_| "bad_form")?,
            Some("price") => {
                let raw = field.text().await.map_err(|_| "bad_form")?;
                data.price = raw.trim().parse().ok();
                if data.price.is_none() {
                    return Err("invalid_price");
                }
            }
            Some("description") => data.description = field.text().await.map_err(|_| "bad_form")?,
            Some("remove_image") => {
                data.remove_image = field.text().await.map_err(|_| "bad_form")? == "1";
            }
            Some("image") => {
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(|_| "image_size")?;
                if bytes.is_empty() {
                    // File input submitted without a selection.
                    continue;
                }
                let Some(content_type) =
                    content_type.filter(|ct| ct.starts_with("image/"))
                else {
                    return Err("image_type");
                };
                if bytes.len() > MAX_IMAGE_BYTES {
                    return Err("image_size");
                }
                data.image = Some((image_extension(&content_type), bytes));
            }
            _ => {}
        }
    }

    Ok(data)
}

/// File extension for an `image/*` content type: `image/svg+xml` becomes
/// `svg`, `image/jpeg` stays `jpeg`.
fn image_extension(content_type: &str) -> String {
    let subtype = content_type.split('/').nth(1).unwrap_or("bin");
    let subtype = subtype.split('+').next().unwrap_or(subtype);
    let cleaned: String = subtype
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(8)
        .collect();
    if cleaned.is_empty() { "bin".to_owned() } else { cleaned }
}

/// Write an uploaded photo under the upload directory, returning its URL.
async fn save_image(
    state: &AppState,
    extension: &str,
    bytes: &[u8],
) -> std::result::Result<String, std::io::Error> {
    let filename = format!("{}.{extension}", Uuid::new_v4());
    let dir = &state.config().upload_dir;
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(&filename), bytes).await?;
    Ok(format!("/uploads/{filename}"))
}

/// Best-effort removal of a stored photo by its `/uploads/...` URL.
async fn delete_image(state: &AppState, url: &str) {
    let Some(filename) = url.strip_prefix("/uploads/") else {
        return;
    };
    // Only plain filenames we generated; anything else is left alone.
    if filename.contains('/') || filename.contains("..") {
        return;
    }
    let path = state.config().upload_dir.join(filename);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!(path = %path.display(), error = %e, "stored image not removed");
    }
}

fn form_error(base: &str, code: &str) -> Response {
    Redirect::to(&format!("{base}?error={code}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension_from_content_type() {
        assert_eq!(image_extension("image/jpeg"), "jpeg");
        assert_eq!(image_extension("image/png"), "png");
        assert_eq!(image_extension("image/svg+xml"), "svg");
        assert_eq!(image_extension("image/"), "bin");
    }

    #[test]
    fn test_part_form_validation_order() {
        let form = PartFormData {
            name: "  ".into(),
            category: "Motor".into(),
            brand: "Bosch".into(),
            price: Some(Decimal::new(4500, 0)),
            ..PartFormData::default()
        };
        assert_eq!(form.into_input().unwrap_err(), "missing_field");

        let form = PartFormData {
            name: "Olajszűrő".into(),
            category: "Motor".into(),
            brand: "Bosch".into(),
            price: Some(Decimal::new(-1, 0)),
            ..PartFormData::default()
        };
        assert_eq!(form.into_input().unwrap_err(), "invalid_price");
    }

    #[test]
    fn test_part_form_blank_description_becomes_none() {
        let form = PartFormData {
            name: "Olajszűrő".into(),
            category: "Motor".into(),
            brand: "Mann-Filter".into(),
            price: Some(Decimal::new(4500, 0)),
            description: "   ".into(),
            ..PartFormData::default()
        };
        let (input, _, _) = form.into_input().unwrap();
        assert!(input.description.is_none());
        assert!(input.image_url.is_none());
    }
}
