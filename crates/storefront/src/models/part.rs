//! Catalog part types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use pitstop_core::PartId;

/// A catalog part (domain type).
#[derive(Debug, Clone, FromRow)]
pub struct Part {
    /// Unique part ID.
    pub id: PartId,
    /// Display name, e.g. "Féktárcsa készlet".
    pub name: String,
    /// Category, e.g. "Fékrendszer".
    pub category: String,
    /// Manufacturer, e.g. "Bosch".
    pub brand: String,
    /// Gross price in forints.
    pub price: Decimal,
    /// Optional free-text description.
    pub description: Option<String>,
    /// URL of the product photo, if one was uploaded.
    pub image_url: Option<String>,
    /// When the part was created.
    pub created_at: DateTime<Utc>,
    /// When the part was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The slice of a part that cart and compare collections snapshot.
///
/// Cached collections survive catalog edits, so they carry a copy of the
/// display fields rather than a bare ID. Serialized into storage slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSummary {
    pub id: PartId,
    pub name: String,
    pub category: String,
    pub brand: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl From<&Part> for PartSummary {
    fn from(part: &Part) -> Self {
        Self {
            id: part.id,
            name: part.name.clone(),
            category: part.category.clone(),
            brand: part.brand.clone(),
            price: part.price,
            image_url: part.image_url.clone(),
            description: part.description.clone(),
        }
    }
}

/// Validated input for creating or updating a part.
#[derive(Debug, Clone)]
pub struct PartInput {
    pub name: String,
    pub category: String,
    pub brand: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Sort orders for the parts listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartSort {
    /// Cheapest first (the listing default).
    #[default]
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl PartSort {
    /// The query-parameter value for this sort order.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
        }
    }

    /// Parse a query-parameter value, falling back to the default.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("price_desc") => Self::PriceDesc,
            Some("name_asc") => Self::NameAsc,
            Some("name_desc") => Self::NameDesc,
            _ => Self::PriceAsc,
        }
    }
}

/// Filter criteria for the parts listing, built from URL query parameters.
#[derive(Debug, Clone, Default)]
pub struct PartFilter {
    /// Free-text search over name and description.
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub sort: PartSort,
}

impl PartFilter {
    /// True when no criterion is set and the full catalog is shown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.category.is_none() && self.brand.is_none()
    }

    /// Whether `category` is the selected category filter.
    #[must_use]
    pub fn has_category(&self, category: &str) -> bool {
        self.category.as_deref() == Some(category)
    }

    /// Whether `brand` is the selected brand filter.
    #[must_use]
    pub fn has_brand(&self, brand: &str) -> bool {
        self.brand.as_deref() == Some(brand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_param_roundtrip() {
        for sort in [
            PartSort::PriceAsc,
            PartSort::PriceDesc,
            PartSort::NameAsc,
            PartSort::NameDesc,
        ] {
            assert_eq!(PartSort::from_param(Some(sort.as_str())), sort);
        }
    }

    #[test]
    fn test_sort_unknown_param_falls_back_to_default() {
        assert_eq!(PartSort::from_param(Some("rating")), PartSort::PriceAsc);
        assert_eq!(PartSort::from_param(None), PartSort::PriceAsc);
    }

    #[test]
    fn test_filter_is_empty() {
        assert!(PartFilter::default().is_empty());
        let filter = PartFilter {
            category: Some("Fékrendszer".into()),
            ..PartFilter::default()
        };
        assert!(!filter.is_empty());
    }
}
