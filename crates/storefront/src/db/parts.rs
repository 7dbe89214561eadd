//! Part repository for catalog database operations.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use pitstop_core::PartId;

use super::RepositoryError;
use crate::models::part::{Part, PartFilter, PartInput, PartSort};

/// Column list shared by every part query.
const PART_COLUMNS: &str =
    "id, name, category, brand, price, description, image_url, created_at, updated_at";

/// Repository for catalog database operations.
pub struct PartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PartRepository<'a> {
    /// Create a new part repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List parts matching `filter`, in its sort order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &PartFilter) -> Result<Vec<Part>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PART_COLUMNS} FROM parts WHERE TRUE"
        ));

        if let Some(search) = filter.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            let pattern = format!("%{search}%");
            query.push(" AND (name ILIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR description ILIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
        if let Some(category) = filter.category.as_deref() {
            query.push(" AND category = ");
            query.push_bind(category.to_owned());
        }
        if let Some(brand) = filter.brand.as_deref() {
            query.push(" AND brand = ");
            query.push_bind(brand.to_owned());
        }

        query.push(match filter.sort {
            PartSort::PriceAsc => " ORDER BY price ASC, name ASC",
            PartSort::PriceDesc => " ORDER BY price DESC, name ASC",
            PartSort::NameAsc => " ORDER BY name ASC",
            PartSort::NameDesc => " ORDER BY name DESC",
        });

        let parts = query.build_query_as::<Part>().fetch_all(self.pool).await?;
        Ok(parts)
    }

    /// The most expensive parts, for the home page showcase.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Part>, RepositoryError> {
        let parts = sqlx::query_as::<_, Part>(&format!(
            "SELECT {PART_COLUMNS} FROM parts ORDER BY price DESC, name ASC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(parts)
    }

    /// Get a part by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PartId) -> Result<Option<Part>, RepositoryError> {
        let part = sqlx::query_as::<_, Part>(&format!(
            "SELECT {PART_COLUMNS} FROM parts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(part)
    }

    /// Create a new part.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &PartInput) -> Result<Part, RepositoryError> {
        let part = sqlx::query_as::<_, Part>(&format!(
            r"
            INSERT INTO parts (name, category, brand, price, description, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PART_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.category)
        .bind(&input.brand)
        .bind(input.price)
        .bind(&input.description)
        .bind(&input.image_url)
        .fetch_one(self.pool)
        .await?;

        Ok(part)
    }

    /// Update an existing part.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the part doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, id: PartId, input: &PartInput) -> Result<Part, RepositoryError> {
        let part = sqlx::query_as::<_, Part>(&format!(
            r"
            UPDATE parts
            SET name = $2, category = $3, brand = $4, price = $5,
                description = $6, image_url = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {PART_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.category)
        .bind(&input.brand)
        .bind(input.price)
        .bind(&input.description)
        .bind(&input.image_url)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(part)
    }

    /// Delete a part by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the part doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: PartId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM parts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Distinct categories in the catalog, for the filter dropdown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM parts ORDER BY category ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Distinct brands in the catalog, for the filter dropdown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn brands(&self) -> Result<Vec<String>, RepositoryError> {
        let brands = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT brand FROM parts ORDER BY brand ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(brands)
    }

    /// Number of parts in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM parts")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Average gross price across the catalog, `None` when it is empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn average_price(&self) -> Result<Option<Decimal>, RepositoryError> {
        let average = sqlx::query_scalar::<_, Option<Decimal>>("SELECT AVG(price) FROM parts")
            .fetch_one(self.pool)
            .await?;

        Ok(average)
    }
}
