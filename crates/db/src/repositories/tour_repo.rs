//! Repository for the `tours` table.

use sqlx::types::Json;
use sqlx::PgPool;
use kitasuro_core::tour_form::ValidatedTour;
use kitasuro_core::types::DbId;

use crate::models::tour::Tour;

const COLUMNS: &str = "id, organization_id, name, overview, price, tags, days, \
    created_by, created_at, updated_at";

/// Provides CRUD operations for tour templates.
pub struct TourRepo;

impl TourRepo {
    pub async fn create(
        pool: &PgPool,
        organization_id: DbId,
        created_by: DbId,
        tour: &ValidatedTour,
    ) -> Result<Tour, sqlx::Error> {
        let query = format!(
            "INSERT INTO tours (organization_id, name, overview, price, tags, days, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tour>(&query)
            .bind(organization_id)
            .bind(&tour.name)
            .bind(&tour.overview)
            .bind(tour.price)
            .bind(&tour.tags)
            .bind(Json(&tour.days))
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
    ) -> Result<Option<Tour>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tours WHERE id = $1 AND organization_id = $2");
        sqlx::query_as::<_, Tour>(&query)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, organization_id: DbId) -> Result<Vec<Tour>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tours WHERE organization_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Tour>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    /// Replace a tour with a freshly validated form.
    pub async fn update(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
        tour: &ValidatedTour,
    ) -> Result<Option<Tour>, sqlx::Error> {
        let query = format!(
            "UPDATE tours SET name = $3, overview = $4, price = $5, tags = $6, days = $7
             WHERE id = $1 AND organization_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tour>(&query)
            .bind(id)
            .bind(organization_id)
            .bind(&tour.name)
            .bind(&tour.overview)
            .bind(tour.price)
            .bind(&tour.tags)
            .bind(Json(&tour.days))
            .fetch_optional(pool)
            .await
    }

    /// Delete a tour. Proposals cloned from it keep their own copy.
    pub async fn delete(pool: &PgPool, organization_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tours WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_for_organization(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tours WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_one(pool)
            .await
    }
}
