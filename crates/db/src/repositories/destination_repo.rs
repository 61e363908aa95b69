//! Repository for the `destinations` table.

use sqlx::PgPool;
use kitasuro_core::types::DbId;

use crate::models::destination::{CreateDestination, Destination};

const COLUMNS: &str = "id, organization_id, name, kind, created_at, updated_at";

/// Default kind when none is given.
const DEFAULT_KIND: &str = "park";

/// Provides CRUD and search for destinations.
pub struct DestinationRepo;

impl DestinationRepo {
    /// Insert a destination. Names are unique per organization
    /// (`uq_destinations_org_name`).
    pub async fn create(
        pool: &PgPool,
        organization_id: DbId,
        input: &CreateDestination,
    ) -> Result<Destination, sqlx::Error> {
        let query = format!(
            "INSERT INTO destinations (organization_id, name, kind)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Destination>(&query)
            .bind(organization_id)
            .bind(input.name.trim())
            .bind(input.kind.as_deref().unwrap_or(DEFAULT_KIND))
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool, organization_id: DbId) -> Result<Vec<Destination>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM destinations WHERE organization_id = $1 ORDER BY name"
        );
        sqlx::query_as::<_, Destination>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    /// Of `ids`, those that do not name a destination of this organization.
    pub async fn foreign_ids(
        pool: &PgPool,
        organization_id: DbId,
        ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, DbId>(
            "SELECT requested.id
             FROM UNNEST($2::BIGINT[]) AS requested(id)
             WHERE NOT EXISTS (
                 SELECT 1 FROM destinations d
                 WHERE d.id = requested.id AND d.organization_id = $1
             )
             ORDER BY requested.id",
        )
        .bind(organization_id)
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Case-insensitive prefix search on name.
    pub async fn search(
        pool: &PgPool,
        organization_id: DbId,
        prefix: &str,
        limit: i64,
    ) -> Result<Vec<Destination>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM destinations
             WHERE organization_id = $1 AND LOWER(name) LIKE LOWER($2) ESCAPE '\\'
             ORDER BY name
             LIMIT $3"
        );
        sqlx::query_as::<_, Destination>(&query)
            .bind(organization_id)
            .bind(format!("{}%", escape_like(prefix.trim())))
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("Serengeti"), "Serengeti");
    }
}
