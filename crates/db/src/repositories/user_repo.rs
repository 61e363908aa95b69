//! Repository for the `users` table.

use sqlx::PgPool;
use kitasuro_core::roles::ROLE_STAFF;
use kitasuro_core::types::DbId;

use crate::models::user::{CreateUser, User};

const COLUMNS: &str = "id, organization_id, email, display_name, role, created_at, updated_at";

/// Provides CRUD operations for staff users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user. Fails with a `uq_users_email` violation on duplicate email.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (organization_id, email, display_name, role)
             VALUES ($1, LOWER($2), $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.organization_id)
            .bind(&input.email)
            .bind(&input.display_name)
            .bind(input.role.as_deref().unwrap_or(ROLE_STAFF))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_organization(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE organization_id = $1 ORDER BY display_name, id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }
}
