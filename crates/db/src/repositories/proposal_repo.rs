//! Repository for the `proposals` table.
//!
//! Every mutation is guarded by the proposal version and/or status in the
//! `WHERE` clause. A guarded write that matches nothing returns `None`;
//! handlers re-read the row to tell "missing" from "stale".

use sqlx::PgPool;
use kitasuro_core::pricing::PricingRow;
use kitasuro_core::theme::ThemeId;
use kitasuro_core::types::DbId;
use uuid::Uuid;

use crate::models::proposal::{CreateProposal, Proposal, UpdateProposal};
use crate::models::tour::Tour;
use crate::repositories::ItineraryRepo;

const COLUMNS: &str = "id, organization_id, tour_id, title, client_name, theme, status, \
    version, share_token, shared_at, confirmed_by_name, confirmed_at, created_by, \
    created_at, updated_at";

/// Traveler type used for the single pricing row a tour clone starts with.
pub const CLONED_TRAVELER_TYPE: &str = "Per person";

/// Provides CRUD and lifecycle operations for proposals.
pub struct ProposalRepo;

impl ProposalRepo {
    /// Create an empty draft proposal with a fresh share token.
    pub async fn create(
        pool: &PgPool,
        organization_id: DbId,
        created_by: DbId,
        input: &CreateProposal,
    ) -> Result<Proposal, sqlx::Error> {
        let query = format!(
            "INSERT INTO proposals
                (organization_id, title, client_name, theme, share_token, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Proposal>(&query)
            .bind(organization_id)
            .bind(input.title.trim())
            .bind(&input.client_name)
            .bind(input.theme.unwrap_or_default().as_str())
            .bind(Uuid::new_v4())
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Create a draft proposal holding a deep copy of a tour's itinerary.
    ///
    /// The tour price becomes one pricing row with a count of 1.
    pub async fn create_from_tour(
        pool: &PgPool,
        created_by: DbId,
        tour: &Tour,
        title: &str,
        client_name: Option<&str>,
        theme: ThemeId,
    ) -> Result<Proposal, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO proposals
                (organization_id, tour_id, title, client_name, theme, share_token, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let proposal = sqlx::query_as::<_, Proposal>(&query)
            .bind(tour.organization_id)
            .bind(tour.id)
            .bind(title.trim())
            .bind(client_name)
            .bind(theme.as_str())
            .bind(Uuid::new_v4())
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        let pricing = [PricingRow {
            traveler_type: CLONED_TRAVELER_TYPE.to_string(),
            unit_price: tour.price,
            count: 1,
        }];
        ItineraryRepo::insert_tree(&mut tx, proposal.id, &tour.days.0, &pricing, &[]).await?;

        tx.commit().await?;
        Ok(proposal)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
    ) -> Result<Option<Proposal>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM proposals WHERE id = $1 AND organization_id = $2");
        sqlx::query_as::<_, Proposal>(&query)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }

    /// Look a proposal up by its public share token.
    pub async fn find_by_share_token(
        pool: &PgPool,
        token: Uuid,
    ) -> Result<Option<Proposal>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM proposals WHERE share_token = $1");
        sqlx::query_as::<_, Proposal>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, organization_id: DbId) -> Result<Vec<Proposal>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM proposals
             WHERE organization_id = $1
             ORDER BY updated_at DESC, id DESC"
        );
        sqlx::query_as::<_, Proposal>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    /// Update metadata if the version matches and the proposal is not
    /// confirmed. Bumps the version.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProposal,
    ) -> Result<Option<Proposal>, sqlx::Error> {
        let query = format!(
            "UPDATE proposals SET
                title = COALESCE($3, title),
                client_name = COALESCE($4, client_name),
                theme = COALESCE($5, theme),
                version = version + 1
             WHERE id = $1 AND version = $2 AND status <> 'confirmed'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Proposal>(&query)
            .bind(id)
            .bind(input.expected_version)
            .bind(input.title.as_deref().map(str::trim))
            .bind(&input.client_name)
            .bind(input.theme.map(|t| t.as_str()))
            .fetch_optional(pool)
            .await
    }

    /// `draft -> shared`.
    pub async fn mark_shared(
        pool: &PgPool,
        id: DbId,
        expected_version: i64,
    ) -> Result<Option<Proposal>, sqlx::Error> {
        let query = format!(
            "UPDATE proposals SET
                status = 'shared',
                shared_at = NOW(),
                version = version + 1
             WHERE id = $1 AND version = $2 AND status = 'draft'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Proposal>(&query)
            .bind(id)
            .bind(expected_version)
            .fetch_optional(pool)
            .await
    }

    /// `shared -> confirmed`, recording who confirmed.
    pub async fn confirm(
        pool: &PgPool,
        id: DbId,
        confirmed_by_name: &str,
    ) -> Result<Option<Proposal>, sqlx::Error> {
        let query = format!(
            "UPDATE proposals SET
                status = 'confirmed',
                confirmed_by_name = $2,
                confirmed_at = NOW(),
                version = version + 1
             WHERE id = $1 AND status = 'shared'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Proposal>(&query)
            .bind(id)
            .bind(confirmed_by_name.trim())
            .fetch_optional(pool)
            .await
    }

    /// Delete a draft proposal and, by cascade, its itinerary.
    ///
    /// Shared proposals are never deleted so client comments are kept.
    pub async fn delete_draft(
        pool: &PgPool,
        organization_id: DbId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM proposals WHERE id = $1 AND organization_id = $2 AND status = 'draft'",
        )
            .bind(id)
            .bind(organization_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
