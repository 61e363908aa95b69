//! Repository for the proposal itinerary tree:
//! `proposal_days` -> (`day_activities`, `day_accommodations`), plus
//! `proposal_pricing_rows` and `proposal_extras`.
//!
//! The tree is always written whole. A save deletes the proposal's days and
//! pricing and inserts the new ones inside one transaction guarded by the
//! proposal version.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};
use kitasuro_core::itinerary::{
    AccommodationRef, Activity, Day, DestinationRef, ItineraryData, Meals, Moment,
};
use kitasuro_core::pricing::{Extra, PricingRow};
use kitasuro_core::types::DbId;

use crate::models::itinerary::{AccommodationRow, ActivityRow, DayRow, ExtraRow, PricingRowRow};
use crate::models::proposal::Proposal;

/// Provides whole-tree reads and writes of a proposal itinerary.
pub struct ItineraryRepo;

impl ItineraryRepo {
    /// Load the full itinerary of a proposal, days in `day_number` order.
    pub async fn load(pool: &PgPool, proposal: &Proposal) -> Result<ItineraryData, sqlx::Error> {
        let day_rows = sqlx::query_as::<_, DayRow>(
            "SELECT pd.id, pd.day_number, pd.title, pd.description, pd.destination_id,
                    COALESCE(d.name, pd.destination_name) AS destination_name,
                    pd.breakfast, pd.lunch, pd.dinner
             FROM proposal_days pd
             LEFT JOIN destinations d
                    ON d.id = pd.destination_id AND d.organization_id = $2
             WHERE pd.proposal_id = $1
             ORDER BY pd.day_number",
        )
        .bind(proposal.id)
        .bind(proposal.organization_id)
        .fetch_all(pool)
        .await?;

        let activity_rows = sqlx::query_as::<_, ActivityRow>(
            "SELECT a.day_id, a.name, a.moment, a.is_optional, a.description
             FROM day_activities a
             JOIN proposal_days pd ON pd.id = a.day_id
             WHERE pd.proposal_id = $1
             ORDER BY a.day_id, a.sort_order, a.id",
        )
        .bind(proposal.id)
        .fetch_all(pool)
        .await?;

        let accommodation_rows = sqlx::query_as::<_, AccommodationRow>(
            "SELECT a.day_id, a.name
             FROM day_accommodations a
             JOIN proposal_days pd ON pd.id = a.day_id
             WHERE pd.proposal_id = $1
             ORDER BY a.day_id, a.sort_order, a.id",
        )
        .bind(proposal.id)
        .fetch_all(pool)
        .await?;

        let pricing_rows = sqlx::query_as::<_, PricingRowRow>(
            "SELECT traveler_type, unit_price, count FROM proposal_pricing_rows
             WHERE proposal_id = $1 ORDER BY sort_order, id",
        )
        .bind(proposal.id)
        .fetch_all(pool)
        .await?;

        let extras = sqlx::query_as::<_, ExtraRow>(
            "SELECT name, price, selected FROM proposal_extras
             WHERE proposal_id = $1 ORDER BY sort_order, id",
        )
        .bind(proposal.id)
        .fetch_all(pool)
        .await?;

        let mut activities: HashMap<DbId, Vec<Activity>> = HashMap::new();
        for row in activity_rows {
            let moment = Moment::from_str(&row.moment)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            activities.entry(row.day_id).or_default().push(Activity {
                name: row.name,
                moment,
                is_optional: row.is_optional,
                description: row.description,
            });
        }

        let mut accommodations: HashMap<DbId, Vec<AccommodationRef>> = HashMap::new();
        for row in accommodation_rows {
            accommodations
                .entry(row.day_id)
                .or_default()
                .push(AccommodationRef {
                    id: None,
                    name: row.name,
                });
        }

        let days = day_rows
            .into_iter()
            .map(|row| Day {
                day_number: row.day_number,
                title: row.title,
                description: row.description,
                destination: row.destination_name.map(|name| DestinationRef {
                    id: row.destination_id,
                    name,
                }),
                accommodations: accommodations.remove(&row.id).unwrap_or_default(),
                activities: activities.remove(&row.id).unwrap_or_default(),
                meals: Meals {
                    breakfast: row.breakfast,
                    lunch: row.lunch,
                    dinner: row.dinner,
                },
            })
            .collect();

        Ok(ItineraryData {
            title: proposal.title.clone(),
            client_name: proposal.client_name.clone(),
            days,
            pricing_rows: pricing_rows.into_iter().map(PricingRow::from).collect(),
            extras: extras.into_iter().map(Extra::from).collect(),
        })
    }

    /// Replace the itinerary of a proposal if `expected_version` is current
    /// and the proposal is not confirmed.
    ///
    /// Returns the new version, or `None` when the guard did not match (the
    /// caller decides between 404 and 409).
    pub async fn replace(
        pool: &PgPool,
        proposal_id: DbId,
        expected_version: i64,
        days: &[Day],
        pricing_rows: &[PricingRow],
        extras: &[Extra],
    ) -> Result<Option<i64>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let new_version: Option<i64> = sqlx::query_scalar(
            "UPDATE proposals SET version = version + 1
             WHERE id = $1 AND version = $2 AND status <> 'confirmed'
             RETURNING version",
        )
        .bind(proposal_id)
        .bind(expected_version)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(new_version) = new_version else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM proposal_days WHERE proposal_id = $1")
            .bind(proposal_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM proposal_pricing_rows WHERE proposal_id = $1")
            .bind(proposal_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM proposal_extras WHERE proposal_id = $1")
            .bind(proposal_id)
            .execute(&mut *tx)
            .await?;

        Self::insert_tree(&mut tx, proposal_id, days, pricing_rows, extras).await?;

        tx.commit().await?;
        Ok(Some(new_version))
    }

    /// Insert days, their children, pricing rows and extras for a proposal.
    ///
    /// Days are numbered by position; whatever `day_number` they carry is
    /// ignored.
    pub(crate) async fn insert_tree(
        tx: &mut Transaction<'_, Postgres>,
        proposal_id: DbId,
        days: &[Day],
        pricing_rows: &[PricingRow],
        extras: &[Extra],
    ) -> Result<(), sqlx::Error> {
        for (index, day) in days.iter().enumerate() {
            let day_number = index as i32 + 1;
            let day_id: DbId = sqlx::query_scalar(
                "INSERT INTO proposal_days
                    (proposal_id, day_number, title, description, destination_id,
                     destination_name, breakfast, lunch, dinner)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                 RETURNING id",
            )
            .bind(proposal_id)
            .bind(day_number)
            .bind(day.title.trim())
            .bind(&day.description)
            .bind(day.destination.as_ref().and_then(|d| d.id))
            .bind(day.destination.as_ref().map(|d| d.name.as_str()))
            .bind(day.meals.breakfast)
            .bind(day.meals.lunch)
            .bind(day.meals.dinner)
            .fetch_one(&mut **tx)
            .await?;

            for (order, activity) in day.activities.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO day_activities
                        (day_id, name, moment, is_optional, description, sort_order)
                     VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(day_id)
                .bind(&activity.name)
                .bind(activity.moment.as_str())
                .bind(activity.is_optional)
                .bind(&activity.description)
                .bind(order as i32)
                .execute(&mut **tx)
                .await?;
            }

            for (order, accommodation) in day.accommodations.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO day_accommodations (day_id, name, sort_order)
                     VALUES ($1, $2, $3)",
                )
                .bind(day_id)
                .bind(&accommodation.name)
                .bind(order as i32)
                .execute(&mut **tx)
                .await?;
            }
        }

        for (order, row) in pricing_rows.iter().enumerate() {
            sqlx::query(
                "INSERT INTO proposal_pricing_rows
                    (proposal_id, traveler_type, unit_price, count, sort_order)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(proposal_id)
            .bind(&row.traveler_type)
            .bind(row.unit_price)
            .bind(row.count)
            .bind(order as i32)
            .execute(&mut **tx)
            .await?;
        }

        for (order, extra) in extras.iter().enumerate() {
            sqlx::query(
                "INSERT INTO proposal_extras (proposal_id, name, price, selected, sort_order)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(proposal_id)
            .bind(&extra.name)
            .bind(extra.price)
            .bind(extra.selected)
            .bind(order as i32)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}
