//! Repository for the `venues` table.

use gigboard_core::normalize::match_key;
use gigboard_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::venue::{CreateVenue, Venue};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, name_key, city, state, is_verified, created_at, updated_at";

pub struct VenueRepo;

impl VenueRepo {
    /// Insert a venue, deriving `name_key` from the display name.
    pub async fn create<'e, E>(executor: E, input: &CreateVenue) -> Result<Venue, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO venues (name, name_key, city, state, is_verified)
             VALUES ($1, $2, $3, $4, COALESCE($5, false))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Venue>(&query)
            .bind(input.name.trim())
            .bind(match_key(&input.name))
            .bind(input.city.trim())
            .bind(input.state.trim())
            .bind(input.is_verified)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Venue>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM venues WHERE id = $1");
        sqlx::query_as::<_, Venue>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// All venues with the given match key, any location, lowest id first.
    pub async fn find_by_name_key<'e, E>(
        executor: E,
        name_key: &str,
    ) -> Result<Vec<Venue>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM venues WHERE name_key = $1 ORDER BY id");
        sqlx::query_as::<_, Venue>(&query)
            .bind(name_key)
            .fetch_all(executor)
            .await
    }

    /// Mark every venue linked to a show as verified. Returns rows changed.
    pub async fn verify_for_show<'e, E>(executor: E, show_id: DbId) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE venues SET is_verified = true
             WHERE is_verified = false
               AND id IN (SELECT venue_id FROM show_venues WHERE show_id = $1)",
        )
        .bind(show_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Whether a show has at least one venue and all of them are verified.
    pub async fn all_verified_for_show<'e, E>(
        executor: E,
        show_id: DbId,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (total, verified): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE v.is_verified)
             FROM show_venues sv
             JOIN venues v ON v.id = sv.venue_id
             WHERE sv.show_id = $1",
        )
        .bind(show_id)
        .fetch_one(executor)
        .await?;
        Ok(total > 0 && total == verified)
    }
}
