//! Repository for the `shows` table and its `show_venues` / `show_artists`
//! join rows.

use gigboard_core::catalog::RejectedShow;
use gigboard_core::review::ShowStatus;
use gigboard_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgExecutor};

use crate::models::show::{CreateShow, Show, ShowArtistLink, ShowVenueLink, ShowWithRelations};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, event_date, city, state, price, age_requirement, description, \
    image_url, ticket_url, doors_time, show_time, status_id, source, source_venue, \
    source_event_id, rejection_reason, created_at, updated_at";

/// Name of the provenance uniqueness constraint.
pub const SOURCE_EVENT_CONSTRAINT: &str = "uq_shows_source_event";

pub struct ShowRepo;

impl ShowRepo {
    /// Insert a show. Fails with a unique violation on
    /// [`SOURCE_EVENT_CONSTRAINT`] if the provenance key is already taken.
    pub async fn create<'e, E>(executor: E, input: &CreateShow) -> Result<Show, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO shows
                (title, event_date, city, state, price, age_requirement, description,
                 image_url, ticket_url, doors_time, show_time, status_id, source,
                 source_venue, source_event_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Show>(&query)
            .bind(&input.title)
            .bind(input.event_date)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.price)
            .bind(&input.age_requirement)
            .bind(&input.description)
            .bind(&input.image_url)
            .bind(&input.ticket_url)
            .bind(&input.doors_time)
            .bind(&input.show_time)
            .bind(input.status.id())
            .bind(input.source.as_str())
            .bind(&input.source_venue)
            .bind(&input.source_event_id)
            .fetch_one(executor)
            .await
    }

    pub async fn link_venue<'e, E>(
        executor: E,
        show_id: DbId,
        venue_id: DbId,
        position: i32,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("INSERT INTO show_venues (show_id, venue_id, position) VALUES ($1, $2, $3)")
            .bind(show_id)
            .bind(venue_id)
            .bind(position)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn link_artist<'e, E>(
        executor: E,
        show_id: DbId,
        artist_id: DbId,
        position: i32,
        set_type: &str,
        is_headliner: bool,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            "INSERT INTO show_artists (show_id, artist_id, position, set_type, is_headliner)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(show_id)
        .bind(artist_id)
        .bind(position)
        .bind(set_type)
        .bind(is_headliner)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Show>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM shows WHERE id = $1");
        sqlx::query_as::<_, Show>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a show and lock its row for the rest of the transaction.
    pub async fn find_by_id_for_update<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Show>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM shows WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Show>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find the show carrying a provenance key.
    pub async fn find_by_source<'e, E>(
        executor: E,
        source_venue: &str,
        source_event_id: &str,
    ) -> Result<Option<Show>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM shows WHERE source_venue = $1 AND source_event_id = $2"
        );
        sqlx::query_as::<_, Show>(&query)
            .bind(source_venue)
            .bind(source_event_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn count_by_source<'e, E>(
        executor: E,
        source_venue: &str,
        source_event_id: &str,
    ) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM shows WHERE source_venue = $1 AND source_event_id = $2",
        )
        .bind(source_venue)
        .bind(source_event_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// Rejected shows linked to `venue_id` with `from <= event_date < until`.
    pub async fn rejected_at_venue<'e, E>(
        executor: E,
        venue_id: DbId,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<RejectedShow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows: Vec<(DbId, String, Timestamp, Option<String>)> = sqlx::query_as(
            "SELECT s.id, s.title, s.event_date, s.rejection_reason
             FROM shows s
             JOIN show_venues sv ON sv.show_id = s.id
             WHERE sv.venue_id = $1
               AND s.status_id = $2
               AND s.event_date >= $3
               AND s.event_date < $4
             ORDER BY s.id",
        )
        .bind(venue_id)
        .bind(ShowStatus::Rejected.id())
        .bind(from)
        .bind(until)
        .fetch_all(executor)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, title, event_date, rejection_reason)| RejectedShow {
                id,
                venue_id,
                title,
                event_date,
                rejection_reason,
            })
            .collect())
    }

    pub async fn venues_for_show<'e, E>(
        executor: E,
        show_id: DbId,
    ) -> Result<Vec<ShowVenueLink>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ShowVenueLink>(
            "SELECT sv.venue_id, v.name, v.city, v.state, v.is_verified, sv.position
             FROM show_venues sv
             JOIN venues v ON v.id = sv.venue_id
             WHERE sv.show_id = $1
             ORDER BY sv.position, sv.id",
        )
        .bind(show_id)
        .fetch_all(executor)
        .await
    }

    pub async fn artists_for_show<'e, E>(
        executor: E,
        show_id: DbId,
    ) -> Result<Vec<ShowArtistLink>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ShowArtistLink>(
            "SELECT sa.artist_id, a.name, sa.position, sa.set_type, sa.is_headliner
             FROM show_artists sa
             JOIN artists a ON a.id = sa.artist_id
             WHERE sa.show_id = $1
             ORDER BY sa.position, sa.id",
        )
        .bind(show_id)
        .fetch_all(executor)
        .await
    }

    /// Find a show with its venue and artist links.
    pub async fn find_with_relations(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ShowWithRelations>, sqlx::Error> {
        let Some(show) = Self::find_by_id(&mut *conn, id).await? else {
            return Ok(None);
        };
        let venues = Self::venues_for_show(&mut *conn, id).await?;
        let artists = Self::artists_for_show(&mut *conn, id).await?;
        let status = show.status().map(|s| s.as_str()).unwrap_or("unknown");
        Ok(Some(ShowWithRelations {
            show,
            status,
            venues,
            artists,
        }))
    }

    /// Move a show from `expected` to `next`.
    ///
    /// The update only applies while the row still has status `expected`, so
    /// two reviewers acting on the same show cannot both succeed. Returns
    /// `None` when the row is missing or its status changed underneath.
    /// A reason is written when given and cleared when leaving `rejected`.
    pub async fn update_status<'e, E>(
        executor: E,
        id: DbId,
        expected: ShowStatus,
        next: ShowStatus,
        rejection_reason: Option<&str>,
    ) -> Result<Option<Show>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE shows SET
                status_id = $3,
                rejection_reason = CASE WHEN $3 = $5 THEN COALESCE($4, rejection_reason) ELSE NULL END
             WHERE id = $1 AND status_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Show>(&query)
            .bind(id)
            .bind(expected.id())
            .bind(next.id())
            .bind(rejection_reason)
            .bind(ShowStatus::Rejected.id())
            .fetch_optional(executor)
            .await
    }
}
