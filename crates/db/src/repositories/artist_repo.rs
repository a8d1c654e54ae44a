//! Repository for the `artists` table.

use gigboard_core::normalize::match_key;
use gigboard_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::artist::{Artist, CreateArtist};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, name_key, created_at, updated_at";

pub struct ArtistRepo;

impl ArtistRepo {
    /// Insert an artist, deriving `name_key` from the display name.
    pub async fn create<'e, E>(executor: E, input: &CreateArtist) -> Result<Artist, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO artists (name, name_key)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Artist>(&query)
            .bind(input.name.trim())
            .bind(match_key(&input.name))
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Artist>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM artists WHERE id = $1");
        sqlx::query_as::<_, Artist>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// All artists with the given match key, lowest id first.
    pub async fn find_by_name_key<'e, E>(
        executor: E,
        name_key: &str,
    ) -> Result<Vec<Artist>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM artists WHERE name_key = $1 ORDER BY id");
        sqlx::query_as::<_, Artist>(&query)
            .bind(name_key)
            .fetch_all(executor)
            .await
    }
}
