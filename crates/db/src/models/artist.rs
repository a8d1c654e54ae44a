//! Artist entity model and DTOs.

use gigboard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `artists` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Artist {
    pub id: DbId,
    pub name: String,
    pub name_key: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an artist. `name_key` is derived from `name` on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateArtist {
    pub name: String,
}
