//! Venue entity model and DTOs.

use gigboard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `venues` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Venue {
    pub id: DbId,
    pub name: String,
    /// Normalized match key, see `gigboard_core::normalize`.
    pub name_key: String,
    pub city: String,
    pub state: String,
    pub is_verified: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a venue. `name_key` is derived from `name` on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVenue {
    pub name: String,
    pub city: String,
    pub state: String,
    /// Defaults to `false` if omitted.
    pub is_verified: Option<bool>,
}
