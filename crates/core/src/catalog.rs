//! Read-only view of the show catalog used by resolution and dedup.
//!
//! The trait is implemented over a Postgres connection in `gigboard-db` and
//! over an in-memory arena in [`crate::memory`]. Every method is a pure read;
//! implementations must not write.

use async_trait::async_trait;
use serde::Serialize;

use crate::review::ShowStatus;
use crate::types::{DbId, Timestamp};

/// A venue row whose `name_key` matched a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueCandidate {
    pub id: DbId,
    pub name: String,
    pub city: String,
    pub state: String,
    pub is_verified: bool,
}

/// An artist row whose `name_key` matched a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistCandidate {
    pub id: DbId,
    pub name: String,
}

/// Minimal view of an already-imported show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedShow {
    pub id: DbId,
    pub status: ShowStatus,
}

/// A rejected show linked to a given venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedShow {
    pub id: DbId,
    pub venue_id: DbId,
    pub title: String,
    pub event_date: Timestamp,
    pub rejection_reason: Option<String>,
}

#[async_trait]
pub trait CatalogLookup: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Venues whose normalized name equals `name_key`, any location.
    async fn venues_by_key(&mut self, name_key: &str) -> Result<Vec<VenueCandidate>, Self::Error>;

    /// Artists whose normalized name equals `name_key`.
    async fn artists_by_key(&mut self, name_key: &str)
        -> Result<Vec<ArtistCandidate>, Self::Error>;

    /// The show carrying this provenance key, whatever its status.
    async fn show_by_source(
        &mut self,
        source_venue: &str,
        source_event_id: &str,
    ) -> Result<Option<ImportedShow>, Self::Error>;

    /// Rejected shows at `venue_id` with `from <= event_date < until`.
    async fn rejected_shows_at_venue(
        &mut self,
        venue_id: DbId,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<RejectedShow>, Self::Error>;
}
