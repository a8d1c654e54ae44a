//! Postgres implementation of [`CatalogLookup`].
//!
//! Borrows a single connection so the same lookups run against a pooled
//! connection for previews and against an open transaction for commits.

use async_trait::async_trait;
use gigboard_core::catalog::{
    ArtistCandidate, CatalogLookup, ImportedShow, RejectedShow, VenueCandidate,
};
use gigboard_core::types::{DbId, Timestamp};
use sqlx::PgConnection;

use crate::models::status::decode_status;
use crate::repositories::{ArtistRepo, ShowRepo, VenueRepo};

pub struct PgCatalog<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgCatalog<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CatalogLookup for PgCatalog<'_> {
    type Error = sqlx::Error;

    async fn venues_by_key(&mut self, name_key: &str) -> Result<Vec<VenueCandidate>, sqlx::Error> {
        let venues = VenueRepo::find_by_name_key(&mut *self.conn, name_key).await?;
        Ok(venues
            .into_iter()
            .map(|v| VenueCandidate {
                id: v.id,
                name: v.name,
                city: v.city,
                state: v.state,
                is_verified: v.is_verified,
            })
            .collect())
    }

    async fn artists_by_key(&mut self, name_key: &str) -> Result<Vec<ArtistCandidate>, sqlx::Error> {
        let artists = ArtistRepo::find_by_name_key(&mut *self.conn, name_key).await?;
        Ok(artists
            .into_iter()
            .map(|a| ArtistCandidate {
                id: a.id,
                name: a.name,
            })
            .collect())
    }

    async fn show_by_source(
        &mut self,
        source_venue: &str,
        source_event_id: &str,
    ) -> Result<Option<ImportedShow>, sqlx::Error> {
        let show = ShowRepo::find_by_source(&mut *self.conn, source_venue, source_event_id).await?;
        show.map(|s| {
            Ok(ImportedShow {
                id: s.id,
                status: decode_status(s.status_id)?,
            })
        })
        .transpose()
    }

    async fn rejected_shows_at_venue(
        &mut self,
        venue_id: DbId,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<RejectedShow>, sqlx::Error> {
        ShowRepo::rejected_at_venue(&mut *self.conn, venue_id, from, until).await
    }
}
