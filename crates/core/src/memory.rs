//! In-memory catalog arena.
//!
//! Entities live in flat vectors and refer to each other by id only, the same
//! shape as the relational schema. Used for isolated tests of the resolver,
//! guard and planner, and for offline dry runs against a synthetic catalog.

use std::convert::Infallible;

use async_trait::async_trait;

use crate::catalog::{ArtistCandidate, CatalogLookup, ImportedShow, RejectedShow, VenueCandidate};
use crate::matching::MatchResult;
use crate::normalize::match_key;
use crate::planner::ImportPlan;
use crate::review::ShowStatus;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone)]
struct VenueRow {
    id: DbId,
    name: String,
    name_key: String,
    city: String,
    state: String,
    is_verified: bool,
}

#[derive(Debug, Clone)]
struct ArtistRow {
    id: DbId,
    name: String,
    name_key: String,
}

#[derive(Debug, Clone)]
struct ShowRow {
    id: DbId,
    title: String,
    event_date: Timestamp,
    status: ShowStatus,
    source_venue: Option<String>,
    source_event_id: Option<String>,
    rejection_reason: Option<String>,
}

/// `(show_id, venue_id)` or `(show_id, artist_id)`.
type JoinRow = (DbId, DbId);

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    venues: Vec<VenueRow>,
    artists: Vec<ArtistRow>,
    shows: Vec<ShowRow>,
    show_venues: Vec<JoinRow>,
    show_artists: Vec<JoinRow>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_venue(&mut self, name: &str, city: &str, state: &str, is_verified: bool) -> DbId {
        let id = next_id(self.venues.iter().map(|v| v.id));
        self.add_venue_with_id(id, name, city, state, is_verified)
    }

    /// Insert a venue under a fixed id, as a seeded catalog would have it.
    pub fn add_venue_with_id(
        &mut self,
        id: DbId,
        name: &str,
        city: &str,
        state: &str,
        is_verified: bool,
    ) -> DbId {
        self.venues.push(VenueRow {
            id,
            name: name.to_string(),
            name_key: match_key(name),
            city: city.to_string(),
            state: state.to_string(),
            is_verified,
        });
        id
    }

    pub fn add_artist(&mut self, name: &str) -> DbId {
        let id = next_id(self.artists.iter().map(|a| a.id));
        self.artists.push(ArtistRow {
            id,
            name: name.to_string(),
            name_key: match_key(name),
        });
        id
    }

    pub fn add_show(
        &mut self,
        title: &str,
        event_date: Timestamp,
        status: ShowStatus,
        source: Option<(&str, &str)>,
        venue_ids: &[DbId],
    ) -> DbId {
        let id = next_id(self.shows.iter().map(|s| s.id));
        self.shows.push(ShowRow {
            id,
            title: title.to_string(),
            event_date,
            status,
            source_venue: source.map(|(venue, _)| venue.to_string()),
            source_event_id: source.map(|(_, event)| event.to_string()),
            rejection_reason: None,
        });
        self.show_venues
            .extend(venue_ids.iter().map(|&venue_id| (id, venue_id)));
        id
    }

    pub fn set_rejection_reason(&mut self, show_id: DbId, reason: &str) {
        if let Some(show) = self.shows.iter_mut().find(|s| s.id == show_id) {
            show.rejection_reason = Some(reason.to_string());
        }
    }

    /// Apply an importable plan the way the commit executor does: create
    /// `New` venues and artists, then the show and its join rows. Returns
    /// `None` for plans that must not be committed.
    pub fn apply_plan(&mut self, plan: &ImportPlan) -> Option<DbId> {
        if !plan.can_import {
            return None;
        }
        let draft = plan.show_draft.as_ref()?;
        if let (Some(venue), Some(event)) = (&draft.source_venue, &draft.source_event_id) {
            if self.shows_with_source(venue, event) > 0 {
                return None;
            }
        }

        let venue_ids: Vec<DbId> = plan
            .venue_matches
            .iter()
            .map(|m| match &m.result {
                MatchResult::Existing { id } => *id,
                MatchResult::New { .. } => self.add_venue(
                    &m.reference.name,
                    &m.reference.city,
                    &m.reference.state,
                    false,
                ),
            })
            .collect();
        let artist_ids: Vec<DbId> = plan
            .artist_matches
            .iter()
            .map(|m| match &m.result {
                MatchResult::Existing { id } => *id,
                MatchResult::New { .. } => self.add_artist(&m.reference.name),
            })
            .collect();

        let source = draft
            .source_venue
            .as_deref()
            .zip(draft.source_event_id.as_deref());
        let show_id = self.add_show(
            &draft.title,
            draft.event_date,
            plan.initial_status(),
            source,
            &venue_ids,
        );
        self.show_artists
            .extend(artist_ids.into_iter().map(|artist_id| (show_id, artist_id)));
        Some(show_id)
    }

    pub fn show_count(&self) -> usize {
        self.shows.len()
    }

    pub fn venue_count(&self) -> usize {
        self.venues.len()
    }

    pub fn artist_count(&self) -> usize {
        self.artists.len()
    }

    pub fn show_status(&self, show_id: DbId) -> Option<ShowStatus> {
        self.shows.iter().find(|s| s.id == show_id).map(|s| s.status)
    }

    pub fn shows_with_source(&self, source_venue: &str, source_event_id: &str) -> usize {
        self.shows
            .iter()
            .filter(|s| {
                s.source_venue.as_deref() == Some(source_venue)
                    && s.source_event_id.as_deref() == Some(source_event_id)
            })
            .count()
    }

    /// Artist ids linked to a show, in insertion order.
    pub fn show_artist_ids(&self, show_id: DbId) -> Vec<DbId> {
        self.show_artists
            .iter()
            .filter(|(show, _)| *show == show_id)
            .map(|(_, artist)| *artist)
            .collect()
    }
}

fn next_id(ids: impl Iterator<Item = DbId>) -> DbId {
    ids.max().unwrap_or(0) + 1
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    type Error = Infallible;

    async fn venues_by_key(&mut self, name_key: &str) -> Result<Vec<VenueCandidate>, Infallible> {
        Ok(self
            .venues
            .iter()
            .filter(|v| v.name_key == name_key)
            .map(|v| VenueCandidate {
                id: v.id,
                name: v.name.clone(),
                city: v.city.clone(),
                state: v.state.clone(),
                is_verified: v.is_verified,
            })
            .collect())
    }

    async fn artists_by_key(&mut self, name_key: &str) -> Result<Vec<ArtistCandidate>, Infallible> {
        Ok(self
            .artists
            .iter()
            .filter(|a| a.name_key == name_key)
            .map(|a| ArtistCandidate {
                id: a.id,
                name: a.name.clone(),
            })
            .collect())
    }

    async fn show_by_source(
        &mut self,
        source_venue: &str,
        source_event_id: &str,
    ) -> Result<Option<ImportedShow>, Infallible> {
        Ok(self
            .shows
            .iter()
            .find(|s| {
                s.source_venue.as_deref() == Some(source_venue)
                    && s.source_event_id.as_deref() == Some(source_event_id)
            })
            .map(|s| ImportedShow {
                id: s.id,
                status: s.status,
            }))
    }

    async fn rejected_shows_at_venue(
        &mut self,
        venue_id: DbId,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<RejectedShow>, Infallible> {
        Ok(self
            .show_venues
            .iter()
            .filter(|(_, venue)| *venue == venue_id)
            .filter_map(|(show_id, _)| self.shows.iter().find(|s| s.id == *show_id))
            .filter(|s| s.status == ShowStatus::Rejected)
            .filter(|s| s.event_date >= from && s.event_date < until)
            .map(|s| RejectedShow {
                id: s.id,
                venue_id,
                title: s.title.clone(),
                event_date: s.event_date,
                rejection_reason: s.rejection_reason.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{plan_record, ImportContext, SkipReason};
    use crate::raw_event::parse_records;
    use crate::review::ShowSource;
    use chrono::{FixedOffset, NaiveDate};
    use std::sync::Arc;

    fn ctx() -> ImportContext {
        ImportContext::new(
            Arc::new(crate::known_venues::KnownVenues::empty()),
            FixedOffset::west_opt(7 * 3600).unwrap(),
            ShowSource::Discovery,
        )
        .with_today(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
    }

    const BATCH: &str = r#"[
        {"source_venue": "valley-bar", "source_event_id": "1", "title": "Loomer / Bitterhaze",
         "event_date": "2026-01-20", "venue": "Valley Bar", "city": "Phoenix", "state": "AZ"},
        {"source_venue": "valley-bar", "source_event_id": "2", "title": "Loomer",
         "event_date": "2026-01-21", "venue": "Valley Bar", "city": "Phoenix", "state": "AZ"},
        {"source_venue": "valley-bar", "source_event_id": "3", "title": "No Venue Fields",
         "event_date": "2026-01-22"}
    ]"#;

    async fn import_all(catalog: &mut InMemoryCatalog) -> Vec<ImportPlan> {
        let c = ctx();
        let mut plans = Vec::new();
        for record in parse_records(BATCH).unwrap() {
            let plan = plan_record(catalog, &c, &record).await.unwrap();
            catalog.apply_plan(&plan);
            plans.push(plan);
        }
        plans
    }

    #[tokio::test]
    async fn second_run_is_all_duplicates_and_changes_nothing() {
        let mut catalog = InMemoryCatalog::new();
        import_all(&mut catalog).await;
        let shows = catalog.show_count();
        let venues = catalog.venue_count();
        let artists = catalog.artist_count();
        assert_eq!(shows, 2);
        assert_eq!(venues, 1);
        assert_eq!(artists, 2);

        let plans = import_all(&mut catalog).await;
        assert_eq!(plans[0].skip_reason, Some(SkipReason::Duplicate));
        assert_eq!(plans[1].skip_reason, Some(SkipReason::Duplicate));
        assert_eq!(catalog.show_count(), shows);
        assert_eq!(catalog.venue_count(), venues);
        assert_eq!(catalog.artist_count(), artists);
    }

    #[tokio::test]
    async fn blocked_records_never_create_shows() {
        let mut catalog = InMemoryCatalog::new();
        let plans = import_all(&mut catalog).await;
        assert!(!plans[2].can_import);
        assert_eq!(catalog.shows_with_source("valley-bar", "3"), 0);
    }

    #[tokio::test]
    async fn later_records_reuse_created_entities() {
        let mut catalog = InMemoryCatalog::new();
        let plans = import_all(&mut catalog).await;
        assert!(plans[1].venue_matches[0].result.existing_id().is_some());
        assert!(plans[1].artist_matches[0].result.existing_id().is_some());
        let first_headliner = catalog.show_artist_ids(1)[0];
        assert_eq!(catalog.show_artist_ids(2), vec![first_headliner]);
    }

    #[tokio::test]
    async fn new_venues_start_unverified() {
        let mut catalog = InMemoryCatalog::new();
        import_all(&mut catalog).await;
        assert_eq!(catalog.show_status(1), Some(ShowStatus::Pending));
    }
}
