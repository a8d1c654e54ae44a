//! Import Planner: one raw record in, one [`ImportPlan`] out.
//!
//! The planner validates required fields, resolves every venue and artist
//! reference, and asks the Dedup Guard whether the record should be skipped.
//! It never writes. Preview calls it against the live catalog; the commit
//! executor calls it again inside its transaction so the plan it applies
//! reflects catalog state at commit time.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::catalog::CatalogLookup;
use crate::dedup::{self, GuardDecision, GuardInput};
use crate::known_venues::KnownVenues;
use crate::matching::{resolve_artist, resolve_venue, ArtistMatch, MatchResult, VenueMatch};
use crate::normalize::{match_key, normalize_name};
use crate::raw_event::{ArtistRef, EventDate, RawEventRecord, VenueRef};
use crate::review::{initial_status, ShowSource, ShowStatus};
use crate::types::{DbId, Timestamp};

/// Maximum length of a show title.
pub const MAX_TITLE_LEN: usize = 500;

/// Separator used when a title has to be built from the lineup.
const LINEUP_TITLE_JOIN: &str = " / ";

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Read-only inputs shared by every record in a run.
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub known_venues: Arc<KnownVenues>,
    /// Offset of the region's wall clock; event dates are local to it.
    pub utc_offset: FixedOffset,
    /// Provenance stamped on shows created in this run.
    pub source: ShowSource,
    /// Local "today", used only for the past-date warning.
    pub today: NaiveDate,
}

impl ImportContext {
    pub fn new(known_venues: Arc<KnownVenues>, utc_offset: FixedOffset, source: ShowSource) -> Self {
        let today = Utc::now().with_timezone(&utc_offset).date_naive();
        Self {
            known_venues,
            utc_offset,
            source,
            today,
        }
    }

    /// Pin "today" so plans are reproducible in tests.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Show fields a commit would write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowDraft {
    pub title: String,
    pub event_date: Timestamp,
    /// Calendar day of the event in the region's offset.
    pub local_date: NaiveDate,
    pub city: String,
    pub state: String,
    pub price: Option<String>,
    pub age_requirement: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub ticket_url: Option<String>,
    pub doors_time: Option<String>,
    pub show_time: Option<String>,
    pub source: ShowSource,
    pub source_venue: Option<String>,
    pub source_event_id: Option<String>,
}

/// Why a record will not be imported even though it is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Duplicate,
    Rejected,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::Rejected => "rejected",
        }
    }
}

/// The computed, pre-commit description of what importing a record would do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportPlan {
    /// `None` when the event date could not be parsed.
    pub show_draft: Option<ShowDraft>,
    pub venue_matches: Vec<VenueMatch>,
    pub artist_matches: Vec<ArtistMatch>,
    /// Human-readable notices, blocking issues included.
    pub warnings: Vec<String>,
    /// Missing or invalid required fields.
    pub blocking_issues: Vec<String>,
    pub can_import: bool,
    pub skip_reason: Option<SkipReason>,
    /// Show this record duplicates. `None` for a repeat within the same batch.
    pub existing_show_id: Option<DbId>,
    pub rejected_show_id: Option<DbId>,
    pub rejection_reason: Option<String>,
}

impl ImportPlan {
    /// New venues are never verified, so any `New` match means `false`.
    pub fn all_venues_verified(&self) -> bool {
        !self.venue_matches.is_empty() && self.venue_matches.iter().all(|v| v.is_verified)
    }

    /// Status a commit of this plan would assign.
    pub fn initial_status(&self) -> ShowStatus {
        initial_status(self.all_venues_verified())
    }

    pub fn new_venue_count(&self) -> usize {
        self.venue_matches.iter().filter(|v| v.result.is_new()).count()
    }

    pub fn new_artist_count(&self) -> usize {
        self.artist_matches.iter().filter(|a| a.result.is_new()).count()
    }

    /// Mark as a repeat of an earlier record in the same batch.
    pub fn mark_batch_duplicate(&mut self) {
        if self.skip_reason.is_some() {
            return;
        }
        self.skip_reason = Some(SkipReason::Duplicate);
        self.can_import = false;
        self.warnings
            .push("Duplicate of an earlier record in this batch".to_string());
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Build the plan for one record.
pub async fn plan_record<L: CatalogLookup>(
    lookup: &mut L,
    ctx: &ImportContext,
    record: &RawEventRecord,
) -> Result<ImportPlan, L::Error> {
    let mut warnings = Vec::new();
    let mut blocking_issues = Vec::new();

    let venue_refs = dedupe_venues(record.venue_refs(&ctx.known_venues));
    let lineup = dedupe_lineup(record.lineup(), &mut warnings);

    let mut venue_matches = Vec::with_capacity(venue_refs.len());
    for reference in &venue_refs {
        venue_matches.push(resolve_venue(lookup, reference).await?);
    }
    let mut artist_matches = Vec::with_capacity(lineup.len());
    for reference in &lineup {
        artist_matches.push(resolve_artist(lookup, reference).await?);
    }

    // ---- Required fields ----

    let event_date = parse_event_date(&record.event_date, &mut blocking_issues);
    match venue_refs.first() {
        None => blocking_issues.push("At least one venue is required".to_string()),
        Some(primary) => {
            if primary.city.trim().is_empty() {
                blocking_issues.push("Venue city is required".to_string());
            }
            if primary.state.trim().is_empty() {
                blocking_issues.push("Venue state is required".to_string());
            }
        }
    }
    if lineup.is_empty() {
        blocking_issues.push("At least one artist is required".to_string());
    }

    let title = show_title(record, &lineup);
    if title.chars().count() > MAX_TITLE_LEN {
        blocking_issues.push(format!("Title exceeds {MAX_TITLE_LEN} characters"));
    }

    let show_draft = event_date.map(|date| {
        let primary = venue_refs.first();
        ShowDraft {
            title: title.clone(),
            event_date: date.to_utc(ctx.utc_offset, record.show_time.as_deref()),
            local_date: date.local_date(ctx.utc_offset),
            city: primary.map(|v| v.city.clone()).unwrap_or_default(),
            state: primary.map(|v| v.state.clone()).unwrap_or_default(),
            price: trimmed(&record.price),
            age_requirement: trimmed(&record.age_requirement),
            description: trimmed(&record.description),
            image_url: trimmed(&record.image_url),
            ticket_url: trimmed(&record.ticket_url),
            doors_time: trimmed(&record.doors_time),
            show_time: trimmed(&record.show_time),
            source: ctx.source,
            source_venue: record.source_key().map(|(venue, _)| venue.to_string()),
            source_event_id: record.source_key().map(|(_, event)| event.to_string()),
        }
    });

    // ---- Dedup ----

    let venue_ids: Vec<DbId> = venue_matches
        .iter()
        .filter_map(|v| v.result.existing_id())
        .collect();
    let decision = dedup::check(
        lookup,
        GuardInput {
            source_key: record.source_key(),
            venue_ids: &venue_ids,
            event_day: show_draft.as_ref().map(|d| d.local_date),
        },
        ctx.utc_offset,
    )
    .await?;

    // ---- Notices ----

    for venue in &venue_matches {
        match &venue.result {
            MatchResult::New { .. } => warnings.push(format!(
                "Venue \"{}\" ({}) will be created as new",
                venue.reference.name,
                location(&venue.reference.city, &venue.reference.state)
            )),
            MatchResult::Existing { id } if !venue.is_verified => warnings.push(format!(
                "Venue \"{}\" (#{id}) is not verified; the show will need review",
                venue.reference.name
            )),
            MatchResult::Existing { .. } => {}
        }
    }
    for artist in &artist_matches {
        if artist.result.is_new() {
            warnings.push(format!(
                "Artist \"{}\" will be created as new",
                artist.reference.name
            ));
        }
    }
    if let Some(draft) = &show_draft {
        if draft.local_date < ctx.today {
            warnings.push(format!("Event date {} is in the past", draft.local_date));
        }
    }

    let (skip_reason, existing_show_id, rejected_show_id, rejection_reason) = match decision {
        GuardDecision::Clear => (None, None, None, None),
        GuardDecision::Duplicate { existing_show_id } => {
            warnings.push(format!("Already imported as show #{existing_show_id}"));
            (Some(SkipReason::Duplicate), Some(existing_show_id), None, None)
        }
        GuardDecision::Rejected {
            rejected_show_id,
            rejection_reason,
        } => {
            let day = show_draft
                .as_ref()
                .map(|d| d.local_date.to_string())
                .unwrap_or_default();
            warnings.push(match &rejection_reason {
                Some(reason) => format!(
                    "A show at this venue on {day} was rejected (show #{rejected_show_id}): {reason}"
                ),
                None => format!(
                    "A show at this venue on {day} was rejected (show #{rejected_show_id})"
                ),
            });
            (
                Some(SkipReason::Rejected),
                None,
                Some(rejected_show_id),
                rejection_reason,
            )
        }
    };

    warnings.extend(blocking_issues.iter().map(|issue| format!("Blocked: {issue}")));
    let can_import = blocking_issues.is_empty() && skip_reason.is_none();

    Ok(ImportPlan {
        show_draft,
        venue_matches,
        artist_matches,
        warnings,
        blocking_issues,
        can_import,
        skip_reason,
        existing_show_id,
        rejected_show_id,
        rejection_reason,
    })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn parse_event_date(raw: &str, blocking_issues: &mut Vec<String>) -> Option<EventDate> {
    if raw.trim().is_empty() {
        blocking_issues.push("Event date is required".to_string());
        return None;
    }
    let parsed = EventDate::parse(raw);
    if parsed.is_none() {
        blocking_issues.push(format!("Event date \"{}\" is not a valid date", raw.trim()));
    }
    parsed
}

/// Drop venues listed twice at the same location.
fn dedupe_venues(refs: Vec<VenueRef>) -> Vec<VenueRef> {
    let mut seen = HashSet::new();
    refs.into_iter()
        .filter(|v| {
            seen.insert((
                match_key(&v.name),
                normalize_name(&v.city),
                normalize_name(&v.state),
            ))
        })
        .collect()
}

/// Drop repeated artists (by match key), keeping the first billing slot.
fn dedupe_lineup(lineup: Vec<ArtistRef>, warnings: &mut Vec<String>) -> Vec<ArtistRef> {
    let mut seen = HashSet::new();
    let mut kept: Vec<ArtistRef> = Vec::with_capacity(lineup.len());
    for artist in lineup {
        if seen.insert(match_key(&artist.name)) {
            kept.push(artist);
        } else {
            warnings.push(format!(
                "Artist \"{}\" is listed more than once; keeping the first entry",
                artist.name
            ));
        }
    }
    for (i, artist) in kept.iter_mut().enumerate() {
        artist.position = i as i32;
    }
    kept
}

fn show_title(record: &RawEventRecord, lineup: &[ArtistRef]) -> String {
    let title = record.title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    lineup
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(LINEUP_TITLE_JOIN)
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn location(city: &str, state: &str) -> String {
    match (city.trim().is_empty(), state.trim().is_empty()) {
        (false, false) => format!("{city}, {state}"),
        (false, true) => city.to_string(),
        (true, false) => state.to_string(),
        (true, true) => "unknown location".to_string(),
    }
}
