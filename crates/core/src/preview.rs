//! Preview Renderer: plans for a whole batch, with zero writes.
//!
//! Safe to call repeatedly; identical records against an identical catalog
//! always render identical plans.

use std::collections::HashSet;

use serde::Serialize;

use crate::catalog::CatalogLookup;
use crate::matching::{ArtistMatch, VenueMatch};
use crate::planner::{plan_record, ImportContext, ImportPlan, ShowDraft, SkipReason};
use crate::raw_event::RawEventRecord;
use crate::review::ShowStatus;
use crate::types::DbId;

/// Plan every record in order.
///
/// A record repeating the source key of an earlier record in the same batch
/// is planned as a duplicate, since committing the first would make it one.
pub async fn preview_batch<L: CatalogLookup>(
    lookup: &mut L,
    ctx: &ImportContext,
    records: &[RawEventRecord],
) -> Result<Vec<ImportPlan>, L::Error> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut plans = Vec::with_capacity(records.len());

    for record in records {
        let mut plan = plan_record(lookup, ctx, record).await?;
        if let Some((venue, event)) = record.source_key() {
            if !seen.insert((venue.to_string(), event.to_string())) {
                plan.mark_batch_duplicate();
            }
        }
        plans.push(plan);
    }

    Ok(plans)
}

/// Client-facing shape of a single-record preview.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewView {
    pub show: Option<ShowDraft>,
    pub venues: Vec<VenueMatch>,
    pub artists: Vec<ArtistMatch>,
    pub warnings: Vec<String>,
    pub can_import: bool,
    pub skip_reason: Option<SkipReason>,
    pub existing_show_id: Option<DbId>,
    pub rejection_reason: Option<String>,
    /// Status the show would start in if confirmed.
    pub initial_status: ShowStatus,
}

impl From<ImportPlan> for PreviewView {
    fn from(plan: ImportPlan) -> Self {
        let initial_status = plan.initial_status();
        Self {
            show: plan.show_draft,
            venues: plan.venue_matches,
            artists: plan.artist_matches,
            warnings: plan.warnings,
            can_import: plan.can_import,
            skip_reason: plan.skip_reason,
            existing_show_id: plan.existing_show_id,
            rejection_reason: plan.rejection_reason,
            initial_status,
        }
    }
}
