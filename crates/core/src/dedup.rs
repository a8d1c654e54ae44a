//! Dedup Guard: has this record been imported, or rejected, before?
//!
//! Two checks run in order against the catalog:
//!
//! 1. A show already carries the record's `(source_venue, source_event_id)`.
//! 2. A rejected show is linked to one of the record's resolved venues on the
//!    same local calendar day. This catches re-listings under a new event id
//!    of shows an admin already turned down.
//!
//! The guard only reads. The storage-level unique constraint stays the
//! authoritative duplicate check at commit time.

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::catalog::{CatalogLookup, RejectedShow};
use crate::types::{DbId, Timestamp};

/// Guard verdict for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    Clear,
    Duplicate {
        existing_show_id: DbId,
    },
    Rejected {
        rejected_show_id: DbId,
        rejection_reason: Option<String>,
    },
}

impl GuardDecision {
    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear)
    }
}

/// Everything the guard needs to know about a record.
#[derive(Debug, Clone, Copy)]
pub struct GuardInput<'a> {
    pub source_key: Option<(&'a str, &'a str)>,
    /// Ids of venues that resolved to existing rows.
    pub venue_ids: &'a [DbId],
    /// Local calendar day of the event, when the date parsed.
    pub event_day: Option<NaiveDate>,
}

/// Run both checks. Duplicate wins over rejected.
pub async fn check<L: CatalogLookup>(
    lookup: &mut L,
    input: GuardInput<'_>,
    offset: FixedOffset,
) -> Result<GuardDecision, L::Error> {
    if let Some((source_venue, source_event_id)) = input.source_key {
        if let Some(existing) = lookup.show_by_source(source_venue, source_event_id).await? {
            return Ok(GuardDecision::Duplicate {
                existing_show_id: existing.id,
            });
        }
    }

    let Some(day) = input.event_day else {
        return Ok(GuardDecision::Clear);
    };

    let (from, until) = local_day_bounds(day, offset);
    let mut matches: Vec<RejectedShow> = Vec::new();
    for &venue_id in input.venue_ids {
        let found = lookup.rejected_shows_at_venue(venue_id, from, until).await?;
        matches.extend(
            found
                .into_iter()
                .filter(|show| show.event_date.with_timezone(&offset).date_naive() == day),
        );
    }

    Ok(match matches.into_iter().min_by_key(|show| show.id) {
        Some(rejected) => GuardDecision::Rejected {
            rejected_show_id: rejected.id,
            rejection_reason: rejected.rejection_reason,
        },
        None => GuardDecision::Clear,
    })
}

/// UTC bounds `[start, end)` of a calendar day in `offset`.
pub fn local_day_bounds(day: NaiveDate, offset: FixedOffset) -> (Timestamp, Timestamp) {
    let to_utc = |date: NaiveDate| {
        let local = date.and_time(NaiveTime::MIN);
        let utc = local - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    };
    let start = to_utc(day);
    (start, start + chrono::Duration::days(1))
}
