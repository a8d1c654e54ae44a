//! Commit Executor: apply one record inside one transaction.
//!
//! The record is planned again against the transaction's view of the catalog,
//! so venues or artists created since a preview are reused instead of
//! duplicated. A plan that cannot be imported is rolled back untouched. A
//! competing commit that wins the race on the provenance key turns this one
//! into a duplicate skip. Any other failure rolls back the whole record.

use gigboard_core::error::CoreError;
use gigboard_core::matching::MatchResult;
use gigboard_core::outcome::RecordOutcome;
use gigboard_core::planner::{plan_record, ImportContext, ImportPlan};
use gigboard_core::raw_event::RawEventRecord;
use gigboard_core::types::DbId;
use gigboard_db::catalog::PgCatalog;
use gigboard_db::models::artist::CreateArtist;
use gigboard_db::models::show::{CreateShow, ShowWithRelations};
use gigboard_db::models::venue::CreateVenue;
use gigboard_db::repositories::show_repo::SOURCE_EVENT_CONSTRAINT;
use gigboard_db::repositories::{ArtistRepo, ShowRepo, VenueRepo};
use gigboard_db::DbPool;
use sqlx::PgConnection;

use crate::error::PipelineError;

/// Result of a commit attempt that did not hit a storage error.
#[derive(Debug, Clone)]
pub struct CommitReport {
    pub outcome: RecordOutcome,
    /// The plan computed inside the transaction.
    pub plan: ImportPlan,
    /// Set when a show was created.
    pub show: Option<ShowWithRelations>,
}

/// Plan and, when importable, commit one record.
pub async fn commit_record(
    pool: &DbPool,
    ctx: &ImportContext,
    record: &RawEventRecord,
) -> Result<CommitReport, PipelineError> {
    let mut tx = pool.begin().await?;

    let plan = plan_record(&mut PgCatalog::new(&mut *tx), ctx, record).await?;

    if !plan.can_import {
        tx.rollback().await?;
        return Ok(CommitReport {
            outcome: RecordOutcome::from_plan(&plan),
            plan,
            show: None,
        });
    }

    match insert_plan(&mut *tx, &plan).await {
        Ok(show) => {
            tx.commit().await?;
            tracing::info!(
                show_id = show.show.id,
                status = show.status,
                source_venue = show.show.source_venue.as_deref().unwrap_or(""),
                source_event_id = show.show.source_event_id.as_deref().unwrap_or(""),
                "Show imported"
            );
            Ok(CommitReport {
                outcome: RecordOutcome::Created {
                    show_id: show.show.id,
                    status: plan.initial_status(),
                },
                plan,
                show: Some(show),
            })
        }
        Err(PipelineError::Database(err))
            if gigboard_db::is_unique_violation(&err, SOURCE_EVENT_CONSTRAINT) =>
        {
            tx.rollback().await?;
            let existing_show_id = existing_show_id(pool, record).await?;
            tracing::warn!(
                source_venue = record.source_venue_key.as_deref().unwrap_or(""),
                source_event_id = record.source_event_id.as_deref().unwrap_or(""),
                ?existing_show_id,
                "Concurrent import won the race; recording duplicate"
            );
            Ok(CommitReport {
                outcome: RecordOutcome::SkippedDuplicate { existing_show_id },
                plan,
                show: None,
            })
        }
        // Dropping `tx` rolls back.
        Err(err) => Err(err),
    }
}

/// Write venues, artists, the show and its join rows for an importable plan.
async fn insert_plan(
    conn: &mut PgConnection,
    plan: &ImportPlan,
) -> Result<ShowWithRelations, PipelineError> {
    let draft = plan
        .show_draft
        .as_ref()
        .ok_or_else(|| CoreError::Internal("Importable plan has no show draft".to_string()))?;

    let mut venue_ids: Vec<DbId> = Vec::with_capacity(plan.venue_matches.len());
    for venue in &plan.venue_matches {
        let id = match &venue.result {
            MatchResult::Existing { id } => *id,
            MatchResult::New { .. } => {
                let created = VenueRepo::create(
                    &mut *conn,
                    &CreateVenue {
                        name: venue.reference.name.clone(),
                        city: venue.reference.city.clone(),
                        state: venue.reference.state.clone(),
                        is_verified: Some(false),
                    },
                )
                .await?;
                tracing::debug!(venue_id = created.id, name = %created.name, "Created venue");
                created.id
            }
        };
        venue_ids.push(id);
    }

    let mut artist_ids: Vec<DbId> = Vec::with_capacity(plan.artist_matches.len());
    for artist in &plan.artist_matches {
        let id = match &artist.result {
            MatchResult::Existing { id } => *id,
            MatchResult::New { .. } => {
                let created = ArtistRepo::create(
                    &mut *conn,
                    &CreateArtist {
                        name: artist.reference.name.clone(),
                    },
                )
                .await?;
                tracing::debug!(artist_id = created.id, name = %created.name, "Created artist");
                created.id
            }
        };
        artist_ids.push(id);
    }

    let show = ShowRepo::create(
        &mut *conn,
        &CreateShow {
            title: draft.title.clone(),
            event_date: draft.event_date,
            city: draft.city.clone(),
            state: draft.state.clone(),
            price: draft.price.clone(),
            age_requirement: draft.age_requirement.clone(),
            description: draft.description.clone(),
            image_url: draft.image_url.clone(),
            ticket_url: draft.ticket_url.clone(),
            doors_time: draft.doors_time.clone(),
            show_time: draft.show_time.clone(),
            status: plan.initial_status(),
            source: draft.source,
            source_venue: draft.source_venue.clone(),
            source_event_id: draft.source_event_id.clone(),
        },
    )
    .await?;

    for (position, venue_id) in venue_ids.iter().enumerate() {
        ShowRepo::link_venue(&mut *conn, show.id, *venue_id, position as i32).await?;
    }
    for (artist, artist_id) in plan.artist_matches.iter().zip(&artist_ids) {
        ShowRepo::link_artist(
            &mut *conn,
            show.id,
            *artist_id,
            artist.reference.position,
            artist.reference.role.as_str(),
            artist.reference.is_headliner(),
        )
        .await?;
    }

    let show_id = show.id;
    ShowRepo::find_with_relations(conn, show_id)
        .await?
        .ok_or_else(|| {
            PipelineError::Core(CoreError::NotFound {
                entity: "Show",
                id: show_id,
            })
        })
}

async fn existing_show_id(
    pool: &DbPool,
    record: &RawEventRecord,
) -> Result<Option<DbId>, PipelineError> {
    let Some((venue, event)) = record.source_key() else {
        return Ok(None);
    };
    Ok(ShowRepo::find_by_source(pool, venue, event)
        .await?
        .map(|show| show.id))
}
