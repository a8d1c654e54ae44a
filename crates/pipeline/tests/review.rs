//! Integration tests for review actions.

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use gigboard_core::error::CoreError;
use gigboard_core::review::{ReviewAction, ShowSource, ShowStatus};
use gigboard_core::types::DbId;
use gigboard_db::models::show::CreateShow;
use gigboard_db::models::venue::CreateVenue;
use gigboard_db::repositories::{ShowRepo, VenueRepo};
use gigboard_pipeline::review::apply_review;
use gigboard_pipeline::PipelineError;
use sqlx::PgPool;

async fn seed_show(pool: &PgPool, status: ShowStatus, venue_verified: bool) -> DbId {
    let venue = VenueRepo::create(
        pool,
        &CreateVenue {
            name: "The Van Buren".to_string(),
            city: "Phoenix".to_string(),
            state: "AZ".to_string(),
            is_verified: Some(venue_verified),
        },
    )
    .await
    .unwrap();
    let show = ShowRepo::create(
        pool,
        &CreateShow {
            title: "Pale Hours".to_string(),
            event_date: Utc.with_ymd_and_hms(2026, 3, 1, 3, 0, 0).unwrap(),
            city: "Phoenix".to_string(),
            state: "AZ".to_string(),
            price: None,
            age_requirement: None,
            description: None,
            image_url: None,
            ticket_url: None,
            doors_time: None,
            show_time: None,
            status,
            source: ShowSource::Manual,
            source_venue: None,
            source_event_id: None,
        },
    )
    .await
    .unwrap();
    ShowRepo::link_venue(pool, show.id, venue.id, 0).await.unwrap();
    show.id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_with_verify_venues(pool: PgPool) {
    let id = seed_show(&pool, ShowStatus::Pending, false).await;

    let show = apply_review(&pool, id, ReviewAction::Approve { verify_venues: true })
        .await
        .unwrap();

    assert_eq!(show.status, "approved");
    assert!(show.venues.iter().all(|v| v.is_verified));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_without_verify_leaves_venue(pool: PgPool) {
    let id = seed_show(&pool, ShowStatus::Pending, false).await;

    let show = apply_review(&pool, id, ReviewAction::Approve { verify_venues: false })
        .await
        .unwrap();

    assert_eq!(show.status, "approved");
    assert!(!show.venues[0].is_verified);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reject_stores_trimmed_reason(pool: PgPool) {
    let id = seed_show(&pool, ShowStatus::Pending, true).await;

    let show = apply_review(
        &pool,
        id,
        ReviewAction::Reject {
            reason: "  duplicate of #12 ".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(show.status, "rejected");
    assert_eq!(show.show.rejection_reason.as_deref(), Some("duplicate of #12"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reject_requires_reason(pool: PgPool) {
    let id = seed_show(&pool, ShowStatus::Pending, true).await;

    let err = apply_review(&pool, id, ReviewAction::Reject { reason: "   ".to_string() })
        .await
        .unwrap_err();
    assert_matches!(err, PipelineError::Core(CoreError::Validation(_)));

    let show = ShowRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(show.status_id, ShowStatus::Pending.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rejected_show_cannot_be_approved(pool: PgPool) {
    let id = seed_show(&pool, ShowStatus::Rejected, true).await;

    let err = apply_review(&pool, id, ReviewAction::Approve { verify_venues: false })
        .await
        .unwrap_err();
    assert_matches!(
        err,
        PipelineError::Core(CoreError::InvalidTransition { from: "rejected", action: "approve" })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unpublish_and_private_round_trip(pool: PgPool) {
    let id = seed_show(&pool, ShowStatus::Approved, false).await;

    let show = apply_review(&pool, id, ReviewAction::MakePrivate).await.unwrap();
    assert_eq!(show.status, "private");

    // Venue still unverified, so publishing returns the show to review.
    let show = apply_review(&pool, id, ReviewAction::Publish).await.unwrap();
    assert_eq!(show.status, "pending");

    let err = apply_review(&pool, id, ReviewAction::Unpublish).await.unwrap_err();
    assert_matches!(err, PipelineError::Core(CoreError::InvalidTransition { .. }));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_publish_with_verified_venue_approves(pool: PgPool) {
    let id = seed_show(&pool, ShowStatus::Private, true).await;

    let show = apply_review(&pool, id, ReviewAction::Publish).await.unwrap();
    assert_eq!(show.status, "approved");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_show_is_not_found(pool: PgPool) {
    let err = apply_review(&pool, 9999, ReviewAction::Unpublish)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        PipelineError::Core(CoreError::NotFound { entity: "Show", id: 9999 })
    );
}
