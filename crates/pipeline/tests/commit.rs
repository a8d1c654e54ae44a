//! Integration tests for committing records against Postgres.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{FixedOffset, NaiveDate};
use gigboard_core::known_venues::{KnownVenue, KnownVenues};
use gigboard_core::matching::MatchResult;
use gigboard_core::outcome::RecordOutcome;
use gigboard_core::planner::{plan_record, ImportContext, SkipReason};
use gigboard_core::raw_event::{parse_records, RawEventRecord};
use gigboard_core::review::{ReviewAction, ShowSource, ShowStatus};
use gigboard_db::catalog::PgCatalog;
use gigboard_db::models::venue::CreateVenue;
use gigboard_db::repositories::{ShowRepo, VenueRepo};
use gigboard_pipeline::commit::commit_record;
use gigboard_pipeline::review::apply_review;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ctx() -> ImportContext {
    let known = KnownVenues::from_entries(vec![KnownVenue {
        key: "valley-bar".to_string(),
        name: "Valley Bar".to_string(),
        city: "Phoenix".to_string(),
        state: "AZ".to_string(),
    }]);
    ImportContext::new(
        Arc::new(known),
        FixedOffset::west_opt(7 * 3600).unwrap(),
        ShowSource::Discovery,
    )
    .with_today(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
}

fn record(json: &str) -> RawEventRecord {
    parse_records(json).unwrap().remove(0)
}

fn venue(name: &str, verified: bool) -> CreateVenue {
    CreateVenue {
        name: name.to_string(),
        city: "Phoenix".to_string(),
        state: "AZ".to_string(),
        is_verified: Some(verified),
    }
}

const SCENARIO_A: &str = r#"{
    "source_venue": "valley-bar",
    "source_event_id": "6942",
    "title": "ANIMAL SHIN WITH DREAM 99 / LOOMER / BITTERHAZE",
    "event_date": "2026-01-20",
    "venue": "Valley Bar"
}"#;

fn crescent_record(event_id: &str) -> RawEventRecord {
    record(&format!(
        r#"{{
            "source_venue": "crescent-ballroom",
            "source_event_id": "{event_id}",
            "title": "Night Beats / Sun Dial",
            "event_date": "2026-02-01",
            "venue": "Crescent Ballroom",
            "city": "Phoenix",
            "state": "AZ"
        }}"#
    ))
}

async fn venue_count(pool: &PgPool, name_key: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM venues WHERE name_key = $1")
        .bind(name_key)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn show_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM shows")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn artist_count(pool: &PgPool, name_key: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM artists WHERE name_key = $1")
        .bind(name_key)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Make inserting a show titled `title` fail inside the database.
async fn fail_show_inserts_titled(pool: &PgPool, title: &str) {
    sqlx::query(&format!(
        "CREATE FUNCTION fail_show_insert() RETURNS trigger AS $$
         BEGIN
             IF NEW.title = '{title}' THEN
                 RAISE EXCEPTION 'show insert refused';
             END IF;
             RETURN NEW;
         END;
         $$ LANGUAGE plpgsql"
    ))
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER fail_show_insert BEFORE INSERT ON shows
         FOR EACH ROW EXECUTE FUNCTION fail_show_insert()",
    )
    .execute(pool)
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scenario_a_creates_approved_show(pool: PgPool) {
    let valley = VenueRepo::create(&pool, &venue("Valley Bar", true))
        .await
        .unwrap();

    let report = commit_record(&pool, &ctx(), &record(SCENARIO_A))
        .await
        .unwrap();

    let show_id = assert_matches!(
        report.outcome,
        RecordOutcome::Created { show_id, status: ShowStatus::Approved } => show_id
    );
    assert_eq!(
        report.plan.venue_matches[0].result,
        MatchResult::Existing { id: valley.id }
    );

    let show = report.show.unwrap();
    assert_eq!(show.show.id, show_id);
    assert_eq!(show.status, "approved");
    assert_eq!(show.show.source, "discovery");
    assert_eq!(show.show.source_event_id.as_deref(), Some("6942"));
    assert_eq!(show.venues.len(), 1);
    assert_eq!(show.venues[0].venue_id, valley.id);

    let names: Vec<&str> = show.artists.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["ANIMAL SHIN WITH DREAM 99", "LOOMER", "BITTERHAZE"]);
    assert!(show.artists[0].is_headliner);
    assert!(!show.artists[1].is_headliner);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scenario_b_second_commit_is_duplicate(pool: PgPool) {
    VenueRepo::create(&pool, &venue("Valley Bar", true))
        .await
        .unwrap();
    let c = ctx();

    let first = commit_record(&pool, &c, &record(SCENARIO_A)).await.unwrap();
    let show_id = assert_matches!(first.outcome, RecordOutcome::Created { show_id, .. } => show_id);

    let second = commit_record(&pool, &c, &record(SCENARIO_A)).await.unwrap();
    assert_eq!(
        second.outcome,
        RecordOutcome::SkippedDuplicate {
            existing_show_id: Some(show_id)
        }
    );
    assert_eq!(second.plan.skip_reason, Some(SkipReason::Duplicate));
    assert!(second.show.is_none());

    let count = ShowRepo::count_by_source(&pool, "valley-bar", "6942")
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scenario_c_rejected_date_is_skipped(pool: PgPool) {
    let c = ctx();
    let first = commit_record(&pool, &c, &crescent_record("100")).await.unwrap();
    let rejected_id =
        assert_matches!(first.outcome, RecordOutcome::Created { show_id, .. } => show_id);
    apply_review(
        &pool,
        rejected_id,
        ReviewAction::Reject {
            reason: "duplicate of X".to_string(),
        },
    )
    .await
    .unwrap();

    let report = commit_record(&pool, &c, &crescent_record("101")).await.unwrap();

    assert_eq!(
        report.outcome,
        RecordOutcome::SkippedRejected {
            rejected_show_id: Some(rejected_id),
            reason: Some("duplicate of X".to_string()),
        }
    );
    assert!(!report.plan.can_import);
    assert!(report.plan.warnings.iter().any(|w| w.contains("duplicate of X")));
    assert_eq!(show_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scenario_d_commit_reuses_venue_created_after_preview(pool: PgPool) {
    let c = ctx();
    let rec = crescent_record("200");

    let mut conn = pool.acquire().await.unwrap();
    let preview = plan_record(&mut PgCatalog::new(&mut conn), &c, &rec)
        .await
        .unwrap();
    drop(conn);
    assert!(preview.venue_matches[0].result.is_new());

    let manual = VenueRepo::create(&pool, &venue("Crescent Ballroom", false))
        .await
        .unwrap();

    let report = commit_record(&pool, &c, &rec).await.unwrap();
    assert_matches!(report.outcome, RecordOutcome::Created { .. });
    assert_eq!(
        report.plan.venue_matches[0].result,
        MatchResult::Existing { id: manual.id }
    );
    assert_eq!(venue_count(&pool, "crescent ballroom").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unverified_venue_gives_pending_show(pool: PgPool) {
    let report = commit_record(&pool, &ctx(), &crescent_record("300"))
        .await
        .unwrap();
    assert_matches!(
        report.outcome,
        RecordOutcome::Created {
            status: ShowStatus::Pending,
            ..
        }
    );

    let venue = VenueRepo::find_by_name_key(&pool, "crescent ballroom")
        .await
        .unwrap();
    assert_eq!(venue.len(), 1);
    assert!(!venue[0].is_verified);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_blocked_record_writes_nothing(pool: PgPool) {
    let report = commit_record(
        &pool,
        &ctx(),
        &record(r#"{"title": "No Date", "venue": "Somewhere New", "city": "Mesa", "state": "AZ"}"#),
    )
    .await
    .unwrap();

    let issues = assert_matches!(report.outcome, RecordOutcome::Blocked { issues } => issues);
    assert!(issues.iter().any(|i| i == "Event date is required"));
    assert_eq!(show_count(&pool).await, 0);
    assert_eq!(venue_count(&pool, "somewhere new").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_commits_create_one_show(pool: PgPool) {
    VenueRepo::create(&pool, &venue("Valley Bar", true))
        .await
        .unwrap();
    let c = ctx();
    let rec = record(SCENARIO_A);

    let (a, b) = tokio::join!(
        commit_record(&pool, &c, &rec),
        commit_record(&pool, &c, &rec)
    );
    let outcomes = [a.unwrap().outcome, b.unwrap().outcome];

    let created = outcomes
        .iter()
        .filter(|o| matches!(o, RecordOutcome::Created { .. }))
        .count();
    let duplicates = outcomes
        .iter()
        .filter(|o| matches!(o, RecordOutcome::SkippedDuplicate { .. }))
        .count();
    assert_eq!(created, 1);
    assert_eq!(duplicates, 1);

    let count = ShowRepo::count_by_source(&pool, "valley-bar", "6942")
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_manual_record_without_provenance_imports_twice(pool: PgPool) {
    let manual = r#"{
        "title": "Open Mic",
        "event_date": "2026-03-04",
        "venue": "Valley Bar",
        "city": "Phoenix",
        "state": "AZ",
        "artists": ["House Band"]
    }"#;
    let c = ctx();

    for _ in 0..2 {
        let report = commit_record(&pool, &c, &record(manual)).await.unwrap();
        assert_matches!(report.outcome, RecordOutcome::Created { .. });
    }
    assert_eq!(show_count(&pool).await, 2);
    assert_eq!(venue_count(&pool, "valley bar").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_storage_failure_leaves_no_new_rows(pool: PgPool) {
    fail_show_inserts_titled(&pool, "Power Outage").await;
    let doomed = record(
        r#"{"source_venue": "static-room", "source_event_id": "1",
            "title": "Power Outage", "event_date": "2026-04-01",
            "venue": "Static Room", "city": "Phoenix", "state": "AZ"}"#,
    );

    let result = commit_record(&pool, &ctx(), &doomed).await;

    assert!(result.is_err());
    assert_eq!(venue_count(&pool, "static room").await, 0);
    assert_eq!(artist_count(&pool, "power outage").await, 0);
    assert_eq!(show_count(&pool).await, 0);

    // The failure belongs to that record only.
    let report = commit_record(&pool, &ctx(), &crescent_record("5"))
        .await
        .unwrap();
    assert_matches!(report.outcome, RecordOutcome::Created { .. });
}
