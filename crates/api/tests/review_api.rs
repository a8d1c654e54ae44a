//! Integration tests for the admin review endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, encode, post_empty, post_json};
use serde_json::json;
use sqlx::PgPool;

/// Confirm a record at a new (unverified) venue and return the show id.
async fn import_pending_show(pool: &PgPool) -> i64 {
    let record = r#"{"source_venue": "rebel-lounge", "source_event_id": "55",
        "title": "Pale Hours / Sun Dial", "event_date": "2027-03-01",
        "venue": "The Rebel Lounge", "city": "Phoenix", "state": "AZ"}"#;
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/shows/import/confirm",
        json!({ "content": encode(record) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending");
    json["data"]["id"].as_i64().unwrap()
}

fn admin(id: i64, action: &str) -> String {
    format!("/api/v1/admin/shows/{id}/{action}")
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_and_verify_venues(pool: PgPool) {
    let id = import_pending_show(&pool).await;

    let response = post_json(
        common::build_test_app(pool),
        &admin(id, "approve"),
        json!({ "verify_venues": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "approved");
    assert_eq!(json["data"]["venues"][0]["is_verified"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_without_body(pool: PgPool) {
    let id = import_pending_show(&pool).await;

    let response = post_empty(common::build_test_app(pool), &admin(id, "approve")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "approved");
    assert_eq!(json["data"]["venues"][0]["is_verified"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reject_requires_reason(pool: PgPool) {
    let id = import_pending_show(&pool).await;

    let response = post_json(
        common::build_test_app(pool),
        &admin(id, "reject"),
        json!({ "reason": "  " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rejected_show_cannot_be_published(pool: PgPool) {
    let id = import_pending_show(&pool).await;

    let rejected = post_json(
        common::build_test_app(pool.clone()),
        &admin(id, "reject"),
        json!({ "reason": "Cancelled by venue" }),
    )
    .await;
    assert_eq!(rejected.status(), StatusCode::OK);
    let json = body_json(rejected).await;
    assert_eq!(json["data"]["status"], "rejected");
    assert_eq!(json["data"]["rejection_reason"], "Cancelled by venue");

    let response = post_empty(common::build_test_app(pool), &admin(id, "publish")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_TRANSITION");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_private_and_publish_cycle(pool: PgPool) {
    let id = import_pending_show(&pool).await;

    let steps = [
        ("approve", "approved"),
        ("make-private", "private"),
        // Venue is still unverified, so publishing sends it back to review.
        ("publish", "pending"),
        ("approve", "approved"),
        ("unpublish", "pending"),
    ];
    for (action, expected) in steps {
        let response = post_empty(common::build_test_app(pool.clone()), &admin(id, action)).await;
        assert_eq!(response.status(), StatusCode::OK, "{action}");
        assert_eq!(body_json(response).await["data"]["status"], expected, "{action}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_review_missing_show_is_404(pool: PgPool) {
    let response = post_empty(common::build_test_app(pool), &admin(987654, "unpublish")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
