pub mod health;
pub mod review;
pub mod shows;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /shows/import/preview                 plan a document import (POST, no writes)
/// /shows/import/confirm                 commit a document import (POST)
/// /shows/{id}                           show with venues and artists (GET)
///
/// /admin/shows/{id}/approve             pending -> approved (POST)
/// /admin/shows/{id}/reject              pending -> rejected (POST)
/// /admin/shows/{id}/unpublish           approved -> pending (POST)
/// /admin/shows/{id}/make-private        approved -> private (POST)
/// /admin/shows/{id}/publish             private -> approved or pending (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/shows", shows::router())
        .nest("/admin/shows", review::router())
}
