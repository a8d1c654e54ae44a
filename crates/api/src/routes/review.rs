//! Route definitions for Review Queue transitions at `/admin/shows`.

use axum::routing::post;
use axum::Router;

use crate::handlers::review;
use crate::state::AppState;

/// Routes mounted at `/admin/shows`.
///
/// ```text
/// POST   /{id}/approve        -> approve
/// POST   /{id}/reject         -> reject
/// POST   /{id}/unpublish      -> unpublish
/// POST   /{id}/make-private   -> make_private
/// POST   /{id}/publish        -> publish
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/approve", post(review::approve))
        .route("/{id}/reject", post(review::reject))
        .route("/{id}/unpublish", post(review::unpublish))
        .route("/{id}/make-private", post(review::make_private))
        .route("/{id}/publish", post(review::publish))
}
