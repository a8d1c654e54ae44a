//! Route definitions for the `/shows` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{import, shows};
use crate::state::AppState;

/// Routes mounted at `/shows`.
///
/// ```text
/// POST   /import/preview    -> preview_import
/// POST   /import/confirm    -> confirm_import
/// GET    /{id}              -> get_show
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/import/preview", post(import::preview_import))
        .route("/import/confirm", post(import::confirm_import))
        .route("/{id}", get(shows::get_show))
}
