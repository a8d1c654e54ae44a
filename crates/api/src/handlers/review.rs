//! Handlers for Review Queue transitions.
//!
//! Each endpoint applies one action and returns the show in its new state.
//! An action not allowed from the show's current status is 409.

use axum::extract::{Path, State};
use axum::Json;
use gigboard_core::review::ReviewAction;
use gigboard_core::types::DbId;
use gigboard_db::models::show::ShowWithRelations;
use gigboard_pipeline::review::apply_review;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

type ShowResponse = AppResult<Json<DataResponse<ShowWithRelations>>>;

/// Optional body for approve.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    /// Also mark every venue of the show as verified.
    #[serde(default)]
    pub verify_venues: bool,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// POST /api/v1/admin/shows/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<ApproveRequest>>,
) -> ShowResponse {
    let verify_venues = body.is_some_and(|Json(input)| input.verify_venues);
    review(&state, id, ReviewAction::Approve { verify_venues }).await
}

/// POST /api/v1/admin/shows/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RejectRequest>,
) -> ShowResponse {
    review(
        &state,
        id,
        ReviewAction::Reject {
            reason: input.reason,
        },
    )
    .await
}

/// POST /api/v1/admin/shows/{id}/unpublish
pub async fn unpublish(State(state): State<AppState>, Path(id): Path<DbId>) -> ShowResponse {
    review(&state, id, ReviewAction::Unpublish).await
}

/// POST /api/v1/admin/shows/{id}/make-private
pub async fn make_private(State(state): State<AppState>, Path(id): Path<DbId>) -> ShowResponse {
    review(&state, id, ReviewAction::MakePrivate).await
}

/// POST /api/v1/admin/shows/{id}/publish
pub async fn publish(State(state): State<AppState>, Path(id): Path<DbId>) -> ShowResponse {
    review(&state, id, ReviewAction::Publish).await
}

async fn review(state: &AppState, id: DbId, action: ReviewAction) -> ShowResponse {
    let show = apply_review(&state.pool, id, action).await?;
    Ok(Json(DataResponse { data: show }))
}
