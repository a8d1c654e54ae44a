use axum::extract::{Path, State};
use axum::Json;
use gigboard_core::error::CoreError;
use gigboard_core::types::DbId;
use gigboard_db::models::show::ShowWithRelations;
use gigboard_db::repositories::ShowRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/shows/{id}
pub async fn get_show(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ShowWithRelations>>> {
    let mut conn = state.pool.acquire().await?;
    let show = ShowRepo::find_with_relations(&mut conn, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Show", id })?;
    Ok(Json(DataResponse { data: show }))
}
