//! Handlers for importing a single show from an encoded document.
//!
//! Both endpoints take the same body. Preview plans the record against the
//! live catalog and writes nothing; confirm plans it again inside a
//! transaction and commits it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use gigboard_core::document::parse_document;
use gigboard_core::outcome::RecordOutcome;
use gigboard_core::planner::plan_record;
use gigboard_core::preview::PreviewView;
use gigboard_core::raw_event::RawEventRecord;
use gigboard_db::catalog::PgCatalog;
use gigboard_db::models::show::ShowWithRelations;
use gigboard_pipeline::commit::commit_record;
use serde::Deserialize;

use crate::error::{AppError, AppResult, ImportRefusal};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for preview and confirm.
#[derive(Debug, Deserialize)]
pub struct ImportDocumentRequest {
    /// Base64 of a JSON record, or of Markdown embedding one in a fenced block.
    pub content: String,
}

/// POST /api/v1/shows/import/preview
pub async fn preview_import(
    State(state): State<AppState>,
    Json(input): Json<ImportDocumentRequest>,
) -> AppResult<Json<DataResponse<PreviewView>>> {
    let record = single_record(&input.content)?;
    let ctx = state.import_context();

    let mut conn = state.pool.acquire().await?;
    let plan = plan_record(&mut PgCatalog::new(&mut conn), &ctx, &record).await?;

    Ok(Json(DataResponse {
        data: PreviewView::from(plan),
    }))
}

/// POST /api/v1/shows/import/confirm
///
/// Returns 201 with the created show. A duplicate or previously rejected
/// record is 409 and a record missing required fields is 422.
pub async fn confirm_import(
    State(state): State<AppState>,
    Json(input): Json<ImportDocumentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ShowWithRelations>>)> {
    let record = single_record(&input.content)?;
    let report = commit_record(&state.pool, &state.import_context(), &record).await?;

    match report.outcome {
        RecordOutcome::Created { show_id, .. } => {
            let show = report.show.ok_or_else(|| {
                AppError::InternalError(format!("Show {show_id} was created but not returned"))
            })?;
            Ok((StatusCode::CREATED, Json(DataResponse { data: show })))
        }
        RecordOutcome::SkippedDuplicate { existing_show_id } => {
            Err(ImportRefusal::Duplicate { existing_show_id }.into())
        }
        RecordOutcome::SkippedRejected {
            rejected_show_id,
            reason,
        } => Err(ImportRefusal::Rejected {
            rejected_show_id,
            rejection_reason: reason,
        }
        .into()),
        RecordOutcome::Blocked { .. } => Err(ImportRefusal::Blocked {
            warnings: report.plan.warnings,
        }
        .into()),
        other => Err(AppError::InternalError(format!(
            "Unexpected import outcome: {}",
            other.kind()
        ))),
    }
}

/// Decode the document and require exactly one record.
fn single_record(content: &str) -> AppResult<RawEventRecord> {
    let mut records = parse_document(content)?;
    match records.len() {
        1 => Ok(records.remove(0)),
        0 => Err(AppError::BadRequest(
            "Document contains no show record".to_string(),
        )),
        n => Err(AppError::BadRequest(format!(
            "Document must contain exactly one show record, found {n}"
        ))),
    }
}
