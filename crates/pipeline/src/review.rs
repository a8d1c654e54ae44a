//! Review actions applied to stored shows.
//!
//! The row is locked for the duration of the transaction and the status
//! update is conditional on the status that was read, so a concurrent
//! reviewer surfaces as a conflict instead of a lost update.

use gigboard_core::error::CoreError;
use gigboard_core::review::{transition, validate_rejection_reason, ReviewAction};
use gigboard_core::types::DbId;
use gigboard_db::models::show::ShowWithRelations;
use gigboard_db::models::status::decode_status;
use gigboard_db::repositories::{ShowRepo, VenueRepo};
use gigboard_db::DbPool;

use crate::error::PipelineError;

/// Apply `action` to show `show_id` and return the updated show.
pub async fn apply_review(
    pool: &DbPool,
    show_id: DbId,
    action: ReviewAction,
) -> Result<ShowWithRelations, PipelineError> {
    let reason = match &action {
        ReviewAction::Reject { reason } => Some(validate_rejection_reason(reason)?),
        _ => None,
    };

    let mut tx = pool.begin().await?;

    let show = ShowRepo::find_by_id_for_update(&mut *tx, show_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Show",
            id: show_id,
        })?;
    let current = decode_status(show.status_id)?;

    let all_verified = VenueRepo::all_verified_for_show(&mut *tx, show_id).await?;
    let next = transition(current, &action, all_verified)?;

    if let ReviewAction::Approve {
        verify_venues: true,
    } = action
    {
        let verified = VenueRepo::verify_for_show(&mut *tx, show_id).await?;
        tracing::debug!(show_id, verified, "Verified venues on approval");
    }

    ShowRepo::update_status(&mut *tx, show_id, current, next, reason.as_deref())
        .await?
        .ok_or_else(|| {
            CoreError::Conflict(format!(
                "Show {show_id} changed status while being reviewed"
            ))
        })?;

    let updated = ShowRepo::find_with_relations(&mut tx, show_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Show",
            id: show_id,
        })?;

    tx.commit().await?;

    tracing::info!(
        show_id,
        action = action.name(),
        from = current.as_str(),
        to = next.as_str(),
        "Show reviewed"
    );
    Ok(updated)
}
