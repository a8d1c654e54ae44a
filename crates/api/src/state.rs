use std::sync::Arc;

use chrono::FixedOffset;
use gigboard_core::known_venues::KnownVenues;
use gigboard_core::planner::ImportContext;
use gigboard_core::review::ShowSource;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; inner data is behind `Arc` or is `Copy`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: gigboard_db::DbPool,
    /// Scrape-target venue table, loaded once at startup.
    pub known_venues: Arc<KnownVenues>,
    /// Offset of the region's wall clock.
    pub utc_offset: FixedOffset,
}

impl AppState {
    /// Planning context for a document import. Built per request so the
    /// past-date check uses the current day.
    pub fn import_context(&self) -> ImportContext {
        ImportContext::new(
            Arc::clone(&self.known_venues),
            self.utc_offset,
            ShowSource::Import,
        )
    }
}
