//! Show entity model, join rows and DTOs.
//!
//! Shows reference venues and artists through join rows only; the
//! `*Link` structs below carry ids plus join metadata, never nested entities.

use gigboard_core::review::{ShowSource, ShowStatus};
use gigboard_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::status::StatusId;

/// A row from the `shows` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Show {
    pub id: DbId,
    pub title: String,
    pub event_date: Timestamp,
    pub city: String,
    pub state: String,
    pub price: Option<String>,
    pub age_requirement: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub ticket_url: Option<String>,
    pub doors_time: Option<String>,
    pub show_time: Option<String>,
    pub status_id: StatusId,
    pub source: String,
    pub source_venue: Option<String>,
    pub source_event_id: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Show {
    pub fn status(&self) -> Option<ShowStatus> {
        ShowStatus::from_id(self.status_id)
    }
}

/// DTO for inserting a show. Built by the commit executor from a plan.
#[derive(Debug, Clone)]
pub struct CreateShow {
    pub title: String,
    pub event_date: Timestamp,
    pub city: String,
    pub state: String,
    pub price: Option<String>,
    pub age_requirement: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub ticket_url: Option<String>,
    pub doors_time: Option<String>,
    pub show_time: Option<String>,
    pub status: ShowStatus,
    pub source: ShowSource,
    pub source_venue: Option<String>,
    pub source_event_id: Option<String>,
}

/// A `show_venues` row joined with the venue's display fields.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ShowVenueLink {
    pub venue_id: DbId,
    pub name: String,
    pub city: String,
    pub state: String,
    pub is_verified: bool,
    pub position: i32,
}

/// A `show_artists` row joined with the artist's name.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ShowArtistLink {
    pub artist_id: DbId,
    pub name: String,
    pub position: i32,
    pub set_type: String,
    pub is_headliner: bool,
}

/// A show with its venue and artist links.
#[derive(Debug, Clone, Serialize)]
pub struct ShowWithRelations {
    #[serde(flatten)]
    pub show: Show,
    /// Status name resolved from `status_id`.
    pub status: &'static str,
    pub venues: Vec<ShowVenueLink>,
    pub artists: Vec<ShowArtistLink>,
}
