//! Review Queue state machine for shows.
//!
//! Shows committed by the import pipeline start as `approved` when every
//! linked venue is verified and `pending` otherwise. Admin reviewers then move
//! them between states with the actions below; no other writer changes a
//! show's status.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of a rejection reason.
pub const MAX_REJECTION_REASON_LEN: usize = 2000;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Show review status. Discriminants match the `show_statuses` seed rows.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowStatus {
    Pending = 1,
    Approved = 2,
    Rejected = 3,
    Private = 4,
}

impl ShowStatus {
    /// Database status id.
    pub fn id(self) -> i16 {
        self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Approved),
            3 => Some(Self::Rejected),
            4 => Some(Self::Private),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Private => "private",
        }
    }
}

impl FromStr for ShowStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "private" => Ok(Self::Private),
            other => Err(CoreError::Validation(format!("Unknown show status \"{other}\""))),
        }
    }
}

/// Status a freshly committed show starts in.
pub fn initial_status(all_venues_verified: bool) -> ShowStatus {
    if all_venues_verified {
        ShowStatus::Approved
    } else {
        ShowStatus::Pending
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// How a show entered the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowSource {
    /// Submitted by a user through the UI.
    Manual,
    /// Scraped from a venue calendar.
    Discovery,
    /// Hand-authored or extracted document.
    Import,
}

impl ShowSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Discovery => "discovery",
            Self::Import => "import",
        }
    }
}

impl FromStr for ShowSource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "discovery" => Ok(Self::Discovery),
            "import" => Ok(Self::Import),
            other => Err(CoreError::Validation(format!("Unknown show source \"{other}\""))),
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// An admin review action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    /// Approve a pending show, optionally marking its venues verified.
    Approve { verify_venues: bool },
    Reject { reason: String },
    Unpublish,
    MakePrivate,
    Publish,
}

impl ReviewAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Approve { .. } => "approve",
            Self::Reject { .. } => "reject",
            Self::Unpublish => "unpublish",
            Self::MakePrivate => "make private",
            Self::Publish => "publish",
        }
    }
}

/// Compute the status an action moves a show to.
///
/// `all_venues_verified` is only consulted by `Publish`; callers approving
/// with `verify_venues` apply that flag to the venues themselves.
pub fn transition(
    current: ShowStatus,
    action: &ReviewAction,
    all_venues_verified: bool,
) -> Result<ShowStatus, CoreError> {
    let next = match (current, action) {
        (ShowStatus::Pending, ReviewAction::Approve { .. }) => ShowStatus::Approved,
        (ShowStatus::Pending, ReviewAction::Reject { .. }) => ShowStatus::Rejected,
        (ShowStatus::Approved, ReviewAction::Unpublish) => ShowStatus::Pending,
        (ShowStatus::Approved, ReviewAction::MakePrivate) => ShowStatus::Private,
        (ShowStatus::Private, ReviewAction::Publish) => initial_status(all_venues_verified),
        _ => {
            return Err(CoreError::InvalidTransition {
                from: current.as_str(),
                action: action.name(),
            })
        }
    };
    Ok(next)
}

/// Validate and trim a rejection reason.
pub fn validate_rejection_reason(reason: &str) -> Result<String, CoreError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "A rejection reason is required".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_REJECTION_REASON_LEN {
        return Err(CoreError::Validation(format!(
            "Rejection reason exceeds {MAX_REJECTION_REASON_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}
