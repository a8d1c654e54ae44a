//! Per-record outcomes and the aggregate batch summary.

use std::fmt;

use serde::Serialize;

use crate::planner::{ImportPlan, SkipReason};
use crate::review::ShowStatus;
use crate::types::DbId;

/// Terminal classification of one record in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    Created {
        show_id: DbId,
        status: ShowStatus,
    },
    /// Dry-run counterpart of `Created`.
    WouldCreate {
        status: ShowStatus,
        new_venues: usize,
        new_artists: usize,
    },
    SkippedDuplicate {
        existing_show_id: Option<DbId>,
    },
    SkippedRejected {
        rejected_show_id: Option<DbId>,
        reason: Option<String>,
    },
    Blocked {
        issues: Vec<String>,
    },
    /// Unrecoverable storage or parse failure for this record only.
    Errored {
        message: String,
    },
}

impl RecordOutcome {
    /// Classify a plan without committing it.
    pub fn from_plan(plan: &ImportPlan) -> Self {
        match plan.skip_reason {
            Some(SkipReason::Duplicate) => Self::SkippedDuplicate {
                existing_show_id: plan.existing_show_id,
            },
            Some(SkipReason::Rejected) => Self::SkippedRejected {
                rejected_show_id: plan.rejected_show_id,
                reason: plan.rejection_reason.clone(),
            },
            None if !plan.blocking_issues.is_empty() => Self::Blocked {
                issues: plan.blocking_issues.clone(),
            },
            None => Self::WouldCreate {
                status: plan.initial_status(),
                new_venues: plan.new_venue_count(),
                new_artists: plan.new_artist_count(),
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::WouldCreate { .. } => "would_create",
            Self::SkippedDuplicate { .. } => "skipped_duplicate",
            Self::SkippedRejected { .. } => "skipped_rejected",
            Self::Blocked { .. } => "blocked",
            Self::Errored { .. } => "errored",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Errored { .. })
    }
}

impl fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { show_id, status } => {
                write!(f, "created show #{show_id} ({})", status.as_str())
            }
            Self::WouldCreate {
                status,
                new_venues,
                new_artists,
            } => write!(
                f,
                "would create ({}; {new_venues} new venue(s), {new_artists} new artist(s))",
                status.as_str()
            ),
            Self::SkippedDuplicate {
                existing_show_id: Some(id),
            } => write!(f, "skipped: already imported as show #{id}"),
            Self::SkippedDuplicate {
                existing_show_id: None,
            } => write!(f, "skipped: repeats an earlier record"),
            Self::SkippedRejected {
                rejected_show_id,
                reason,
            } => {
                write!(f, "skipped: matches rejected show")?;
                if let Some(id) = rejected_show_id {
                    write!(f, " #{id}")?;
                }
                if let Some(reason) = reason {
                    write!(f, " ({reason})")?;
                }
                Ok(())
            }
            Self::Blocked { issues } => write!(f, "blocked: {}", issues.join("; ")),
            Self::Errored { message } => write!(f, "error: {message}"),
        }
    }
}

/// One line of a run report.
#[derive(Debug, Clone, Serialize)]
pub struct RecordReport {
    /// Input file the record came from, when read from disk.
    pub origin: Option<String>,
    /// Zero-based index of the record within its origin.
    pub index: usize,
    pub label: String,
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

impl fmt::Display for RecordReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "[{origin}#{}] {}: {}", self.index, self.label, self.outcome),
            None => write!(f, "[#{}] {}: {}", self.index, self.label, self.outcome),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Aggregate counters for a run. In a dry run `created` counts records that
/// would be created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub created: usize,
    pub skipped_duplicate: usize,
    pub skipped_rejected: usize,
    pub blocked: usize,
    pub errored: usize,
    pub dry_run: bool,
}

impl BatchSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Created { .. } | RecordOutcome::WouldCreate { .. } => self.created += 1,
            RecordOutcome::SkippedDuplicate { .. } => self.skipped_duplicate += 1,
            RecordOutcome::SkippedRejected { .. } => self.skipped_rejected += 1,
            RecordOutcome::Blocked { .. } => self.blocked += 1,
            RecordOutcome::Errored { .. } => self.errored += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.skipped_duplicate + self.skipped_rejected + self.blocked + self.errored
    }

    /// `0` when every record reached a non-error classification, else `1`.
    pub fn exit_code(&self) -> i32 {
        if self.errored == 0 {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            write!(f, "DRY RUN (no changes written): ")?;
        }
        let created_label = if self.dry_run { "would_create" } else { "created" };
        write!(
            f,
            "{} records: {created_label}={} skipped_duplicate={} skipped_rejected={} blocked={} errored={}",
            self.total(),
            self.created,
            self.skipped_duplicate,
            self.skipped_rejected,
            self.blocked,
            self.errored
        )
    }
}
