//! Import settings loaded from environment variables.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::FixedOffset;
use gigboard_core::known_venues::KnownVenues;
use gigboard_core::planner::ImportContext;
use gigboard_core::review::ShowSource;

use crate::error::PipelineError;

/// Default wall-clock offset of the region's events (Arizona, no DST).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -7;

/// Default number of sources imported concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Settings shared by the CLI importer and the HTTP import endpoints.
#[derive(Debug, Clone)]
pub struct ImportSettings {
    /// JSON file of scrape-target venues. Unset means an empty table.
    pub known_venues_path: Option<PathBuf>,
    pub utc_offset_hours: i32,
    /// Maximum number of sources in flight during a batch run.
    pub concurrency: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            known_venues_path: None,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl ImportSettings {
    /// Load settings from environment variables with defaults.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `KNOWN_VENUES_PATH`      | unset   |
    /// | `EVENT_UTC_OFFSET_HOURS` | `-7`    |
    /// | `IMPORT_CONCURRENCY`     | `4`     |
    pub fn from_env() -> Result<Self, PipelineError> {
        let known_venues_path = std::env::var("KNOWN_VENUES_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let utc_offset_hours = parse_var("EVENT_UTC_OFFSET_HOURS", DEFAULT_UTC_OFFSET_HOURS)?;
        let concurrency = parse_var("IMPORT_CONCURRENCY", DEFAULT_CONCURRENCY)?;

        let settings = Self {
            known_venues_path,
            utc_offset_hours,
            concurrency,
        };
        settings.utc_offset()?;
        if settings.concurrency == 0 {
            return Err(PipelineError::Config(
                "IMPORT_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        Ok(settings)
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, PipelineError> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            PipelineError::Config(format!(
                "EVENT_UTC_OFFSET_HOURS out of range: {}",
                self.utc_offset_hours
            ))
        })
    }

    /// Read the known-venue table, or an empty one when no path is set.
    pub fn load_known_venues(&self) -> Result<Arc<KnownVenues>, PipelineError> {
        let Some(path) = &self.known_venues_path else {
            return Ok(Arc::new(KnownVenues::empty()));
        };
        let venues = load_known_venues_file(path)?;
        tracing::info!(path = %path.display(), count = venues.len(), "Loaded known venues");
        Ok(Arc::new(venues))
    }

    /// Build a planning context for a run.
    pub fn context(&self, source: ShowSource) -> Result<ImportContext, PipelineError> {
        Ok(ImportContext::new(
            self.load_known_venues()?,
            self.utc_offset()?,
            source,
        ))
    }
}

pub fn load_known_venues_file(path: &Path) -> Result<KnownVenues, PipelineError> {
    let json = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(KnownVenues::from_json(&json)?)
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, PipelineError> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| PipelineError::Config(format!("{name} is not a valid value: {raw}"))),
        _ => Ok(default),
    }
}
