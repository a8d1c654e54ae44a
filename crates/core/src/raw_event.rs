//! Raw event records as emitted by venue-calendar scrapers and show documents.
//!
//! Records are ephemeral: they are parsed, planned, and either committed or
//! discarded within a single call. Nothing here touches storage.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::known_venues::KnownVenues;

/// Local time assumed when neither the date nor `show_time` carries one.
pub const DEFAULT_EVENT_TIME: (u32, u32) = (20, 0);

/// Separator used by venue calendars to list a lineup in the title.
pub const TITLE_LINEUP_SEPARATOR: char = '/';

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One externally sourced event, before any resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEventRecord {
    /// Stable key of the originating calendar (e.g. `"valley-bar"`).
    #[serde(default, alias = "source_venue")]
    pub source_venue_key: Option<String>,
    /// Event id within the originating calendar. `None` for hand-authored imports.
    #[serde(default, deserialize_with = "string_or_number")]
    pub source_event_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default, alias = "venue")]
    pub venue_name: Option<String>,
    #[serde(default, alias = "city")]
    pub venue_city: Option<String>,
    #[serde(default, alias = "state")]
    pub venue_state: Option<String>,
    /// Co-hosting venues beyond the primary one.
    #[serde(default)]
    pub additional_venues: Vec<VenueEntry>,
    #[serde(default, alias = "artist_names")]
    pub artists: Vec<ArtistEntry>,
    #[serde(default)]
    pub doors_time: Option<String>,
    #[serde(default)]
    pub show_time: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ticket_url: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub age_requirement: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// An extra venue listed on a record. Missing city/state inherit the primary venue's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueEntry {
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// An artist as listed by the source: either a bare name or a detailed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtistEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        is_headliner: Option<bool>,
        #[serde(default, alias = "set_type")]
        role: Option<ArtistRole>,
    },
}

impl ArtistEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Detailed { name, .. } => name,
        }
    }
}

/// Billing role of an artist on a show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtistRole {
    Headliner,
    #[serde(alias = "opener", alias = "supporting")]
    Support,
}

impl ArtistRole {
    /// Stored as `show_artists.set_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Headliner => "headliner",
            Self::Support => "support",
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved references
// ---------------------------------------------------------------------------

/// A venue reference with the known-venue table already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueRef {
    pub name: String,
    pub city: String,
    pub state: String,
}

/// An artist reference with its billing position fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub name: String,
    /// Zero-based billing order.
    pub position: i32,
    pub role: ArtistRole,
}

impl ArtistRef {
    pub fn is_headliner(&self) -> bool {
        self.role == ArtistRole::Headliner
    }
}

impl RawEventRecord {
    /// Venue references in billing order: the primary venue first, then any
    /// additional venues. Missing fields on the primary venue are filled from
    /// the known-venue table by `source_venue_key`. References without a name
    /// are dropped.
    pub fn venue_refs(&self, known: &KnownVenues) -> Vec<VenueRef> {
        let known_entry = self
            .source_venue_key
            .as_deref()
            .and_then(|key| known.get(key));

        let name = non_blank(self.venue_name.as_deref())
            .or_else(|| known_entry.map(|k| k.name.clone()));
        let city = non_blank(self.venue_city.as_deref())
            .or_else(|| known_entry.map(|k| k.city.clone()))
            .unwrap_or_default();
        let state = non_blank(self.venue_state.as_deref())
            .or_else(|| known_entry.map(|k| k.state.clone()))
            .unwrap_or_default();

        let mut refs = Vec::with_capacity(1 + self.additional_venues.len());
        if let Some(name) = name {
            refs.push(VenueRef {
                name,
                city: city.clone(),
                state: state.clone(),
            });
        }

        for extra in &self.additional_venues {
            let Some(name) = non_blank(Some(&extra.name)) else {
                continue;
            };
            refs.push(VenueRef {
                name,
                city: non_blank(extra.city.as_deref()).unwrap_or_else(|| city.clone()),
                state: non_blank(extra.state.as_deref()).unwrap_or_else(|| state.clone()),
            });
        }

        refs
    }

    /// The lineup in billing order.
    ///
    /// Uses the explicit artist list when present; otherwise splits the title
    /// on `/`, the convention venue calendars use for multi-act bills. Without
    /// explicit roles the first act headlines and the rest support.
    pub fn lineup(&self) -> Vec<ArtistRef> {
        let entries: Vec<(String, Option<ArtistRole>)> = if self.artists.is_empty() {
            self.title
                .split(TITLE_LINEUP_SEPARATOR)
                .filter_map(|part| non_blank(Some(part)))
                .map(|name| (name, None))
                .collect()
        } else {
            self.artists
                .iter()
                .filter_map(|entry| {
                    let name = non_blank(Some(entry.name()))?;
                    let role = match entry {
                        ArtistEntry::Name(_) => None,
                        ArtistEntry::Detailed {
                            role: Some(role), ..
                        } => Some(*role),
                        ArtistEntry::Detailed {
                            is_headliner: Some(true),
                            ..
                        } => Some(ArtistRole::Headliner),
                        ArtistEntry::Detailed {
                            is_headliner: Some(false),
                            ..
                        } => Some(ArtistRole::Support),
                        ArtistEntry::Detailed { .. } => None,
                    };
                    Some((name, role))
                })
                .collect()
        };

        entries
            .into_iter()
            .enumerate()
            .map(|(i, (name, role))| ArtistRef {
                name,
                position: i as i32,
                role: role.unwrap_or(if i == 0 {
                    ArtistRole::Headliner
                } else {
                    ArtistRole::Support
                }),
            })
            .collect()
    }

    /// `(source_venue, source_event_id)` when both are present.
    pub fn source_key(&self) -> Option<(&str, &str)> {
        let venue = self.source_venue_key.as_deref().map(str::trim)?;
        let event = self.source_event_id.as_deref().map(str::trim)?;
        if venue.is_empty() || event.is_empty() {
            return None;
        }
        Some((venue, event))
    }

    /// Short human label for logs and CLI output.
    pub fn label(&self) -> String {
        match self.source_key() {
            Some((venue, event)) => format!("{venue}/{event}"),
            None if !self.title.trim().is_empty() => self.title.trim().to_string(),
            None => "(untitled)".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Date and time parsing
// ---------------------------------------------------------------------------

/// An event date as written by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDate {
    /// A wall-clock date, optionally with a time, in the region's offset.
    Local(NaiveDate, Option<NaiveTime>),
    /// A fully qualified instant.
    Instant(DateTime<FixedOffset>),
}

impl EventDate {
    /// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` (or with a space) and RFC 3339.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::Instant(instant));
        }
        for fmt in [
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
        ] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(Self::Local(dt.date(), Some(dt.time())));
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(|d| Self::Local(d, None))
    }

    /// Calendar day of the event in the region's offset.
    pub fn local_date(&self, offset: FixedOffset) -> NaiveDate {
        match self {
            Self::Local(date, _) => *date,
            Self::Instant(instant) => instant.with_timezone(&offset).date_naive(),
        }
    }

    /// Resolve to a UTC timestamp. A date-only value takes `show_time` if it
    /// parses, else [`DEFAULT_EVENT_TIME`].
    pub fn to_utc(
        &self,
        offset: FixedOffset,
        show_time: Option<&str>,
    ) -> chrono::DateTime<chrono::Utc> {
        match self {
            Self::Instant(instant) => instant.with_timezone(&chrono::Utc),
            Self::Local(date, time) => {
                let time = time
                    .or_else(|| show_time.and_then(parse_clock_time))
                    .unwrap_or_else(default_event_time);
                let local = date.and_time(time);
                let utc = local - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
                chrono::Utc.from_utc_datetime(&utc)
            }
        }
    }
}

fn default_event_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_EVENT_TIME.0, DEFAULT_EVENT_TIME.1, 0).unwrap_or_default()
}

/// Parse a door/show time such as `19:30`, `7:30 PM`, `7pm` or `7 p.m.`.
pub fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect::<String>()
        .to_lowercase();

    let (body, meridiem) = if let Some(body) = compact.strip_suffix("am") {
        (body, Some(false))
    } else if let Some(body) = compact.strip_suffix("pm") {
        (body, Some(true))
    } else {
        (compact.as_str(), None)
    };

    let mut parts = body.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    let second: u32 = match parts.next() {
        Some(s) => s.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }

    let hour = match meridiem {
        None => hour,
        Some(_) if !(1..=12).contains(&hour) => return None,
        Some(false) => hour % 12,
        Some(true) => hour % 12 + 12,
    };
    if meridiem.is_none() && body.split(':').count() < 2 {
        // A bare number like "7" is too ambiguous without am/pm.
        return None;
    }

    NaiveTime::from_hms_opt(hour, minute, second)
}

// ---------------------------------------------------------------------------
// Batch parsing
// ---------------------------------------------------------------------------

/// An array element that could not be read as a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRecord {
    /// Position of the element in its payload.
    pub index: usize,
    /// Best-effort label taken from the element's source key or title.
    pub label: String,
    pub message: String,
}

impl MalformedRecord {
    fn from_value(index: usize, value: &serde_json::Value, err: serde_json::Error) -> Self {
        Self {
            index,
            label: value_label(value),
            message: format!("Event record {index} is malformed: {err}"),
        }
    }
}

/// Parse a JSON payload holding one record object or an array of them,
/// element by element.
///
/// Only a payload that is not JSON, or is neither an object nor an array,
/// fails as a whole. A bad element fails only itself.
pub fn parse_record_entries(
    json: &str,
) -> Result<Vec<Result<RawEventRecord, MalformedRecord>>, CoreError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| CoreError::Validation(format!("Invalid event JSON: {e}")))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        obj @ serde_json::Value::Object(_) => vec![obj],
        _ => {
            return Err(CoreError::Validation(
                "Event JSON must be an object or an array of objects".to_string(),
            ))
        }
    };

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            RawEventRecord::deserialize(&item)
                .map_err(|err| MalformedRecord::from_value(index, &item, err))
        })
        .collect())
}

/// Parse a JSON payload holding either one record object or an array of them.
/// Any malformed element fails the whole payload.
pub fn parse_records(json: &str) -> Result<Vec<RawEventRecord>, CoreError> {
    parse_record_entries(json)?
        .into_iter()
        .map(|entry| entry.map_err(|bad| CoreError::Validation(bad.message)))
        .collect()
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn value_label(value: &serde_json::Value) -> String {
    let text = |key: &str| match value.get(key) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    match (text("source_venue").or_else(|| text("source_venue_key")), text("source_event_id")) {
        (Some(venue), Some(event)) => format!("{venue}/{event}"),
        _ => text("title").unwrap_or_else(|| "(malformed)".to_string()),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Scrapers emit numeric ids for some calendars; store them as strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Id>::deserialize(deserializer)? {
        None => None,
        Some(Id::Text(s)) => Some(s),
        Some(Id::Int(n)) => Some(n.to_string()),
        Some(Id::Float(f)) => Some(f.to_string()),
    })
}
