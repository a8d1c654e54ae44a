//! Entity resolution for venue and artist references.
//!
//! Matching is exact on the match key (see [`crate::normalize::match_key`]).
//! Venues are additionally scoped to the same city and state; artists are
//! global. When several rows match, the lowest id wins. The resolver only
//! reads from the catalog and is safe to call repeatedly and concurrently.

use serde::{Deserialize, Serialize};

use crate::catalog::{ArtistCandidate, CatalogLookup, VenueCandidate};
use crate::normalize::{match_key, same_place};
use crate::raw_event::{ArtistRef, VenueRef};
use crate::types::DbId;

/// Outcome of resolving one reference.
///
/// Similarity-based matching could later add variants without changing how
/// callers treat these two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum MatchResult {
    Existing { id: DbId },
    New { normalized_name: String },
}

impl MatchResult {
    pub fn existing_id(&self) -> Option<DbId> {
        match self {
            Self::Existing { id } => Some(*id),
            Self::New { .. } => None,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::New { .. })
    }
}

/// A venue reference and what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueMatch {
    #[serde(flatten)]
    pub reference: VenueRef,
    #[serde(flatten)]
    pub result: MatchResult,
    /// Verification flag of the matched row; always `false` for new venues.
    pub is_verified: bool,
}

/// An artist reference and what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistMatch {
    #[serde(flatten)]
    pub reference: ArtistRef,
    #[serde(flatten)]
    pub result: MatchResult,
}

/// Pick the venue among same-name candidates that sits in `city`/`state`.
pub fn pick_venue<'a>(
    candidates: &'a [VenueCandidate],
    city: &str,
    state: &str,
) -> Option<&'a VenueCandidate> {
    candidates
        .iter()
        .filter(|c| same_place(&c.city, city) && same_place(&c.state, state))
        .min_by_key(|c| c.id)
}

/// Pick the lowest-id artist among same-name candidates.
pub fn pick_artist(candidates: &[ArtistCandidate]) -> Option<&ArtistCandidate> {
    candidates.iter().min_by_key(|c| c.id)
}

/// Resolve one venue reference against the catalog.
pub async fn resolve_venue<L: CatalogLookup>(
    lookup: &mut L,
    reference: &VenueRef,
) -> Result<VenueMatch, L::Error> {
    let key = match_key(&reference.name);
    let candidates = if key.is_empty() {
        Vec::new()
    } else {
        lookup.venues_by_key(&key).await?
    };

    let (result, is_verified) = match pick_venue(&candidates, &reference.city, &reference.state) {
        Some(found) => (MatchResult::Existing { id: found.id }, found.is_verified),
        None => (
            MatchResult::New {
                normalized_name: key,
            },
            false,
        ),
    };

    Ok(VenueMatch {
        reference: reference.clone(),
        result,
        is_verified,
    })
}

/// Resolve one artist reference against the catalog.
pub async fn resolve_artist<L: CatalogLookup>(
    lookup: &mut L,
    reference: &ArtistRef,
) -> Result<ArtistMatch, L::Error> {
    let key = match_key(&reference.name);
    let candidates = if key.is_empty() {
        Vec::new()
    } else {
        lookup.artists_by_key(&key).await?
    };

    let result = match pick_artist(&candidates) {
        Some(found) => MatchResult::Existing { id: found.id },
        None => MatchResult::New {
            normalized_name: key,
        },
    };

    Ok(ArtistMatch {
        reference: reference.clone(),
        result,
    })
}
