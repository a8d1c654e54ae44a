//! Domain logic for the show discovery and import pipeline.
//!
//! Everything here is storage-agnostic: the resolver, guard and planner read
//! the catalog through [`catalog::CatalogLookup`], implemented over Postgres
//! in `gigboard-db` and over an arena in [`memory`].

pub mod catalog;
pub mod dedup;
pub mod document;
pub mod error;
pub mod known_venues;
pub mod matching;
pub mod memory;
pub mod normalize;
pub mod outcome;
pub mod planner;
pub mod preview;
pub mod raw_event;
pub mod review;
pub mod types;
