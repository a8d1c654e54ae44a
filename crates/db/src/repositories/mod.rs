//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Methods
//! take any Postgres executor so the same query runs against the pool or
//! inside a caller's transaction.

pub mod artist_repo;
pub mod show_repo;
pub mod venue_repo;

pub use artist_repo::ArtistRepo;
pub use show_repo::ShowRepo;
pub use venue_repo::VenueRepo;
