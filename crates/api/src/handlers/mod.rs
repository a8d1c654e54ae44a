//! Request handlers.
//!
//! Handlers delegate to `gigboard_pipeline` for writes and to the
//! repositories in `gigboard_db` for reads, and map errors via
//! [`AppError`](crate::error::AppError).

pub mod import;
pub mod review;
pub mod shows;
