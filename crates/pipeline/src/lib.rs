//! Import execution: committing plans, running batches and applying reviews.
//!
//! Planning is pure and lives in `gigboard-core`; this crate owns every write
//! the pipeline makes and the transactions around them.

pub mod batch;
pub mod commit;
pub mod error;
pub mod input;
pub mod review;
pub mod settings;

pub use error::PipelineError;
