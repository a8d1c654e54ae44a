//! Row models and create DTOs.
//!
//! Each submodule holds a `FromRow` + `Serialize` struct matching a table row
//! and, where rows are inserted from Rust, a create DTO.

pub mod artist;
pub mod show;
pub mod status;
pub mod venue;
