//! Core numbering logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached through the traits in [`numbering::store`]; the database
//! crate implements them for Postgres and [`numbering::memory`] implements them
//! in-process.

pub mod numbering;
