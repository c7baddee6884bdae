//! Repository abstractions for data access.
//!
//! Repositories implement the numbering storage traits, hiding the `SeaORM`
//! implementation details from the rest of the application.

pub mod history;
pub mod sequence;

pub use history::HistoryRepository;
pub use sequence::SequenceRepository;
