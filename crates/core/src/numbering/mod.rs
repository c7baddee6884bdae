//! Document numbering for Tally.
//!
//! Issues unique, human-readable document numbers (`INV-000041`,
//! `RCPT-2026-001`) from per-document-type sequences that may restart yearly,
//! monthly or daily.
//!
//! # Modules
//!
//! - `types` - Sequence, history and warning types
//! - `error` - Numbering error taxonomy
//! - `format` - Number formatting
//! - `policy` - Reset boundary evaluation
//! - `store` - Storage traits
//! - `memory` - In-process stores
//! - `allocator` - Compare-and-swap allocation with bounded retry
//! - `preview` - Read-only next-number projection
//! - `reset` - Operator counter resets
//! - `history` - Audit trail recording
//! - `service` - Facade used by the API

pub mod allocator;
pub mod error;
pub mod format;
pub mod history;
pub mod memory;
pub mod policy;
pub mod preview;
pub mod reset;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod format_props;
#[cfg(test)]
mod policy_props;

pub use allocator::{RetryPolicy, SequenceAllocator};
pub use error::NumberingError;
pub use history::HistoryRecorder;
pub use memory::{InMemoryHistoryStore, InMemorySequenceStore};
pub use preview::PreviewService;
pub use reset::{AdminResetService, ResetRequest};
pub use service::NumberingService;
pub use store::{HistoryStore, SequenceStore};
pub use types::{
    AllocatedNumber, AllocationRequest, CasOutcome, CasUpdate, DocumentNumberHistory,
    DocumentSequence, DocumentType, NumberPreview, NumberingWarning, ResetFrequency, ResetOutcome,
    SequenceConfig, SequenceDefaults, SequencePhase, SequenceResetAudit,
};
