//! Common types used across the application.

pub mod id;
pub mod limit;

pub use id::*;
pub use limit::ListLimit;
