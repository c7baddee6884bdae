//! Shared identifiers and configuration for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - List limits for history and audit endpoints
//! - Configuration management

pub mod config;
pub mod types;

pub use config::{AppConfig, NumberingConfig, StoreBackend};
