//! Shared types, errors, and configuration for Billrun.
//!
//! This crate provides common types used across all other crates:
//! - Currency codes and a decimal money type
//! - Typed IDs for type-safe entity references
//! - The issuing company profile
//! - Pagination types for ledger queries
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::AppError;
