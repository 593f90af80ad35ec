//! Core types and configuration for the dbcost catalog builder.
//!
//! This crate provides shared types used across all other crates:
//! - The vendor-independent offer record model
//! - Catalog node types (instances, regions, terms)
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
