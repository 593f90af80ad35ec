//! Catalog seeding for the dbcost catalog builder.
//!
//! This crate provides:
//! - The provider list built at startup
//! - The fetch, extract, dedup, aggregate and emit pipeline
//! - Per-provider run reports

pub mod pipeline;
pub mod providers;

pub use pipeline::{build_catalog, run, ProviderReport, ProviderStatus, RunReport};
pub use providers::{default_providers, ProviderPair};
