//! Catalog construction for the dbcost catalog builder.
//!
//! This crate handles:
//! - Grouping offers into instance types with per-region term trees
//! - Catalog serialization to a JSON file

pub mod aggregator;
pub mod emitter;

pub use aggregator::{aggregate, Aggregator, TermIndex};
pub use emitter::{ensure_absent, load, save, to_json};
