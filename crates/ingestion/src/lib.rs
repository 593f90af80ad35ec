//! Vendor feed ingestion and normalization for the dbcost catalog builder.
//!
//! This crate handles:
//! - Fetching raw vendor pricing documents
//! - Extracting offer records from the AWS offer file
//! - Product/price join by SKU
//! - Offer deduplication

pub mod aws;
pub mod dedup;
pub mod feed;

pub use aws::{extract_offers, AwsClient, ExtractionStats};
pub use dedup::{dedup_offers, DedupKey, DedupStats, Deduplicator};
pub use feed::{FeedSource, HttpFeedSource, OfferClient};
