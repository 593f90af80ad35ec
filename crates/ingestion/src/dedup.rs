//! Offer deduplication.
//!
//! Paginated or redundant vendor responses can repeat the same priced unit.
//! The first occurrence of each [`DedupKey`] survives, in input order.

use dbcost_core::{ChargeType, Offer};
use ordered_float::OrderedFloat;
use std::collections::HashSet;

/// Identity of an economically identical priced unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    OnDemand {
        sku: String,
        commitment_usd: OrderedFloat<f64>,
        hourly_usd: OrderedFloat<f64>,
    },
    Reserved {
        sku: String,
        lease_contract_length: String,
        purchase_option: String,
        commitment_usd: OrderedFloat<f64>,
        hourly_usd: OrderedFloat<f64>,
    },
}

impl DedupKey {
    /// Compute the key of an offer.
    pub fn of(offer: &Offer) -> Self {
        let commitment_usd = OrderedFloat(offer.commitment_usd);
        let hourly_usd = OrderedFloat(offer.hourly_usd);

        match (offer.charge_type, &offer.charge_payload) {
            (ChargeType::Reserved, Some(payload)) => DedupKey::Reserved {
                sku: offer.sku.clone(),
                lease_contract_length: payload.lease_contract_length.clone(),
                purchase_option: payload.purchase_option.clone(),
                commitment_usd,
                hourly_usd,
            },
            // Validated offers always carry a payload when reserved.
            (ChargeType::Reserved, None) => DedupKey::Reserved {
                sku: offer.sku.clone(),
                lease_contract_length: String::new(),
                purchase_option: String::new(),
                commitment_usd,
                hourly_usd,
            },
            (ChargeType::OnDemand, _) => DedupKey::OnDemand {
                sku: offer.sku.clone(),
                commitment_usd,
                hourly_usd,
            },
        }
    }
}

/// Statistics about deduplication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupStats {
    /// Offers seen.
    pub total_offers: u64,
    /// Offers kept.
    pub kept_offers: u64,
    /// Offers dropped as duplicates.
    pub duplicate_offers: u64,
}

/// Streaming deduplicator remembering every key it has admitted.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<DedupKey>,
    stats: DedupStats,
}

impl Deduplicator {
    /// Create an empty deduplicator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the offer is the first with its key.
    pub fn admit(&mut self, offer: &Offer) -> bool {
        self.stats.total_offers += 1;
        let fresh = self.seen.insert(DedupKey::of(offer));
        if fresh {
            self.stats.kept_offers += 1;
        } else {
            self.stats.duplicate_offers += 1;
        }
        fresh
    }

    /// Get deduplication statistics.
    pub fn stats(&self) -> &DedupStats {
        &self.stats
    }

    /// Forget all keys and statistics.
    pub fn reset(&mut self) {
        self.seen.clear();
        self.stats = DedupStats::default();
    }
}

/// Drop repeated offers, keeping first occurrences in order.
pub fn dedup_offers(offers: Vec<Offer>) -> (Vec<Offer>, DedupStats) {
    let mut dedup = Deduplicator::new();
    let kept: Vec<Offer> = offers.into_iter().filter(|o| dedup.admit(o)).collect();
    (kept, dedup.stats().clone())
}
