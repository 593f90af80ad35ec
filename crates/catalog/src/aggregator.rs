//! Offer aggregation into the instance catalog.
//!
//! Offers are grouped by instance type. Each instance collects the regions its
//! offers are sold in, and each region collects the terms priced there.

use chrono::Utc;
use dbcost_core::{
    CloudProvider, DbInstance, Error, IdSequence, InstanceId, InstancePayload, Offer, Region,
    Result, RowStatus, Term, TimestampSec, SYSTEM_BOT_ID,
};
use std::collections::HashMap;

/// Terms pre-built from offers, keyed by the offer's position in the input.
///
/// Built once before aggregation so regions sharing an offer share its term.
#[derive(Debug, Clone)]
pub struct TermIndex {
    terms: Vec<Option<Term>>,
}

impl TermIndex {
    /// Build the index. Offers without an instance payload get no term.
    pub fn build(offers: &[Offer]) -> Self {
        Self {
            terms: offers.iter().map(Term::from_offer).collect(),
        }
    }

    /// Term of the offer at `position`.
    pub fn get(&self, position: usize) -> Option<&Term> {
        self.terms.get(position).and_then(Option::as_ref)
    }

    /// Number of terms in the index.
    pub fn len(&self) -> usize {
        self.terms.iter().filter(|t| t.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An instance that's currently being built.
#[derive(Debug)]
struct InstanceInProgress {
    instance: DbInstance,
    /// Region code -> position in `instance.region_list`.
    regions: HashMap<String, usize>,
}

impl InstanceInProgress {
    fn new(instance: DbInstance) -> Self {
        Self {
            instance,
            regions: HashMap::new(),
        }
    }

    /// Add a term to a region, creating the region on first use.
    fn add_term(&mut self, region_code: &str, term: &Term) {
        let mut term = term.clone();
        term.database_engine = self.instance.database_engine;

        match self.regions.get(region_code) {
            Some(&i) => self.instance.region_list[i].term_list.push(term),
            None => {
                self.regions
                    .insert(region_code.to_string(), self.instance.region_list.len());
                self.instance.region_list.push(Region {
                    code: region_code.to_string(),
                    term_list: vec![term],
                });
            }
        }
    }
}

fn parse_cpu(name: &str, cpu: &str) -> Result<u32> {
    cpu.trim().parse::<u32>().map_err(|_| {
        Error::parse(format!("cannot parse CPU of {} as an integer: {:?}", name, cpu))
    })
}

/// Groups one provider's offers into catalog instances.
#[derive(Debug, Clone)]
pub struct Aggregator {
    provider: CloudProvider,
    timestamp: TimestampSec,
}

impl Aggregator {
    /// Create an aggregator stamping rows with the current time.
    pub fn new(provider: CloudProvider) -> Self {
        Self {
            provider,
            timestamp: Utc::now().timestamp(),
        }
    }

    /// Use a fixed creation timestamp.
    pub fn with_timestamp(mut self, timestamp: TimestampSec) -> Self {
        self.timestamp = timestamp;
        self
    }

    fn new_instance(&self, id: InstanceId, sku: &str, shape: &InstancePayload, cpu: u32) -> DbInstance {
        DbInstance {
            id,
            external_id: sku.to_string(),
            row_status: RowStatus::Normal,
            creator_id: SYSTEM_BOT_ID,
            created_ts: self.timestamp,
            updater_id: SYSTEM_BOT_ID,
            updated_ts: self.timestamp,
            cloud_provider: self.provider,
            name: shape.instance_type.clone(),
            cpu,
            memory: shape.memory.clone(),
            processor: shape.physical_processor.clone(),
            database_engine: shape.database_engine,
            region_list: Vec::new(),
        }
    }

    /// Aggregate offers into instances, taking IDs from `ids`.
    ///
    /// Instances appear in first-occurrence order of their name; regions and
    /// terms in first-occurrence order within their instance. A CPU value that
    /// fails to parse aborts the whole aggregation and leaves `ids` untouched.
    pub fn aggregate(&self, offers: &[Offer], ids: &mut IdSequence) -> Result<Vec<DbInstance>> {
        let index = TermIndex::build(offers);
        let mut next_ids = ids.clone();

        let mut by_name: HashMap<&str, usize> = HashMap::new();
        let mut building: Vec<InstanceInProgress> = Vec::new();

        for (position, offer) in offers.iter().enumerate() {
            // Price-only records have no instance to attach to.
            let Some(shape) = &offer.instance_payload else {
                continue;
            };

            let slot = match by_name.get(shape.instance_type.as_str()) {
                Some(&slot) => slot,
                None => {
                    let cpu = parse_cpu(&shape.instance_type, &shape.cpu)?;
                    let instance = self.new_instance(next_ids.next_id(), &offer.sku, shape, cpu);
                    by_name.insert(shape.instance_type.as_str(), building.len());
                    building.push(InstanceInProgress::new(instance));
                    building.len() - 1
                }
            };

            let Some(term) = index.get(position) else {
                continue;
            };
            for region_code in &offer.region_list {
                building[slot].add_term(region_code, term);
            }
        }

        *ids = next_ids;
        let instances: Vec<DbInstance> = building.into_iter().map(|b| b.instance).collect();

        tracing::debug!(
            provider = %self.provider,
            offers = offers.len(),
            terms = index.len(),
            instances = instances.len(),
            "Aggregated offers"
        );
        Ok(instances)
    }
}

/// Aggregate offers with an aggregator stamping the current time.
pub fn aggregate(
    offers: &[Offer],
    provider: CloudProvider,
    ids: &mut IdSequence,
) -> Result<Vec<DbInstance>> {
    Aggregator::new(provider).aggregate(offers, ids)
}
