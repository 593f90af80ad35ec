//! Seeding pipeline.
//!
//! Each provider runs fetch, extract, sort by term code, dedup and aggregate on
//! its own. The ID sequence is the only state shared between providers. A
//! provider whose fetch fails is skipped; any other failure aborts the run
//! before anything is written.

use crate::providers::ProviderPair;
use dbcost_catalog::{emitter, Aggregator};
use dbcost_core::{CloudProvider, DbInstance, IdSequence, Result};
use dbcost_ingestion::dedup_offers;
use std::path::Path;

/// Outcome for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    /// Offers were converted into instances.
    Converted {
        offers: usize,
        duplicates: usize,
        instances: usize,
    },
    /// The fetch failed and the provider contributed nothing.
    Skipped { reason: String },
}

/// Report line for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReport {
    pub provider: CloudProvider,
    pub status: ProviderStatus,
}

/// Summary of a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub providers: Vec<ProviderReport>,
    /// Instances in the combined catalog.
    pub instances: usize,
}

impl RunReport {
    /// Number of providers skipped after a fetch failure.
    pub fn skipped(&self) -> usize {
        self.providers
            .iter()
            .filter(|p| matches!(p.status, ProviderStatus::Skipped { .. }))
            .count()
    }
}

/// Convert every provider's offers into one combined catalog.
pub fn build_catalog(
    providers: &[ProviderPair],
    ids: &mut IdSequence,
) -> Result<(Vec<DbInstance>, RunReport)> {
    let mut catalog = Vec::new();
    let mut report = RunReport::default();

    for pair in providers {
        tracing::info!(provider = %pair.provider, "Fetching offers");

        let mut offers = match pair.client.get_offers() {
            Ok(offers) => offers,
            Err(e) if e.is_recoverable() => {
                tracing::warn!(provider = %pair.provider, error = %e, "Skipping provider");
                report.providers.push(ProviderReport {
                    provider: pair.provider,
                    status: ProviderStatus::Skipped {
                        reason: e.to_string(),
                    },
                });
                continue;
            }
            Err(e) => return Err(e),
        };
        let fetched = offers.len();

        // Stable, so offers sharing a term code keep their extraction order.
        offers.sort_by(|a, b| a.term_code.cmp(&b.term_code));

        let (offers, dedup) = dedup_offers(offers);
        let instances = Aggregator::new(pair.provider).aggregate(&offers, ids)?;

        tracing::info!(
            provider = %pair.provider,
            offers = fetched,
            duplicates = dedup.duplicate_offers,
            instances = instances.len(),
            "Converted offers"
        );
        report.providers.push(ProviderReport {
            provider: pair.provider,
            status: ProviderStatus::Converted {
                offers: fetched,
                duplicates: dedup.duplicate_offers as usize,
                instances: instances.len(),
            },
        });
        catalog.extend(instances);
    }

    report.instances = catalog.len();
    Ok((catalog, report))
}

/// Build the catalog and write it to `output`.
///
/// An existing `output` is rejected before any provider is fetched.
pub fn run(providers: &[ProviderPair], output: &Path) -> Result<RunReport> {
    emitter::ensure_absent(output)?;

    let mut ids = IdSequence::default();
    let (catalog, report) = build_catalog(providers, &mut ids)?;

    tracing::info!(instances = catalog.len(), "Saving catalog");
    emitter::save(&catalog, output)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbcost_core::config::FilterConfig;
    use dbcost_core::{ChargeType, EngineType, Error, InstancePayload, Offer, OfferType};
    use dbcost_ingestion::{AwsClient, FeedSource, OfferClient};
    use std::cell::Cell;
    use std::collections::HashSet;
    use std::rc::Rc;

    struct FixedOffers(Vec<Offer>);

    impl OfferClient for FixedOffers {
        fn get_offers(&self) -> Result<Vec<Offer>> {
            Ok(self.0.clone())
        }
    }

    struct Failing(fn() -> Error, Rc<Cell<u32>>);

    impl OfferClient for Failing {
        fn get_offers(&self) -> Result<Vec<Offer>> {
            self.1.set(self.1.get() + 1);
            Err((self.0)())
        }
    }

    struct StaticFeed(String);

    impl FeedSource for StaticFeed {
        fn fetch(&self) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn make_offer(sku: &str, name: &str, cpu: &str, region: &str, hourly_usd: f64) -> Offer {
        Offer {
            sku: sku.to_string(),
            term_code: format!("{}.JRTCKXETXF", sku),
            offer_type: OfferType::Instance,
            charge_type: ChargeType::OnDemand,
            charge_payload: None,
            region_list: vec![region.to_string()],
            hourly_usd,
            commitment_usd: 0.0,
            instance_payload: Some(InstancePayload {
                instance_type: name.to_string(),
                instance_family: "General purpose".to_string(),
                cpu: cpu.to_string(),
                memory: "1 GiB".to_string(),
                physical_processor: "Intel Xeon Platinum 8175".to_string(),
                network_performance: "Up to 5 Gigabit".to_string(),
                database_engine: EngineType::MySql,
            }),
            description: String::new(),
            unit: "Hrs".to_string(),
        }
    }

    fn fetch_error() -> Error {
        Error::fetch("connection refused")
    }

    fn parse_error() -> Error {
        Error::parse("malformed offer file")
    }

    #[test]
    fn test_fetch_failure_skips_provider() {
        let calls = Rc::new(Cell::new(0));
        let providers = vec![
            ProviderPair::new(CloudProvider::Aws, Failing(fetch_error, calls.clone())),
            ProviderPair::new(
                CloudProvider::Aws,
                FixedOffers(vec![make_offer("ABC", "db.t3.micro", "2", "us-east-1", 0.017)]),
            ),
        ];

        let (catalog, report) = build_catalog(&providers, &mut IdSequence::default()).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(catalog.len(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.instances, 1);
        assert!(matches!(report.providers[0].status, ProviderStatus::Skipped { .. }));
    }

    #[test]
    fn test_conversion_failure_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dbInstance.json");
        let providers = vec![
            ProviderPair::new(
                CloudProvider::Aws,
                FixedOffers(vec![make_offer("ABC", "db.t3.micro", "2", "us-east-1", 0.017)]),
            ),
            ProviderPair::new(
                CloudProvider::Aws,
                FixedOffers(vec![make_offer("BAD", "db.x1.weird", "N/A", "us-east-1", 0.1)]),
            ),
        ];

        let err = run(&providers, &output).unwrap_err();

        assert!(matches!(err, Error::Parse(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_extraction_failure_aborts_run() {
        let calls = Rc::new(Cell::new(0));
        let providers = vec![ProviderPair::new(
            CloudProvider::Aws,
            Failing(parse_error, calls.clone()),
        )];

        let err = build_catalog(&providers, &mut IdSequence::default()).unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_ids_unique_across_providers() {
        let providers = vec![
            ProviderPair::new(
                CloudProvider::Aws,
                FixedOffers(vec![
                    make_offer("A", "db.t3.micro", "2", "us-east-1", 0.017),
                    make_offer("B", "db.m5.large", "2", "us-east-1", 0.171),
                ]),
            ),
            ProviderPair::new(
                CloudProvider::Aws,
                FixedOffers(vec![make_offer("C", "db.t3.micro", "2", "eu-west-1", 0.018)]),
            ),
        ];

        let (catalog, _) = build_catalog(&providers, &mut IdSequence::default()).unwrap();

        let ids: Vec<i64> = catalog.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_offers_ordered_by_term_code() {
        let mut reserved = make_offer("SKUB", "db.m5.large", "2", "us-east-1", 0.0);
        reserved.term_code = "SKUB.6QCMYABX3D".to_string();
        let providers = vec![ProviderPair::new(
            CloudProvider::Aws,
            FixedOffers(vec![
                make_offer("SKUA", "db.t3.micro", "2", "us-east-1", 0.017),
                make_offer("SKUB", "db.m5.large", "2", "us-east-1", 0.171),
                reserved,
                make_offer("SKUA", "db.t3.micro", "2", "eu-west-1", 0.018),
            ]),
        )];

        let (catalog, _) = build_catalog(&providers, &mut IdSequence::default()).unwrap();

        assert_eq!(catalog[0].name, "db.t3.micro");
        assert_eq!(catalog[0].region_list[0].code, "us-east-1");
        assert_eq!(catalog[0].region_list[1].code, "eu-west-1");

        let codes: Vec<&str> = catalog[1].region_list[0]
            .term_list
            .iter()
            .map(|t| t.code.as_str())
            .collect();
        assert_eq!(codes, vec!["SKUB.6QCMYABX3D", "SKUB.JRTCKXETXF"]);
    }

    #[test]
    fn test_duplicates_removed_before_aggregation() {
        let offer = make_offer("ABC", "db.t3.micro", "2", "us-east-1", 0.017);
        let providers = vec![ProviderPair::new(
            CloudProvider::Aws,
            FixedOffers(vec![offer.clone(), offer]),
        )];

        let (catalog, report) = build_catalog(&providers, &mut IdSequence::default()).unwrap();

        assert_eq!(catalog[0].term_count(), 1);
        assert_eq!(
            report.providers[0].status,
            ProviderStatus::Converted {
                offers: 2,
                duplicates: 1,
                instances: 1,
            }
        );
    }

    #[test]
    fn test_existing_output_rejected_before_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dbInstance.json");
        std::fs::write(&output, "[]").unwrap();

        let calls = Rc::new(Cell::new(0));
        let providers = vec![ProviderPair::new(
            CloudProvider::Aws,
            Failing(fetch_error, calls.clone()),
        )];

        let err = run(&providers, &output).unwrap_err();

        assert!(matches!(err, Error::OutputExists(_)));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_run_from_offer_file() {
        let raw = r#"{
            "products": {
                "SKU1": {
                    "productFamily": "Database Instance",
                    "attributes": {
                        "instanceType": "db.t3.micro", "regionCode": "us-east-1", "vcpu": "2",
                        "memory": "1 GiB", "physicalProcessor": "Intel Xeon Platinum 8175",
                        "deploymentOption": "Single-AZ", "databaseEngine": "PostgreSQL"
                    }
                },
                "SKU2": {
                    "productFamily": "Database Instance",
                    "attributes": {
                        "instanceType": "db.t3.micro", "regionCode": "us-west-2", "vcpu": "2",
                        "memory": "1 GiB", "physicalProcessor": "Intel Xeon Platinum 8175",
                        "deploymentOption": "Single-AZ", "databaseEngine": "PostgreSQL"
                    }
                },
                "SKU3": {
                    "productFamily": "Database Instance",
                    "attributes": {
                        "instanceType": "db.m5.large", "regionCode": "us-east-1", "vcpu": "2",
                        "memory": "8 GiB", "deploymentOption": "Multi-AZ",
                        "databaseEngine": "PostgreSQL"
                    }
                }
            },
            "terms": {
                "OnDemand": {
                    "SKU1": { "SKU1.T": { "priceDimensions": { "SKU1.T.R": {
                        "unit": "Hrs", "pricePerUnit": { "USD": "0.018" } } } } },
                    "SKU2": { "SKU2.T": { "priceDimensions": { "SKU2.T.R": {
                        "unit": "Hrs", "pricePerUnit": { "USD": "0.019" } } } } },
                    "SKU3": { "SKU3.T": { "priceDimensions": { "SKU3.T.R": {
                        "unit": "Hrs", "pricePerUnit": { "USD": "0.342" } } } } }
                }
            }
        }"#;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("data").join("dbInstance.json");
        let providers = vec![ProviderPair::new(
            CloudProvider::Aws,
            AwsClient::with_source(StaticFeed(raw.to_string()), FilterConfig::default()),
        )];

        let report = run(&providers, &output).unwrap();
        let catalog = emitter::load(&output).unwrap();

        assert_eq!(report.instances, 1);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "db.t3.micro");
        assert_eq!(catalog[0].external_id, "SKU1");
        assert_eq!(catalog[0].database_engine, EngineType::Postgres);
        let regions: HashSet<&str> = catalog[0].region_list.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(regions, HashSet::from(["us-east-1", "us-west-2"]));
    }
}
