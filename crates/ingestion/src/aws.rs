//! Offer extraction from the AWS offer file.
//!
//! The offer file carries instance specifications (`products`) and prices
//! (`terms`) as two separate object graphs that share only the SKU. Products
//! are indexed by SKU once, then every price term is joined against the index.

use crate::feed::{FeedSource, HttpFeedSource, OfferClient};
use dbcost_core::config::FilterConfig;
use dbcost_core::{
    ChargePayload, ChargeType, EngineType, Error, InstancePayload, Offer, OfferType, Result,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Unit of the upfront price dimension of a reserved term.
const UNIT_QUANTITY: &str = "Quantity";

/// The only currency read from `pricePerUnit`.
const CURRENCY_USD: &str = "USD";

/// Top-level AWS offer file.
#[derive(Debug, Deserialize)]
struct Pricing {
    #[serde(default)]
    products: BTreeMap<String, ProductEntry>,
    /// chargeType -> SKU -> termCode -> term
    #[serde(default)]
    terms: BTreeMap<String, BTreeMap<String, BTreeMap<String, PriceRaw>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductEntry {
    #[serde(default)]
    product_family: String,
    #[serde(default)]
    attributes: ProductAttributes,
}

/// Product attributes. AWS calls the vCPU count `vcpu`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProductAttributes {
    instance_type: String,
    instance_family: String,
    region_code: String,
    vcpu: String,
    memory: String,
    physical_processor: String,
    network_performance: String,
    deployment_option: String,
    database_engine: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceDimensionRaw {
    #[serde(default)]
    description: String,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    price_per_unit: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceRaw {
    #[serde(default)]
    price_dimensions: BTreeMap<String, PriceDimensionRaw>,
    #[serde(default)]
    term_attributes: Option<TermAttributesRaw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TermAttributesRaw {
    #[serde(rename = "LeaseContractLength", alias = "leaseContractLength")]
    lease_contract_length: String,
    #[serde(rename = "PurchaseOption", alias = "purchaseOption")]
    purchase_option: String,
}

/// Statistics about one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Price terms read from the document.
    pub term_offers: u64,
    /// Offers joined with an eligible product.
    pub linked_offers: u64,
    /// Offers dropped because their product failed the family/deployment filter.
    pub filtered_offers: u64,
    /// Offers dropped because their product's engine is unrecognized.
    pub unknown_engine_offers: u64,
    /// Offers without any product entry, kept as price-only records.
    pub price_only_offers: u64,
}

impl ExtractionStats {
    /// Offers delivered to the caller.
    pub fn delivered(&self) -> u64 {
        self.linked_offers + self.price_only_offers
    }
}

/// What a SKU joins to.
enum ProductLink {
    Eligible {
        region_code: String,
        instance: InstancePayload,
    },
    Filtered,
    UnknownEngine,
}

/// Index products by SKU, resolving eligibility once per product.
fn index_products(
    products: &BTreeMap<String, ProductEntry>,
    filter: &FilterConfig,
) -> HashMap<String, ProductLink> {
    products
        .iter()
        .map(|(sku, entry)| {
            let attrs = &entry.attributes;
            let link = if !filter.accepts(&entry.product_family, &attrs.deployment_option) {
                ProductLink::Filtered
            } else {
                match EngineType::from_vendor(&attrs.database_engine) {
                    EngineType::Unrecognized => ProductLink::UnknownEngine,
                    engine => ProductLink::Eligible {
                        region_code: attrs.region_code.clone(),
                        instance: InstancePayload {
                            instance_type: attrs.instance_type.clone(),
                            instance_family: attrs.instance_family.clone(),
                            cpu: attrs.vcpu.clone(),
                            memory: attrs.memory.clone(),
                            physical_processor: attrs.physical_processor.clone(),
                            network_performance: attrs.network_performance.clone(),
                            database_engine: engine,
                        },
                    },
                }
            };
            (sku.clone(), link)
        })
        .collect()
}

/// Build the price part of an offer from a raw term.
fn price_offer(
    charge_type: ChargeType,
    sku: &str,
    term_code: &str,
    raw: &PriceRaw,
) -> Result<Offer> {
    let charge_payload = match charge_type {
        ChargeType::OnDemand => None,
        ChargeType::Reserved => {
            let attrs = raw.term_attributes.as_ref().ok_or_else(|| {
                Error::parse(format!("reserved term {} has no termAttributes", term_code))
            })?;
            if attrs.lease_contract_length.is_empty() || attrs.purchase_option.is_empty() {
                return Err(Error::parse(format!(
                    "reserved term {} lacks LeaseContractLength or PurchaseOption",
                    term_code
                )));
            }
            Some(ChargePayload {
                lease_contract_length: attrs.lease_contract_length.clone(),
                purchase_option: attrs.purchase_option.clone(),
            })
        }
    };

    let mut offer = Offer {
        sku: sku.to_string(),
        term_code: term_code.to_string(),
        // AWS only prices whole instances
        offer_type: OfferType::Instance,
        charge_type,
        charge_payload,
        region_list: Vec::new(),
        hourly_usd: 0.0,
        commitment_usd: 0.0,
        instance_payload: None,
        description: String::new(),
        unit: String::new(),
    };

    // A term may charge an upfront fee and an hourly fee as separate dimensions.
    for (rate_code, dimension) in &raw.price_dimensions {
        let text = dimension.price_per_unit.get(CURRENCY_USD).ok_or_else(|| {
            Error::parse(format!("price dimension {} has no {} price", rate_code, CURRENCY_USD))
        })?;
        let usd = text.trim().parse::<f64>().map_err(|e| {
            Error::parse(format!(
                "price dimension {} has a non-numeric {} price {:?}: {}",
                rate_code, CURRENCY_USD, text, e
            ))
        })?;

        if dimension.unit == UNIT_QUANTITY {
            offer.commitment_usd = usd;
        } else {
            offer.hourly_usd = usd;
            offer.description = dimension.description.clone();
            offer.unit = dimension.unit.clone();
        }
    }

    Ok(offer)
}

/// Extract offer records from an AWS offer file.
///
/// Offers are produced in charge type, SKU, then term code order. The seeding
/// pipeline re-sorts them by term code before dedup. Any malformed
/// value fails the whole call; there are no partial results.
pub fn extract_offers(raw: &str, filter: &FilterConfig) -> Result<(Vec<Offer>, ExtractionStats)> {
    let pricing: Pricing = serde_json::from_str(raw)
        .map_err(|e| Error::parse(format!("malformed offer file: {}", e)))?;

    let products = index_products(&pricing.products, filter);
    let mut stats = ExtractionStats::default();
    let mut offers = Vec::new();

    for (charge_key, by_sku) in &pricing.terms {
        let charge_type = ChargeType::from_vendor(charge_key)?;

        for (sku, by_term) in by_sku {
            for (term_code, raw_term) in by_term {
                stats.term_offers += 1;
                let mut offer = price_offer(charge_type, sku, term_code, raw_term)?;

                match products.get(sku) {
                    Some(ProductLink::Eligible { region_code, instance }) => {
                        offer.region_list = vec![region_code.clone()];
                        offer.instance_payload = Some(instance.clone());
                        stats.linked_offers += 1;
                    }
                    Some(ProductLink::Filtered) => {
                        stats.filtered_offers += 1;
                        continue;
                    }
                    Some(ProductLink::UnknownEngine) => {
                        tracing::debug!(sku = %sku, term_code = %term_code, "Dropping offer with unrecognized engine");
                        stats.unknown_engine_offers += 1;
                        continue;
                    }
                    None => {
                        stats.price_only_offers += 1;
                    }
                }

                offer.validate()?;
                offers.push(offer);
            }
        }
    }

    Ok((offers, stats))
}

/// Offer client for the AWS RDS offer file.
pub struct AwsClient<S = HttpFeedSource> {
    source: S,
    filter: FilterConfig,
}

impl AwsClient<HttpFeedSource> {
    /// Create a client reading the offer file over HTTP.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        filter: FilterConfig,
    ) -> Result<Self> {
        Ok(Self::with_source(HttpFeedSource::new(endpoint, api_key)?, filter))
    }
}

impl<S: FeedSource> AwsClient<S> {
    /// Create a client over any feed source.
    pub fn with_source(source: S, filter: FilterConfig) -> Self {
        Self { source, filter }
    }
}

impl<S: FeedSource> OfferClient for AwsClient<S> {
    fn get_offers(&self) -> Result<Vec<Offer>> {
        let raw = self.source.fetch()?;
        let (offers, stats) = extract_offers(&raw, &self.filter)?;

        tracing::info!(
            terms = stats.term_offers,
            linked = stats.linked_offers,
            filtered = stats.filtered_offers,
            unknown_engine = stats.unknown_engine_offers,
            price_only = stats.price_only_offers,
            "Extracted AWS offers"
        );
        Ok(offers)
    }
}
