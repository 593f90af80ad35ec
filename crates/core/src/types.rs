//! Core data types for the dbcost catalog builder.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Sequential catalog identifier of a [`DbInstance`].
pub type InstanceId = i64;

/// Unix timestamp in seconds (UTC).
pub type TimestampSec = i64;

/// Principal recorded as creator/updater of seeded rows.
pub const SYSTEM_BOT_ID: i32 = 1;

/// Cloud vendor a catalog entry was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloudProvider {
    #[serde(rename = "AWS")]
    Aws,
}

impl CloudProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            CloudProvider::Aws => "AWS",
        }
    }
}

impl std::fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database engine of an instance offer.
///
/// Prices for the same instance type differ between engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineType {
    #[serde(rename = "MYSQL")]
    MySql,
    #[serde(rename = "POSTGRES")]
    Postgres,
    #[serde(rename = "ORACLE")]
    Oracle,
    #[serde(rename = "SQLSERVER")]
    SqlServer,
    /// Any vendor engine string without a mapping. Never emitted in a catalog.
    #[serde(rename = "UNKNOWN")]
    Unrecognized,
}

impl EngineType {
    /// Map a vendor `databaseEngine` attribute onto an engine.
    pub fn from_vendor(engine: &str) -> Self {
        match engine {
            "MySQL" => EngineType::MySql,
            "PostgreSQL" => EngineType::Postgres,
            "Oracle" => EngineType::Oracle,
            "SQL Server" => EngineType::SqlServer,
            _ => EngineType::Unrecognized,
        }
    }

    /// Whether the engine maps onto a supported catalog engine.
    #[inline]
    pub fn is_recognized(self) -> bool {
        self != EngineType::Unrecognized
    }
}

/// Granularity of what an offer prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferType {
    /// A whole instance.
    Instance,
    /// Per-unit memory.
    #[serde(rename = "RAM")]
    Ram,
    /// Per-unit vCPU.
    #[serde(rename = "CPU")]
    Cpu,
}

/// Billing model of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChargeType {
    /// Pay per hour.
    OnDemand,
    /// Commitment for a discount.
    Reserved,
}

impl ChargeType {
    /// Parse a vendor charge type key.
    pub fn from_vendor(charge_type: &str) -> Result<Self> {
        match charge_type {
            "OnDemand" => Ok(ChargeType::OnDemand),
            "Reserved" => Ok(ChargeType::Reserved),
            other => Err(Error::parse(format!("unknown charge type: {:?}", other))),
        }
    }
}

/// Reserved-pricing parameters of an offer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargePayload {
    /// Commitment duration (e.g., "1yr", "3yr").
    pub lease_contract_length: String,
    /// Upfront payment style (e.g., "All Upfront", "No Upfront").
    pub purchase_option: String,
}

/// Instance specification attached to an instance offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancePayload {
    /// Instance type (e.g., "db.t3.micro"); the catalog grouping key.
    #[serde(rename = "type")]
    pub instance_type: String,
    pub instance_family: String,
    /// vCPU count as numeric text.
    pub cpu: String,
    /// Memory as vendor text (e.g., "1 GiB").
    pub memory: String,
    pub physical_processor: String,
    pub network_performance: String,
    pub database_engine: EngineType,
}

/// One priced unit from a vendor feed, independent of the vendor wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    /// Vendor product identifier (e.g., "9QH3PUGXCYKNCYPB").
    pub sku: String,
    /// Pricing term identifier (e.g., "9QH3PUGXCYKNCYPB.HU7G6KETJZ").
    pub term_code: String,
    pub offer_type: OfferType,
    pub charge_type: ChargeType,
    /// Present iff `charge_type` is `Reserved`.
    pub charge_payload: Option<ChargePayload>,
    /// Region codes this exact price applies to.
    pub region_list: Vec<String>,
    /// Hourly rate in USD.
    pub hourly_usd: f64,
    /// Upfront fee in USD, zero when not applicable.
    pub commitment_usd: f64,
    /// Only instance offers linked to a product carry one.
    pub instance_payload: Option<InstancePayload>,
    /// Vendor description of the price dimension.
    pub description: String,
    /// Vendor billing unit of the hourly dimension (e.g., "Hrs").
    pub unit: String,
}

impl Offer {
    /// Whether this offer carries an instance specification.
    #[inline]
    pub fn is_instance(&self) -> bool {
        self.instance_payload.is_some()
    }

    /// Check the record invariants of the offer model.
    pub fn validate(&self) -> Result<()> {
        match (self.charge_type, &self.charge_payload) {
            (ChargeType::Reserved, None) => {
                return Err(Error::parse(format!(
                    "reserved offer {} has no charge payload",
                    self.term_code
                )));
            }
            (ChargeType::OnDemand, Some(_)) => {
                return Err(Error::parse(format!(
                    "on-demand offer {} carries a charge payload",
                    self.term_code
                )));
            }
            _ => {}
        }

        if let Some(payload) = &self.instance_payload {
            if self.offer_type != OfferType::Instance {
                return Err(Error::parse(format!(
                    "offer {} of type {:?} carries an instance payload",
                    self.term_code, self.offer_type
                )));
            }
            if !payload.database_engine.is_recognized() {
                return Err(Error::parse(format!(
                    "offer {} has an unrecognized database engine",
                    self.term_code
                )));
            }
            if self.region_list.is_empty() {
                return Err(Error::parse(format!(
                    "instance offer {} has no region",
                    self.term_code
                )));
            }
        }

        for (field, value) in [("hourlyUSD", self.hourly_usd), ("commitmentUSD", self.commitment_usd)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::parse(format!(
                    "offer {} has invalid {}: {}",
                    self.term_code, field, value
                )));
            }
        }

        Ok(())
    }
}

/// Monotonic catalog ID counter shared by every provider of one run.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    next: InstanceId,
}

impl IdSequence {
    /// Create a sequence whose first ID is `start`.
    pub fn new(start: InstanceId) -> Self {
        Self { next: start }
    }

    /// Take the next ID.
    pub fn next_id(&mut self) -> InstanceId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The ID the next call to `next_id` returns.
    pub fn peek(&self) -> InstanceId {
        self.next
    }
}

/// Lifecycle status of a catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    Normal,
    Archived,
}

/// Reserved-pricing parameters of a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermPayload {
    /// e.g. "3yr", "1yr".
    pub lease_contract_length: String,
    /// e.g. "All Upfront", "Partial Upfront".
    pub purchase_option: String,
}

impl From<&ChargePayload> for TermPayload {
    fn from(p: &ChargePayload) -> Self {
        Self {
            lease_contract_length: p.lease_contract_length.clone(),
            purchase_option: p.purchase_option.clone(),
        }
    }
}

/// One concrete pricing entry of an instance in a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub code: String,
    pub database_engine: EngineType,
    #[serde(rename = "type")]
    pub charge_type: ChargeType,
    /// Present iff `charge_type` is `Reserved`.
    pub payload: Option<TermPayload>,
    #[serde(rename = "hourlyUSD")]
    pub hourly_usd: f64,
    #[serde(rename = "commitmentUSD")]
    pub commitment_usd: f64,
}

impl Term {
    /// Build the term priced by an instance offer.
    ///
    /// Returns `None` for offers without an instance payload.
    pub fn from_offer(offer: &Offer) -> Option<Self> {
        let instance = offer.instance_payload.as_ref()?;
        let payload = match offer.charge_type {
            ChargeType::Reserved => offer.charge_payload.as_ref().map(TermPayload::from),
            ChargeType::OnDemand => None,
        };

        Some(Self {
            code: offer.term_code.clone(),
            database_engine: instance.database_engine,
            charge_type: offer.charge_type,
            payload,
            hourly_usd: offer.hourly_usd,
            commitment_usd: offer.commitment_usd,
        })
    }
}

/// Region-price info of an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub code: String,
    pub term_list: Vec<Term>,
}

/// Canonical, deduplicated database instance type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbInstance {
    // system fields
    pub id: InstanceId,
    /// SKU of the first offer seen for this instance type.
    pub external_id: String,
    pub row_status: RowStatus,
    pub creator_id: i32,
    pub created_ts: TimestampSec,
    pub updater_id: i32,
    pub updated_ts: TimestampSec,

    // domain fields
    pub cloud_provider: CloudProvider,
    /// Instance type, unique within the catalog (e.g., "db.m3.large").
    pub name: String,
    pub cpu: u32,
    pub memory: String,
    pub processor: String,
    /// Engine every term under this instance is priced for.
    pub database_engine: EngineType,

    // region-price info
    pub region_list: Vec<Region>,
}

impl DbInstance {
    /// Find a region by code.
    pub fn region(&self, code: &str) -> Option<&Region> {
        self.region_list.iter().find(|r| r.code == code)
    }

    /// Total number of terms across all regions.
    pub fn term_count(&self) -> usize {
        self.region_list.iter().map(|r| r.term_list.len()).sum()
    }
}
