//! Provider list.

use dbcost_core::{CloudProvider, Config, Result};
use dbcost_ingestion::{AwsClient, OfferClient};

/// A provider and the client fetching its offers.
pub struct ProviderPair {
    pub provider: CloudProvider,
    pub client: Box<dyn OfferClient>,
}

impl ProviderPair {
    pub fn new(provider: CloudProvider, client: impl OfferClient + 'static) -> Self {
        Self {
            provider,
            client: Box::new(client),
        }
    }
}

/// Providers fetched by a normal run, in processing order.
pub fn default_providers(config: &Config, api_key: Option<String>) -> Result<Vec<ProviderPair>> {
    Ok(vec![ProviderPair::new(
        CloudProvider::Aws,
        AwsClient::new(config.feed.aws_endpoint.clone(), api_key, config.filter.clone())?,
    )])
}
