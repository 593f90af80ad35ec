//! Configuration structures for the dbcost catalog builder.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// AWS RDS offer index. See
/// https://docs.aws.amazon.com/awsaccountbilling/latest/aboutv2/reading-an-offer.html
pub const AWS_RDS_OFFER_ENDPOINT: &str =
    "https://pricing.us-east-1.amazonaws.com/offers/v1.0/aws/AmazonRDS/current/index.json";

/// Main configuration for a seeding run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vendor feed configuration.
    pub feed: FeedConfig,
    /// Product eligibility filter.
    pub filter: FilterConfig,
    /// Catalog output configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a JSON file. Missing sections keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Full path of the catalog file.
    pub fn output_path(&self) -> PathBuf {
        self.output.dir.join(&self.output.file_name)
    }
}

/// Vendor feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Endpoint serving the AWS offer document.
    pub aws_endpoint: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            aws_endpoint: AWS_RDS_OFFER_ENDPOINT.to_string(),
        }
    }
}

/// Which vendor products are eligible for the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Required `productFamily` of a product.
    pub product_family: String,
    /// Required `deploymentOption` of a product.
    pub deployment_option: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            product_family: "Database Instance".to_string(),
            deployment_option: "Single-AZ".to_string(),
        }
    }
}

impl FilterConfig {
    /// Check a product's family and deployment option.
    pub fn accepts(&self, product_family: &str, deployment_option: &str) -> bool {
        product_family == self.product_family && deployment_option == self.deployment_option
    }
}

/// Catalog output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding the catalog file.
    pub dir: PathBuf,
    /// Catalog file name.
    pub file_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            file_name: "dbInstance.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.filter.product_family, "Database Instance");
        assert_eq!(config.filter.deployment_option, "Single-AZ");
        assert_eq!(config.output_path(), PathBuf::from("data/dbInstance.json"));
        assert_eq!(config.feed.aws_endpoint, AWS_RDS_OFFER_ENDPOINT);
    }

    #[test]
    fn test_filter_accepts() {
        let filter = FilterConfig::default();
        assert!(filter.accepts("Database Instance", "Single-AZ"));
        assert!(!filter.accepts("Database Storage", "Single-AZ"));
        assert!(!filter.accepts("Database Instance", "Multi-AZ"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"output": {{"dir": "out"}}}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.output_path(), PathBuf::from("out/dbInstance.json"));
        assert_eq!(config.filter.deployment_option, "Single-AZ");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_file("/nonexistent/dbcost.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
