//! Stack configuration
//!
//! Account and region are passed explicitly to every [`StackGraph`]
//! instead of living in process-wide state.
//!
//! [`StackGraph`]: crate::graph::StackGraph

use crate::error::{CompositionError, Result};
use serde::{Deserialize, Serialize};

/// Target account and region for a stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackConfig {
    /// 12-digit account id
    pub account: String,
    /// Region name such as `us-east-1`
    pub region: String,
}

impl StackConfig {
    /// Create a validated configuration
    ///
    /// # Errors
    /// `InvalidStackConfig` if the account is not 12 digits or the region is
    /// not of the form `xx-name-N`.
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Result<Self> {
        let config = Self {
            account: account.into(),
            region: region.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document with `account` and `region` keys
    ///
    /// # Errors
    /// `InvalidStackConfig` on parse failure or invalid values.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| CompositionError::InvalidStackConfig(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate account and region
    ///
    /// # Errors
    /// `InvalidStackConfig` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.account.len() != 12 || !self.account.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CompositionError::InvalidStackConfig(format!(
                "account `{}` must be 12 digits",
                self.account
            )));
        }

        if !is_region(&self.region) {
            return Err(CompositionError::InvalidStackConfig(format!(
                "region `{}` is not a valid region name",
                self.region
            )));
        }

        Ok(())
    }
}

// e.g. us-east-1, ap-southeast-2, us-gov-west-1
fn is_region(region: &str) -> bool {
    let parts: Vec<&str> = region.split('-').collect();
    if parts.len() < 3 {
        return false;
    }
    let Some((number, words)) = parts.split_last() else {
        return false;
    };
    !number.is_empty()
        && number.bytes().all(|b| b.is_ascii_digit())
        && words
            .iter()
            .all(|w| !w.is_empty() && w.bytes().all(|b| b.is_ascii_lowercase()))
}
