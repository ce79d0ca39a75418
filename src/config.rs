use serde::{Deserialize, Serialize};

use crate::decimal::BPS_DENOMINATOR;
use crate::errors::{LendingError, Result};
use crate::interest::AccrualModel;

/// who may trigger a closing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallerPolicy {
    /// any account
    Permissionless,
    /// only the loan's lender
    LenderOnly,
}

/// ledger-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingConfig {
    pub min_interest_rate_bps: u32,
    pub max_interest_rate_bps: u32,
    pub max_liquidation_threshold_bps: Option<u32>,
    pub allow_self_funding: bool,
    pub liquidation_policy: CallerPolicy,
    pub default_policy: CallerPolicy,
    pub accrual_model: AccrualModel,
    pub block_interval_secs: u64,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            min_interest_rate_bps: 0,
            max_interest_rate_bps: BPS_DENOMINATOR,
            max_liquidation_threshold_bps: None,
            allow_self_funding: false,
            liquidation_policy: CallerPolicy::Permissionless,
            default_policy: CallerPolicy::LenderOnly,
            accrual_model: AccrualModel::Flat,
            block_interval_secs: 600,
        }
    }
}

impl LendingConfig {
    /// parse from json, missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LendingConfig =
            serde_json::from_str(json).map_err(|e| LendingError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_interest_rate_bps > self.max_interest_rate_bps {
            return Err(LendingError::InvalidConfiguration {
                message: format!(
                    "interest rate range is empty: {}..={}",
                    self.min_interest_rate_bps, self.max_interest_rate_bps
                ),
            });
        }
        if self.max_liquidation_threshold_bps == Some(0) {
            return Err(LendingError::InvalidConfiguration {
                message: "max liquidation threshold must be positive".to_string(),
            });
        }
        if self.block_interval_secs == 0 {
            return Err(LendingError::InvalidConfiguration {
                message: "block interval must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// strict lender-only closing rules
    pub fn strict() -> Self {
        Self {
            liquidation_policy: CallerPolicy::LenderOnly,
            default_policy: CallerPolicy::LenderOnly,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LendingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_interest_rate_bps, 10_000);
        assert_eq!(config.liquidation_policy, CallerPolicy::Permissionless);
        assert!(!config.allow_self_funding);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = LendingConfig::from_json(r#"{"max_interest_rate_bps": 2500}"#).unwrap();
        assert_eq!(config.max_interest_rate_bps, 2500);
        assert_eq!(config.block_interval_secs, 600);
        assert_eq!(config.accrual_model, AccrualModel::Flat);
    }

    #[test]
    fn test_rejects_empty_rate_range() {
        let err = LendingConfig::from_json(
            r#"{"min_interest_rate_bps": 500, "max_interest_rate_bps": 100}"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), 116);
    }

    #[test]
    fn test_rejects_zero_block_interval() {
        let config = LendingConfig {
            block_interval_secs: 0,
            ..LendingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(LendingConfig::from_json("{not json").is_err());
    }
}
