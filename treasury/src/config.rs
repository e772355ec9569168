//! Treasury configuration (treasury.toml)
//!
//! Example:
//!
//! ```toml
//! treasury_address = "0xba3Ec8d7b4199D78Ac36Dd9094486949aD76B54d"
//! token = "0x29a63F4B209C29B4DC47f06FFA896F32667DAD2C"
//! staking_address = "0xFb1D31a3f51Fb9422c187492D8EA14921d6ea6aE"
//! owner = "0x2027E055201E26b1bFE33Eb923b3fdb7E6f30807"
//! disburse_interval_secs = 2592000
//! range = 12
//! policy = "fraction_of_live_balance"
//! accounting = "pull"
//! access = "tiered"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::access::AccessPreset;
use crate::error::{Result, TreasuryError};
use crate::policy::{AccountingMode, DisbursePolicy};
use crate::types::{Address, DEFAULT_DISBURSE_INTERVAL, DEFAULT_RANGE};

/// Whole tokens approved per `approve_allowance` call (scaled by decimals)
pub const DEFAULT_APPROVAL_CAP_TOKENS: u64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryConfig {
    /// Identity the treasury holds tokens under
    pub treasury_address: Address,
    pub token: Address,
    pub staking_address: Address,
    pub owner: Address,

    #[serde(default = "default_interval")]
    pub disburse_interval_secs: u64,

    #[serde(default = "default_range")]
    pub range: u64,

    /// Upper bound for `update_range`; 0 means unbounded
    #[serde(default = "default_max_range")]
    pub max_range: u64,

    #[serde(default)]
    pub policy: DisbursePolicy,

    #[serde(default = "default_true")]
    pub zero_means_default: bool,

    #[serde(default)]
    pub accounting: AccountingMode,

    #[serde(default)]
    pub access: AccessPreset,

    #[serde(default = "default_approval_cap")]
    pub approval_cap_tokens: u64,
}

fn default_interval() -> u64 {
    DEFAULT_DISBURSE_INTERVAL
}

fn default_range() -> u64 {
    DEFAULT_RANGE
}

fn default_max_range() -> u64 {
    DEFAULT_RANGE
}

fn default_true() -> bool {
    true
}

fn default_approval_cap() -> u64 {
    DEFAULT_APPROVAL_CAP_TOKENS
}

impl TreasuryConfig {
    /// Config with defaults for everything but the four identities
    pub fn new(
        treasury_address: impl Into<Address>,
        token: impl Into<Address>,
        staking_address: impl Into<Address>,
        owner: impl Into<Address>,
    ) -> Self {
        Self {
            treasury_address: treasury_address.into(),
            token: token.into(),
            staking_address: staking_address.into(),
            owner: owner.into(),
            disburse_interval_secs: default_interval(),
            range: default_range(),
            max_range: default_max_range(),
            policy: DisbursePolicy::default(),
            zero_means_default: true,
            accounting: AccountingMode::default(),
            access: AccessPreset::default(),
            approval_cap_tokens: default_approval_cap(),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| TreasuryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            TreasuryError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TreasuryError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        for (field, address) in [
            ("treasury_address", &self.treasury_address),
            ("token", &self.token),
            ("staking_address", &self.staking_address),
            ("owner", &self.owner),
        ] {
            if address.is_zero() {
                return Err(TreasuryError::InvalidAddress(format!(
                    "{} must not be the zero address",
                    field
                )));
            }
        }

        validate_range(self.range, self.max_range)
    }
}

/// `range` must be in `1..=max_range` (`max_range` 0 is unbounded)
pub fn validate_range(range: u64, max_range: u64) -> Result<()> {
    let max = if max_range == 0 { u64::MAX } else { max_range };
    if range == 0 || range > max {
        return Err(TreasuryError::InvalidRange { range, max });
    }
    Ok(())
}
