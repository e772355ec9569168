//! Primitive ledger types: identities, amounts, and the per-call context.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token amount in base units.
pub type Amount = u128;

/// Seconds since the Unix epoch, as observed by the caller.
pub type Timestamp = u64;

/// Decimals of the treasury token (BEP-20 default).
pub const TOKEN_DECIMALS: u32 = 18;

/// One whole token in base units.
pub const ONE_TOKEN: Amount = 1_000_000_000_000_000_000;

/// Thirty days, the production disbursement cadence.
pub const DEFAULT_DISBURSE_INTERVAL: u64 = 30 * 86400;

/// Twelve monthly periods.
pub const DEFAULT_RANGE: u64 = 12;

/// Convert base units to whole tokens (display only, lossy)
pub fn as_tokens(amount: Amount) -> f64 {
    amount as f64 / ONE_TOKEN as f64
}

/// Account or contract identity.
///
/// Addresses are opaque strings. The empty string and any `0x` string made
/// only of zero digits are treated as the null address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Canonical 20-byte zero address
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(40)))
    }

    pub fn is_zero(&self) -> bool {
        let trimmed = self.0.trim();
        if trimmed.is_empty() {
            return true;
        }
        match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(digits) => digits.chars().all(|c| c == '0'),
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Who is calling and what time it is.
///
/// The ledger never reads a clock on its own; block time (or wall time in an
/// off-chain deployment) is supplied with every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: impl Into<Address>, now: Timestamp) -> Self {
        Self {
            caller: caller.into(),
            now,
        }
    }
}
