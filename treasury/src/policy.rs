//! Disbursement amount policy
//!
//! The amount released per period went through several formulas. Each is a
//! `DisbursePolicy` variant; all of them feed the same validation path:
//!
//! 1. resolve the effective amount from the caller's request
//! 2. the amount must be covered by the live balance
//! 3. fraction policies cap the amount at one default unit
//! 4. the remainder must be zero or at least one default unit

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreasuryError};
use crate::types::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisbursePolicy {
    /// `deposit_basis / range`; the caller may request less, never more
    FractionOfLastDeposit,
    /// `live_balance / range`; the caller may request less, never more
    #[default]
    FractionOfLiveBalance,
    /// Any caller amount, bounded by the balance and the remainder floor
    CallerSuppliedBounded,
}

/// How deposits reach the treasury and what the deposit basis is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountingMode {
    /// Treasury pulls the deposit from the depositor with `transfer_from`;
    /// basis is the last deposited amount
    #[default]
    Pull,
    /// Tokens are sent to the treasury beforehand and the deposit call only
    /// records them; basis is the balance snapshot taken at deposit time
    Snapshot,
}

/// State the policies read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyInputs {
    pub live_balance: Amount,
    pub deposit_basis: Amount,
    /// Always >= 1, enforced on every write
    pub range: u64,
}

impl DisbursePolicy {
    /// Default disburse amount for the current period
    pub fn default_unit(&self, inputs: &PolicyInputs) -> Amount {
        let divisor = Amount::from(inputs.range.max(1));
        match self {
            DisbursePolicy::FractionOfLastDeposit => inputs.deposit_basis / divisor,
            DisbursePolicy::FractionOfLiveBalance | DisbursePolicy::CallerSuppliedBounded => {
                inputs.live_balance / divisor
            }
        }
    }

    /// Largest amount one disbursement may release, if the policy caps it
    pub fn ceiling(&self, inputs: &PolicyInputs) -> Option<Amount> {
        match self {
            DisbursePolicy::FractionOfLastDeposit | DisbursePolicy::FractionOfLiveBalance => {
                Some(self.default_unit(inputs))
            }
            DisbursePolicy::CallerSuppliedBounded => None,
        }
    }

    /// Turn the caller's requested amount into the amount to disburse
    pub fn resolve(
        &self,
        requested: Amount,
        zero_means_default: bool,
        inputs: &PolicyInputs,
    ) -> Result<Amount> {
        let unit = self.default_unit(inputs);

        let effective = if requested != 0 {
            requested
        } else if zero_means_default || *self == DisbursePolicy::FractionOfLastDeposit {
            // A fixed-fraction disbursement has no explicit form
            unit
        } else {
            return Err(TreasuryError::InvalidAmount(
                "disburse amount must be greater than zero".to_string(),
            ));
        };

        debug!(
            "{:?} resolved request {} to {} (default unit {})",
            self, requested, effective, unit
        );
        Ok(effective)
    }
}

/// Balance, ceiling and remainder checks shared by every policy
///
/// `floor` is the default unit computed before the disbursement.
pub fn check_disbursable(
    effective: Amount,
    live_balance: Amount,
    ceiling: Option<Amount>,
    floor: Amount,
) -> Result<()> {
    if effective > live_balance || (effective == 0 && live_balance == 0) {
        return Err(TreasuryError::ExceedsBalance {
            requested: effective,
            available: live_balance,
        });
    }
    if effective == 0 {
        return Err(TreasuryError::InvalidAmount(
            "resolved disburse amount is zero".to_string(),
        ));
    }

    if let Some(ceiling) = ceiling {
        if effective > ceiling {
            return Err(TreasuryError::ExceedsDefaultAmount {
                requested: effective,
                ceiling,
            });
        }
    }

    let remaining = live_balance - effective;
    if remaining != 0 && remaining < floor {
        return Err(TreasuryError::InsufficientRemainingDeposit { remaining, floor });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ONE_TOKEN;

    fn inputs(live_balance: Amount, deposit_basis: Amount, range: u64) -> PolicyInputs {
        PolicyInputs {
            live_balance,
            deposit_basis,
            range,
        }
    }

    #[test]
    fn test_default_units() {
        let state = inputs(6 * ONE_TOKEN, 12 * ONE_TOKEN, 12);
        assert_eq!(
            DisbursePolicy::FractionOfLastDeposit.default_unit(&state),
            ONE_TOKEN
        );
        assert_eq!(
            DisbursePolicy::FractionOfLiveBalance.default_unit(&state),
            ONE_TOKEN / 2
        );
        assert_eq!(
            DisbursePolicy::CallerSuppliedBounded.default_unit(&state),
            ONE_TOKEN / 2
        );
    }

    #[test]
    fn test_zero_sentinel() {
        let state = inputs(12, 12, 12);
        assert_eq!(
            DisbursePolicy::FractionOfLiveBalance.resolve(0, true, &state),
            Ok(1)
        );
        assert!(matches!(
            DisbursePolicy::FractionOfLiveBalance.resolve(0, false, &state),
            Err(TreasuryError::InvalidAmount(_))
        ));
        assert_eq!(
            DisbursePolicy::FractionOfLastDeposit.resolve(0, false, &state),
            Ok(1)
        );
    }

    #[test]
    fn test_explicit_amounts_pass_through() {
        let state = inputs(1200, 1200, 12);
        assert_eq!(
            DisbursePolicy::FractionOfLiveBalance.resolve(50, true, &state),
            Ok(50)
        );
        assert_eq!(
            DisbursePolicy::FractionOfLiveBalance.resolve(101, true, &state),
            Ok(101)
        );
        assert_eq!(
            DisbursePolicy::CallerSuppliedBounded.resolve(1000, true, &state),
            Ok(1000)
        );
    }

    #[test]
    fn test_ceilings() {
        let state = inputs(1200, 600, 12);
        assert_eq!(DisbursePolicy::FractionOfLastDeposit.ceiling(&state), Some(50));
        assert_eq!(DisbursePolicy::FractionOfLiveBalance.ceiling(&state), Some(100));
        assert_eq!(DisbursePolicy::CallerSuppliedBounded.ceiling(&state), None);
    }

    #[test]
    fn test_check_disbursable() {
        assert_eq!(check_disbursable(100, 1200, Some(100), 100), Ok(()));
        assert_eq!(
            check_disbursable(1300, 1200, None, 100),
            Err(TreasuryError::ExceedsBalance {
                requested: 1300,
                available: 1200
            })
        );
        assert_eq!(
            check_disbursable(1150, 1200, None, 100),
            Err(TreasuryError::InsufficientRemainingDeposit {
                remaining: 50,
                floor: 100
            })
        );
        // Draining to exactly zero is allowed
        assert_eq!(check_disbursable(1200, 1200, None, 100), Ok(()));
        // Remainder exactly at the floor passes
        assert_eq!(check_disbursable(1100, 1200, None, 100), Ok(()));
    }

    #[test]
    fn test_balance_checked_before_ceiling() {
        assert_eq!(
            check_disbursable(1300, 1200, Some(100), 100),
            Err(TreasuryError::ExceedsBalance {
                requested: 1300,
                available: 1200
            })
        );
        assert_eq!(
            check_disbursable(101, 1200, Some(100), 100),
            Err(TreasuryError::ExceedsDefaultAmount {
                requested: 101,
                ceiling: 100
            })
        );
    }

    #[test]
    fn test_zero_amounts() {
        assert!(matches!(
            check_disbursable(0, 0, Some(0), 0),
            Err(TreasuryError::ExceedsBalance { .. })
        ));
        assert!(matches!(
            check_disbursable(0, 5, None, 0),
            Err(TreasuryError::InvalidAmount(_))
        ));
    }
}
