//! Treasury error types

use thiserror::Error;

use crate::access::Role;
use crate::token::TokenError;
use crate::types::{Address, Amount, Timestamp};

/// Treasury ledger errors
///
/// Every variant aborts the whole operation; the ledger is left exactly as it
/// was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    #[error("Unauthorized: {caller} is missing role {required}")]
    Unauthorized { required: Role, caller: Address },

    #[error("Disbursement interval not reached: next disbursement allowed at {next_allowed_at}, now {now}")]
    IntervalNotReached {
        next_allowed_at: Timestamp,
        now: Timestamp,
    },

    #[error("Insufficient tokens in treasury: requested {requested}, available {available}")]
    ExceedsBalance { requested: Amount, available: Amount },

    #[error("Disburse amount {requested} exceeds default disburse amount {ceiling}")]
    ExceedsDefaultAmount { requested: Amount, ceiling: Amount },

    #[error("Treasury remaining deposit {remaining} is less than default disburse amount {floor}")]
    InsufficientRemainingDeposit { remaining: Amount, floor: Amount },

    #[error("Invalid range {range}: must be between 1 and {max}")]
    InvalidRange { range: u64, max: u64 },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Insufficient allowance: requested {requested}, available {available}")]
    InsufficientAllowance { requested: Amount, available: Amount },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("The owner role is fixed at construction and cannot be granted or revoked")]
    OwnerRoleFixed,

    #[error("Reentrant call rejected: another operation is in flight on this treasury")]
    ReentrantCall,

    #[error("Arithmetic overflow in treasury counters")]
    Overflow,

    #[error("Token transfer failed: {0}")]
    TransferFailed(#[from] TokenError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, TreasuryError>;
