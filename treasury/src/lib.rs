//! PURSE Treasury Ledger
//!
//! Holds the treasury's PURSE balance and releases it to the staking
//! contract in periodic installments:
//! - Governors (or the owner, in the owner-only layout) deposit funds
//! - Operators disburse at most once per interval
//! - The owner tunes the interval, range, and staking address, and can
//!   sweep residual funds
//!
//! The per-period amount is chosen by a configurable `DisbursePolicy`.

pub mod access;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod policy;
pub mod shared;
pub mod token;
pub mod types;

pub use access::{AccessPolicy, AccessPreset, Operation, Role, RoleTable};
pub use config::{TreasuryConfig, DEFAULT_APPROVAL_CAP_TOKENS};
pub use error::{Result, TreasuryError};
pub use events::{EventLog, TreasuryEvent, TreasuryEventKind};
pub use ledger::{LedgerStatus, Treasury, TreasurySnapshot, TreasuryState, TreasuryStats};
pub use policy::{AccountingMode, DisbursePolicy};
pub use shared::SharedTreasury;
pub use token::{InMemoryTokenBank, TokenBank, TokenError};
pub use types::{
    as_tokens, Address, Amount, CallContext, Timestamp, DEFAULT_DISBURSE_INTERVAL,
    DEFAULT_RANGE, ONE_TOKEN, TOKEN_DECIMALS,
};
