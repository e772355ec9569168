//! Audit trail of committed treasury mutations

use serde::{Deserialize, Serialize};

use crate::access::Role;
use crate::types::{Address, Amount, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreasuryEventKind {
    Deposited {
        depositor: Address,
        amount: Amount,
        balance_after: Amount,
    },
    Disbursed {
        operator: Address,
        staking_address: Address,
        amount: Amount,
        balance_after: Amount,
    },
    TokenReturned {
        token: Address,
        to: Address,
        amount: Amount,
    },
    StakingAddressUpdated {
        previous: Address,
        current: Address,
    },
    DisburseIntervalUpdated {
        previous: u64,
        current: u64,
    },
    RangeUpdated {
        previous: u64,
        current: u64,
    },
    TokenUpdated {
        previous: Address,
        current: Address,
    },
    ApprovalSet {
        approved: bool,
        allowance: Amount,
    },
    RoleGranted {
        role: Role,
        account: Address,
        sender: Address,
    },
    RoleRevoked {
        role: Role,
        account: Address,
        sender: Address,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryEvent {
    pub timestamp: Timestamp,
    pub kind: TreasuryEventKind,
}

/// Append-only event log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<TreasuryEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, timestamp: Timestamp, kind: TreasuryEventKind) {
        self.events.push(TreasuryEvent { timestamp, kind });
    }

    pub fn all(&self) -> &[TreasuryEvent] {
        &self.events
    }

    /// Events at or after `timestamp`
    pub fn since(&self, timestamp: Timestamp) -> Vec<&TreasuryEvent> {
        self.events
            .iter()
            .filter(|event| event.timestamp >= timestamp)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
