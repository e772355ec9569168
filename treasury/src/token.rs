//! Fungible token collaborator
//!
//! The ledger only ever needs four BEP-20 style calls. `TokenBank` keys each
//! of them by token address so the same collaborator can serve the primary
//! token and any stray token swept by `return_token`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::types::{Address, Amount};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("transfer amount exceeds balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    #[error("insufficient allowance: requested {requested}, available {available}")]
    InsufficientAllowance { requested: Amount, available: Amount },

    #[error("transfer rejected: {0}")]
    TransferRejected(String),
}

/// Narrow view of a fungible token contract
pub trait TokenBank {
    fn balance_of(&self, token: &Address, holder: &Address) -> Amount;

    /// Move `amount` from `from` (the caller of the token contract) to `to`
    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to`, spending `spender`'s allowance
    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;

    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount;
}

/// Multi-token in-memory ledger for tests and off-chain simulation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryTokenBank {
    /// token -> holder -> balance
    balances: HashMap<Address, HashMap<Address, Amount>>,
    /// token -> owner -> spender -> allowance
    allowances: HashMap<Address, HashMap<Address, HashMap<Address, Amount>>>,
}

impl InMemoryTokenBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `token` to `holder` out of thin air
    pub fn mint(&mut self, token: &Address, holder: &Address, amount: Amount) {
        let balance = self
            .balances
            .entry(token.clone())
            .or_default()
            .entry(holder.clone())
            .or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Set `spender`'s allowance over `owner`'s tokens
    pub fn approve(&mut self, token: &Address, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances
            .entry(token.clone())
            .or_default()
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
    }

    /// Total supply of `token` across all holders
    pub fn total_supply(&self, token: &Address) -> Amount {
        self.balances
            .get(token)
            .map(|holders| holders.values().sum())
            .unwrap_or(0)
    }

    fn move_balance(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::TransferRejected(
                "transfer to the zero address".to_string(),
            ));
        }

        let available = self.balance_of(token, from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        let holders = self.balances.entry(token.clone()).or_default();
        holders.insert(from.clone(), available - amount);
        let credit = holders.entry(to.clone()).or_default();
        *credit = credit.saturating_add(amount);
        Ok(())
    }
}

impl TokenBank for InMemoryTokenBank {
    fn balance_of(&self, token: &Address, holder: &Address) -> Amount {
        self.balances
            .get(token)
            .and_then(|holders| holders.get(holder))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.move_balance(token, from, to, amount)
    }

    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let allowed = self.allowance(token, from, spender);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                requested: amount,
                available: allowed,
            });
        }

        self.move_balance(token, from, to, amount)?;
        self.approve(token, from, spender, allowed - amount);
        Ok(())
    }

    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(token)
            .and_then(|owners| owners.get(owner))
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }
}
