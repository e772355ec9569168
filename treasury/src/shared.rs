//! Serialized handle to a treasury shared across threads
//!
//! Calls from different threads queue on the lock and run one at a time.
//! A call that re-enters the same treasury while an operation is in flight
//! (for instance a token collaborator calling back during a transfer) is
//! rejected with `ReentrantCall`.

use log::warn;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::Arc;

use crate::access::Role;
use crate::error::{Result, TreasuryError};
use crate::ledger::{Treasury, TreasuryStats, TreasurySnapshot};
use crate::token::TokenBank;
use crate::types::{Address, Amount, CallContext};

pub struct SharedTreasury<B: TokenBank> {
    inner: Arc<ReentrantMutex<RefCell<Treasury<B>>>>,
}

impl<B: TokenBank> Clone for SharedTreasury<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: TokenBank> SharedTreasury<B> {
    pub fn new(treasury: Treasury<B>) -> Self {
        Self {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(treasury))),
        }
    }

    /// Read access; fails if called from inside an in-flight mutation
    pub fn with<R>(&self, f: impl FnOnce(&Treasury<B>) -> R) -> Result<R> {
        let guard = self.inner.lock();
        let treasury = guard.try_borrow().map_err(|_| {
            warn!("Rejected read of treasury during an in-flight operation");
            TreasuryError::ReentrantCall
        })?;
        Ok(f(&treasury))
    }

    /// Exclusive access for one operation
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Treasury<B>) -> Result<R>) -> Result<R> {
        let guard = self.inner.lock();
        let mut treasury = guard.try_borrow_mut().map_err(|_| {
            warn!("Rejected reentrant call into treasury");
            TreasuryError::ReentrantCall
        })?;
        f(&mut treasury)
    }

    pub fn deposit(&self, ctx: &CallContext, amount: Amount) -> Result<()> {
        self.with_mut(|t| t.deposit(ctx, amount))
    }

    pub fn disburse(&self, ctx: &CallContext, amount: Amount) -> Result<Amount> {
        self.with_mut(|t| t.disburse(ctx, amount))
    }

    pub fn owner_disburse(&self, ctx: &CallContext, amount: Amount) -> Result<Amount> {
        self.with_mut(|t| t.owner_disburse(ctx, amount))
    }

    pub fn governor_disburse(&self, ctx: &CallContext, amount: Amount) -> Result<Amount> {
        self.with_mut(|t| t.governor_disburse(ctx, amount))
    }

    pub fn operator_disburse(&self, ctx: &CallContext, amount: Amount) -> Result<Amount> {
        self.with_mut(|t| t.operator_disburse(ctx, amount))
    }

    pub fn return_token(
        &self,
        ctx: &CallContext,
        token: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        self.with_mut(|t| t.return_token(ctx, token, to, amount))
    }

    pub fn update_staking_address(&self, ctx: &CallContext, staking: Address) -> Result<()> {
        self.with_mut(|t| t.update_staking_address(ctx, staking))
    }

    pub fn update_disburse_interval(&self, ctx: &CallContext, seconds: u64) -> Result<()> {
        self.with_mut(|t| t.update_disburse_interval(ctx, seconds))
    }

    pub fn update_range(&self, ctx: &CallContext, range: u64) -> Result<()> {
        self.with_mut(|t| t.update_range(ctx, range))
    }

    pub fn update_token(&self, ctx: &CallContext, token: Address) -> Result<()> {
        self.with_mut(|t| t.update_token(ctx, token))
    }

    pub fn approve_allowance(&self, ctx: &CallContext, decimals: u32) -> Result<Amount> {
        self.with_mut(|t| t.approve_allowance(ctx, decimals))
    }

    pub fn set_approval(&self, ctx: &CallContext, approved: bool) -> Result<()> {
        self.with_mut(|t| t.set_approval(ctx, approved))
    }

    pub fn grant_role(&self, ctx: &CallContext, role: Role, account: &Address) -> Result<bool> {
        self.with_mut(|t| t.grant_role(ctx, role, account))
    }

    pub fn revoke_role(&self, ctx: &CallContext, role: Role, account: &Address) -> Result<bool> {
        self.with_mut(|t| t.revoke_role(ctx, role, account))
    }

    pub fn stats(&self) -> Result<TreasuryStats> {
        self.with(|t| t.stats())
    }

    pub fn snapshot(&self) -> Result<TreasurySnapshot> {
        self.with(|t| t.snapshot())
    }
}
