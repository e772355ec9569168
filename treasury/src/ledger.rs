//! Treasury ledger
//!
//! Holds one token on behalf of the treasury address, accepts deposits, and
//! releases a policy-bounded amount to the staking address no more often
//! than once per `disburse_interval`.
//!
//! Every entry point runs its checks first, then the token transfer, and only
//! commits counters once the transfer has succeeded. A rejected call leaves
//! the ledger untouched.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::access::{AccessPolicy, Operation, Role, RoleTable};
use crate::config::{validate_range, TreasuryConfig};
use crate::error::{Result, TreasuryError};
use crate::events::{EventLog, TreasuryEvent, TreasuryEventKind};
use crate::policy::{check_disbursable, AccountingMode, PolicyInputs};
use crate::token::TokenBank;
use crate::types::{as_tokens, Address, Amount, CallContext, Timestamp, TOKEN_DECIMALS};

/// Persistent treasury counters and parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryState {
    pub treasury_address: Address,
    pub token: Address,
    pub staking_address: Address,

    pub deposit_historic_total: Amount,
    pub disburse_historic_total: Amount,

    pub last_deposited_amount: Amount,
    pub last_deposit_timestamp: Timestamp,
    /// Live balance observed right after the last deposit
    pub last_updated_treasury_balance: Amount,

    pub last_disbursed_amount: Amount,
    /// `None` until the first disbursement
    pub last_disbursement_timestamp: Option<Timestamp>,

    /// Portion of the live balance already recorded by a deposit
    pub accounted_balance: Amount,

    pub disburse_interval: u64,
    pub range: u64,

    pub is_approved: bool,
    /// Remaining amount deposits may pull while approved
    pub approved_allowance: Amount,
}

impl TreasuryState {
    fn from_config(config: &TreasuryConfig) -> Self {
        Self {
            treasury_address: config.treasury_address.clone(),
            token: config.token.clone(),
            staking_address: config.staking_address.clone(),
            deposit_historic_total: 0,
            disburse_historic_total: 0,
            last_deposited_amount: 0,
            last_deposit_timestamp: 0,
            last_updated_treasury_balance: 0,
            last_disbursed_amount: 0,
            last_disbursement_timestamp: None,
            accounted_balance: 0,
            disburse_interval: config.disburse_interval_secs,
            range: config.range,
            is_approved: false,
            approved_allowance: 0,
        }
    }
}

/// Lifecycle stage derived from the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerStatus {
    Uninitialized,
    Funded,
    PartiallyDisbursed,
    Depleted,
}

/// Read-only report of every ledger field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryStats {
    pub token: Address,
    pub staking_address: Address,
    pub balance: Amount,
    pub deposit_historic_total: Amount,
    pub disburse_historic_total: Amount,
    pub last_deposited_amount: Amount,
    pub last_deposit_timestamp: Timestamp,
    pub last_updated_treasury_balance: Amount,
    pub last_disbursed_amount: Amount,
    pub last_disbursement_timestamp: Timestamp,
    pub disburse_interval: u64,
    pub range: u64,
    pub current_default_disburse_amount: Amount,
    pub next_disbursement_at: Option<Timestamp>,
    pub is_approved: bool,
    pub status: LedgerStatus,
    pub governors: usize,
    pub operators: usize,
    pub events: usize,
}

impl TreasuryStats {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TreasuryError::SerializationError(e.to_string()))
    }
}

/// Everything needed to bring a ledger back after a restart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasurySnapshot {
    pub state: TreasuryState,
    pub roles: RoleTable,
    /// Permission layout in force when the snapshot was taken, including
    /// overrides installed with `with_access_policy`
    pub access: AccessPolicy,
    pub events: EventLog,
}

pub struct Treasury<B: TokenBank> {
    config: TreasuryConfig,
    state: TreasuryState,
    roles: RoleTable,
    access: AccessPolicy,
    events: EventLog,
    bank: B,
}

impl<B: TokenBank> Treasury<B> {
    /// Deploy a fresh treasury with zeroed counters
    pub fn new(config: TreasuryConfig, bank: B) -> Result<Self> {
        config.validate()?;

        info!(
            "Treasury {} deployed: token {}, staking {}, owner {}, range {}, interval {}s, policy {:?}",
            config.treasury_address,
            config.token,
            config.staking_address,
            config.owner,
            config.range,
            config.disburse_interval_secs,
            config.policy
        );

        Ok(Self {
            state: TreasuryState::from_config(&config),
            roles: RoleTable::with_owner(config.owner.clone()),
            access: AccessPolicy::from_preset(config.access),
            events: EventLog::new(),
            config,
            bank,
        })
    }

    /// Rebuild a ledger from a saved snapshot
    ///
    /// The access policy comes from the snapshot, not from `config.access`.
    pub fn restore(config: TreasuryConfig, snapshot: TreasurySnapshot, bank: B) -> Result<Self> {
        config.validate()?;

        if snapshot.state.treasury_address != config.treasury_address {
            return Err(TreasuryError::Config(format!(
                "snapshot belongs to treasury {}, config names {}",
                snapshot.state.treasury_address, config.treasury_address
            )));
        }
        if snapshot.roles.owner() != Some(&config.owner) {
            return Err(TreasuryError::Config(format!(
                "snapshot owner does not match configured owner {}",
                config.owner
            )));
        }
        validate_range(snapshot.state.range, config.max_range)?;

        info!(
            "Treasury {} restored with {} events",
            config.treasury_address,
            snapshot.events.len()
        );

        Ok(Self {
            state: snapshot.state,
            roles: snapshot.roles,
            access: snapshot.access,
            events: snapshot.events,
            config,
            bank,
        })
    }

    /// Replace the preset permission layout
    pub fn with_access_policy(mut self, access: AccessPolicy) -> Self {
        self.access = access;
        self
    }

    pub fn snapshot(&self) -> TreasurySnapshot {
        TreasurySnapshot {
            state: self.state.clone(),
            roles: self.roles.clone(),
            access: self.access.clone(),
            events: self.events.clone(),
        }
    }

    // ----- deposits -----

    /// Record `amount` of the treasury token as deposited
    ///
    /// In pull accounting the tokens are pulled from the caller; in snapshot
    /// accounting they must already sit in the treasury.
    pub fn deposit(&mut self, ctx: &CallContext, amount: Amount) -> Result<()> {
        self.roles
            .authorize(&self.access, &ctx.caller, Operation::Deposit)?;

        if amount == 0 {
            return Err(TreasuryError::InvalidAmount(
                "deposit amount must be greater than zero".to_string(),
            ));
        }
        let deposit_total = self
            .state
            .deposit_historic_total
            .checked_add(amount)
            .ok_or(TreasuryError::Overflow)?;
        let accounted = self
            .state
            .accounted_balance
            .checked_add(amount)
            .ok_or(TreasuryError::Overflow)?;

        match self.config.accounting {
            AccountingMode::Pull => {
                let approved = if self.state.is_approved {
                    self.state.approved_allowance
                } else {
                    0
                };
                if approved < amount {
                    return Err(TreasuryError::InsufficientAllowance {
                        requested: amount,
                        available: approved,
                    });
                }

                let allowance = self.bank.allowance(
                    &self.state.token,
                    &ctx.caller,
                    &self.state.treasury_address,
                );
                if allowance < amount {
                    return Err(TreasuryError::InsufficientAllowance {
                        requested: amount,
                        available: allowance,
                    });
                }

                self.bank.transfer_from(
                    &self.state.token,
                    &self.state.treasury_address,
                    &ctx.caller,
                    &self.state.treasury_address,
                    amount,
                )?;
                self.state.approved_allowance = approved - amount;
            }
            AccountingMode::Snapshot => {
                // Only tokens no earlier deposit has recorded count
                let available = self.balance().saturating_sub(self.state.accounted_balance);
                if available < amount {
                    return Err(TreasuryError::ExceedsBalance {
                        requested: amount,
                        available,
                    });
                }
            }
        }

        let balance_after = self.balance();
        self.state.deposit_historic_total = deposit_total;
        self.state.accounted_balance = accounted;
        self.state.last_deposited_amount = amount;
        self.state.last_deposit_timestamp = ctx.now;
        self.state.last_updated_treasury_balance = balance_after;

        self.events.record(
            ctx.now,
            TreasuryEventKind::Deposited {
                depositor: ctx.caller.clone(),
                amount,
                balance_after,
            },
        );
        info!(
            "Deposit of {} tokens by {} (historic total {}, balance {})",
            as_tokens(amount),
            ctx.caller,
            as_tokens(deposit_total),
            as_tokens(balance_after)
        );
        Ok(())
    }

    // ----- disbursements -----

    pub fn owner_disburse(&mut self, ctx: &CallContext, amount: Amount) -> Result<Amount> {
        self.disburse_as(ctx, Operation::OwnerDisburse, amount)
    }

    pub fn governor_disburse(&mut self, ctx: &CallContext, amount: Amount) -> Result<Amount> {
        self.disburse_as(ctx, Operation::GovernorDisburse, amount)
    }

    pub fn operator_disburse(&mut self, ctx: &CallContext, amount: Amount) -> Result<Amount> {
        self.disburse_as(ctx, Operation::OperatorDisburse, amount)
    }

    /// Unified entry point; `amount` 0 means the default amount when the
    /// zero sentinel is enabled. Returns the amount actually disbursed.
    pub fn disburse(&mut self, ctx: &CallContext, amount: Amount) -> Result<Amount> {
        self.disburse_as(ctx, Operation::Disburse, amount)
    }

    fn disburse_as(&mut self, ctx: &CallContext, op: Operation, requested: Amount) -> Result<Amount> {
        self.roles.authorize(&self.access, &ctx.caller, op)?;
        self.check_interval(ctx.now)?;

        let inputs = self.policy_inputs();
        let effective =
            self.config
                .policy
                .resolve(requested, self.config.zero_means_default, &inputs)?;
        let ceiling = self.config.policy.ceiling(&inputs);
        let floor = self.config.policy.default_unit(&inputs);
        check_disbursable(effective, inputs.live_balance, ceiling, floor)?;

        let disburse_total = self
            .state
            .disburse_historic_total
            .checked_add(effective)
            .ok_or(TreasuryError::Overflow)?;

        self.bank.transfer(
            &self.state.token,
            &self.state.treasury_address,
            &self.state.staking_address,
            effective,
        )?;

        self.state.disburse_historic_total = disburse_total;
        self.state.last_disbursed_amount = effective;
        self.state.last_disbursement_timestamp = Some(ctx.now);
        self.state.accounted_balance = self.state.accounted_balance.saturating_sub(effective);

        let balance_after = inputs.live_balance - effective;
        self.events.record(
            ctx.now,
            TreasuryEventKind::Disbursed {
                operator: ctx.caller.clone(),
                staking_address: self.state.staking_address.clone(),
                amount: effective,
                balance_after,
            },
        );
        info!(
            "Disbursed {} tokens to {} via {:?} (historic total {}, remaining {})",
            as_tokens(effective),
            self.state.staking_address,
            op,
            as_tokens(disburse_total),
            as_tokens(balance_after)
        );
        Ok(effective)
    }

    fn check_interval(&self, now: Timestamp) -> Result<()> {
        let Some(next_allowed_at) = self.next_disbursement_at() else {
            return Ok(());
        };
        if now < next_allowed_at {
            warn!(
                "Disbursement interval not reached: now {}, next allowed at {}",
                now, next_allowed_at
            );
            return Err(TreasuryError::IntervalNotReached {
                next_allowed_at,
                now,
            });
        }
        Ok(())
    }

    fn policy_inputs(&self) -> PolicyInputs {
        let deposit_basis = match self.config.accounting {
            AccountingMode::Pull => self.state.last_deposited_amount,
            AccountingMode::Snapshot => self.state.last_updated_treasury_balance,
        };
        PolicyInputs {
            live_balance: self.balance(),
            deposit_basis,
            range: self.state.range,
        }
    }

    // ----- owner levers -----

    pub fn update_staking_address(&mut self, ctx: &CallContext, staking: Address) -> Result<()> {
        self.roles
            .authorize(&self.access, &ctx.caller, Operation::Configure)?;
        if staking.is_zero() {
            return Err(TreasuryError::InvalidAddress(
                "staking address must not be the zero address".to_string(),
            ));
        }

        let previous = std::mem::replace(&mut self.state.staking_address, staking);
        info!(
            "Staking address updated: {} -> {}",
            previous, self.state.staking_address
        );
        self.events.record(
            ctx.now,
            TreasuryEventKind::StakingAddressUpdated {
                previous,
                current: self.state.staking_address.clone(),
            },
        );
        Ok(())
    }

    /// No lower bound: a 1 second interval is a legitimate testing lever
    pub fn update_disburse_interval(&mut self, ctx: &CallContext, seconds: u64) -> Result<()> {
        self.roles
            .authorize(&self.access, &ctx.caller, Operation::Configure)?;

        let previous = std::mem::replace(&mut self.state.disburse_interval, seconds);
        info!("Disburse interval updated: {}s -> {}s", previous, seconds);
        self.events.record(
            ctx.now,
            TreasuryEventKind::DisburseIntervalUpdated {
                previous,
                current: seconds,
            },
        );
        Ok(())
    }

    pub fn update_range(&mut self, ctx: &CallContext, range: u64) -> Result<()> {
        self.roles
            .authorize(&self.access, &ctx.caller, Operation::Configure)?;
        validate_range(range, self.config.max_range)?;

        let previous = std::mem::replace(&mut self.state.range, range);
        info!("Range updated: {} -> {}", previous, range);
        self.events.record(
            ctx.now,
            TreasuryEventKind::RangeUpdated {
                previous,
                current: range,
            },
        );
        Ok(())
    }

    /// Switch the held token; any approval granted for the old token lapses
    pub fn update_token(&mut self, ctx: &CallContext, token: Address) -> Result<()> {
        self.roles
            .authorize(&self.access, &ctx.caller, Operation::Configure)?;
        if token.is_zero() {
            return Err(TreasuryError::InvalidAddress(
                "token must not be the zero address".to_string(),
            ));
        }

        let previous = std::mem::replace(&mut self.state.token, token);
        self.state.is_approved = false;
        self.state.approved_allowance = 0;
        self.state.accounted_balance = 0;
        info!("Token updated: {} -> {}", previous, self.state.token);
        self.events.record(
            ctx.now,
            TreasuryEventKind::TokenUpdated {
                previous,
                current: self.state.token.clone(),
            },
        );
        Ok(())
    }

    /// Sweep `amount` of any token out of the treasury
    ///
    /// Leaves the deposit and disbursement counters alone.
    pub fn return_token(
        &mut self,
        ctx: &CallContext,
        token: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        self.roles
            .authorize(&self.access, &ctx.caller, Operation::ReturnToken)?;
        if token.is_zero() || to.is_zero() {
            return Err(TreasuryError::InvalidAddress(
                "token and recipient must not be the zero address".to_string(),
            ));
        }
        if amount == 0 {
            return Err(TreasuryError::InvalidAmount(
                "return amount must be greater than zero".to_string(),
            ));
        }

        let available = self.bank.balance_of(token, &self.state.treasury_address);
        if amount > available {
            return Err(TreasuryError::ExceedsBalance {
                requested: amount,
                available,
            });
        }

        self.bank
            .transfer(token, &self.state.treasury_address, to, amount)?;
        if token == &self.state.token {
            self.state.accounted_balance = self.state.accounted_balance.min(self.balance());
        }

        info!("Returned {} of {} to {}", amount, token, to);
        self.events.record(
            ctx.now,
            TreasuryEventKind::TokenReturned {
                token: token.clone(),
                to: to.clone(),
                amount,
            },
        );
        Ok(())
    }

    /// Approve pulls of up to `approval_cap_tokens * 10^decimals`
    ///
    /// Calling again refreshes the allowance; returns the new allowance.
    pub fn approve_allowance(&mut self, ctx: &CallContext, decimals: u32) -> Result<Amount> {
        self.roles
            .authorize(&self.access, &ctx.caller, Operation::Approve)?;

        let allowance = 10u128
            .checked_pow(decimals)
            .and_then(|scale| Amount::from(self.config.approval_cap_tokens).checked_mul(scale))
            .ok_or_else(|| {
                TreasuryError::InvalidAmount(format!(
                    "allowance overflows with {} decimals",
                    decimals
                ))
            })?;

        self.apply_approval(ctx, true, allowance);
        Ok(allowance)
    }

    /// Toggle approval at the token's native decimals
    pub fn set_approval(&mut self, ctx: &CallContext, approved: bool) -> Result<()> {
        if approved {
            self.approve_allowance(ctx, TOKEN_DECIMALS)?;
            return Ok(());
        }

        self.roles
            .authorize(&self.access, &ctx.caller, Operation::Approve)?;
        self.apply_approval(ctx, false, 0);
        Ok(())
    }

    fn apply_approval(&mut self, ctx: &CallContext, approved: bool, allowance: Amount) {
        self.state.is_approved = approved;
        self.state.approved_allowance = allowance;
        info!("Approval set to {} (allowance {})", approved, allowance);
        self.events.record(
            ctx.now,
            TreasuryEventKind::ApprovalSet {
                approved,
                allowance,
            },
        );
    }

    // ----- roles -----

    /// Returns true if membership changed
    pub fn grant_role(&mut self, ctx: &CallContext, role: Role, account: &Address) -> Result<bool> {
        self.authorize_role_change(ctx, role)?;
        let changed = self.roles.grant(role, account)?;
        if changed {
            info!("{} granted {} by {}", account, role, ctx.caller);
            self.events.record(
                ctx.now,
                TreasuryEventKind::RoleGranted {
                    role,
                    account: account.clone(),
                    sender: ctx.caller.clone(),
                },
            );
        }
        Ok(changed)
    }

    /// Returns true if membership changed
    pub fn revoke_role(&mut self, ctx: &CallContext, role: Role, account: &Address) -> Result<bool> {
        self.authorize_role_change(ctx, role)?;
        let changed = self.roles.revoke(role, account)?;
        if changed {
            info!("{} revoked {} by {}", account, role, ctx.caller);
            self.events.record(
                ctx.now,
                TreasuryEventKind::RoleRevoked {
                    role,
                    account: account.clone(),
                    sender: ctx.caller.clone(),
                },
            );
        }
        Ok(changed)
    }

    fn authorize_role_change(&self, ctx: &CallContext, role: Role) -> Result<()> {
        self.roles
            .authorize(&self.access, &ctx.caller, Operation::ManageRoles)?;
        // Admins manage governors and operators, only the owner manages admins
        if role == Role::Admin && !self.roles.has_role(&ctx.caller, Role::Owner) {
            warn!("{} tried to change {} without owner rights", ctx.caller, role);
            return Err(TreasuryError::Unauthorized {
                required: Role::Owner,
                caller: ctx.caller.clone(),
            });
        }
        Ok(())
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.roles.has_role(account, role)
    }

    // ----- read accessors -----

    /// Live balance of the treasury token
    pub fn balance(&self) -> Amount {
        self.bank
            .balance_of(&self.state.token, &self.state.treasury_address)
    }

    pub fn current_default_disburse_amount(&self) -> Amount {
        self.config.policy.default_unit(&self.policy_inputs())
    }

    /// `None` before the first disbursement
    pub fn next_disbursement_at(&self) -> Option<Timestamp> {
        self.state
            .last_disbursement_timestamp
            .map(|last| last.saturating_add(self.state.disburse_interval))
    }

    pub fn status(&self) -> LedgerStatus {
        match (self.balance(), self.state.last_disbursement_timestamp) {
            (0, _) if self.state.deposit_historic_total == 0 => LedgerStatus::Uninitialized,
            (0, _) => LedgerStatus::Depleted,
            (_, Some(last)) if last >= self.state.last_deposit_timestamp => {
                LedgerStatus::PartiallyDisbursed
            }
            _ => LedgerStatus::Funded,
        }
    }

    pub fn stats(&self) -> TreasuryStats {
        TreasuryStats {
            token: self.state.token.clone(),
            staking_address: self.state.staking_address.clone(),
            balance: self.balance(),
            deposit_historic_total: self.state.deposit_historic_total,
            disburse_historic_total: self.state.disburse_historic_total,
            last_deposited_amount: self.state.last_deposited_amount,
            last_deposit_timestamp: self.state.last_deposit_timestamp,
            last_updated_treasury_balance: self.state.last_updated_treasury_balance,
            last_disbursed_amount: self.state.last_disbursed_amount,
            last_disbursement_timestamp: self.last_disbursement_timestamp(),
            disburse_interval: self.state.disburse_interval,
            range: self.state.range,
            current_default_disburse_amount: self.current_default_disburse_amount(),
            next_disbursement_at: self.next_disbursement_at(),
            is_approved: self.state.is_approved,
            status: self.status(),
            governors: self.roles.members(Role::Governor).len(),
            operators: self.roles.members(Role::Operator).len(),
            events: self.events.len(),
        }
    }

    pub fn token(&self) -> &Address {
        &self.state.token
    }

    pub fn staking_address(&self) -> &Address {
        &self.state.staking_address
    }

    pub fn treasury_address(&self) -> &Address {
        &self.state.treasury_address
    }

    pub fn owner(&self) -> &Address {
        &self.config.owner
    }

    pub fn deposit_historic_total(&self) -> Amount {
        self.state.deposit_historic_total
    }

    pub fn disburse_historic_total(&self) -> Amount {
        self.state.disburse_historic_total
    }

    pub fn last_deposited_amount(&self) -> Amount {
        self.state.last_deposited_amount
    }

    pub fn last_deposit_timestamp(&self) -> Timestamp {
        self.state.last_deposit_timestamp
    }

    pub fn last_updated_treasury_balance(&self) -> Amount {
        self.state.last_updated_treasury_balance
    }

    pub fn last_disbursed_amount(&self) -> Amount {
        self.state.last_disbursed_amount
    }

    /// 0 until the first disbursement
    pub fn last_disbursement_timestamp(&self) -> Timestamp {
        self.state.last_disbursement_timestamp.unwrap_or(0)
    }

    pub fn accounted_balance(&self) -> Amount {
        self.state.accounted_balance
    }

    pub fn disburse_interval(&self) -> u64 {
        self.state.disburse_interval
    }

    pub fn range(&self) -> u64 {
        self.state.range
    }

    pub fn is_approved(&self) -> bool {
        self.state.is_approved
    }

    pub fn approved_allowance(&self) -> Amount {
        self.state.approved_allowance
    }

    pub fn state(&self) -> &TreasuryState {
        &self.state
    }

    pub fn config(&self) -> &TreasuryConfig {
        &self.config
    }

    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    pub fn access(&self) -> &AccessPolicy {
        &self.access
    }

    pub fn events(&self) -> &[TreasuryEvent] {
        self.events.all()
    }

    pub fn events_since(&self, timestamp: Timestamp) -> Vec<&TreasuryEvent> {
        self.events.since(timestamp)
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    /// Direct access to the token collaborator, e.g. to fund the treasury
    /// with a plain transfer before a snapshot-mode deposit
    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::InMemoryTokenBank;
    use crate::types::ONE_TOKEN;

    const T0: Timestamp = 1_700_000_000;

    fn owner_only_treasury() -> Treasury<InMemoryTokenBank> {
        let mut config = TreasuryConfig::new("treasury", "PURSE", "staking", "owner");
        config.access = crate::access::AccessPreset::OwnerOnly;
        config.disburse_interval_secs = 60;

        let mut bank = InMemoryTokenBank::new();
        bank.mint(&"PURSE".into(), &"owner".into(), 10 * ONE_TOKEN);
        bank.approve(&"PURSE".into(), &"owner".into(), &"treasury".into(), Amount::MAX);
        Treasury::new(config, bank).unwrap()
    }

    fn owner(now: Timestamp) -> CallContext {
        CallContext::new("owner", now)
    }

    #[test]
    fn test_new_treasury_is_uninitialized() {
        let treasury = owner_only_treasury();
        assert_eq!(treasury.status(), LedgerStatus::Uninitialized);
        assert_eq!(treasury.balance(), 0);
        assert_eq!(treasury.next_disbursement_at(), None);
        assert!(treasury.has_role(Role::Owner, &"owner".into()));
        assert!(treasury.events().is_empty());
    }

    #[test]
    fn test_pull_deposit_requires_approval() {
        let mut treasury = owner_only_treasury();
        let result = treasury.deposit(&owner(T0), ONE_TOKEN);
        assert_eq!(
            result,
            Err(TreasuryError::InsufficientAllowance {
                requested: ONE_TOKEN,
                available: 0
            })
        );
        assert_eq!(treasury.deposit_historic_total(), 0);

        treasury.approve_allowance(&owner(T0), 18).unwrap();
        treasury.deposit(&owner(T0), ONE_TOKEN).unwrap();
        assert_eq!(treasury.balance(), ONE_TOKEN);
        assert_eq!(treasury.status(), LedgerStatus::Funded);
    }

    #[test]
    fn test_approved_allowance_is_spent() {
        let mut treasury = owner_only_treasury();
        treasury.approve_allowance(&owner(T0), 0).unwrap();
        assert_eq!(treasury.approved_allowance(), 1_000_000_000);

        treasury.deposit(&owner(T0), 400_000_000).unwrap();
        assert_eq!(treasury.approved_allowance(), 600_000_000);
        assert!(matches!(
            treasury.deposit(&owner(T0), 600_000_001),
            Err(TreasuryError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn test_approval_overflow() {
        let mut treasury = owner_only_treasury();
        assert!(matches!(
            treasury.approve_allowance(&owner(T0), 40),
            Err(TreasuryError::InvalidAmount(_))
        ));
        assert!(!treasury.is_approved());
    }

    #[test]
    fn test_set_approval_toggle() {
        let mut treasury = owner_only_treasury();
        treasury.set_approval(&owner(T0), true).unwrap();
        assert!(treasury.is_approved());
        treasury.set_approval(&owner(T0), true).unwrap();
        assert!(treasury.is_approved());
        treasury.set_approval(&owner(T0), false).unwrap();
        assert!(!treasury.is_approved());
        assert_eq!(treasury.approved_allowance(), 0);
    }

    #[test]
    fn test_status_transitions() {
        let mut treasury = owner_only_treasury();
        treasury.set_approval(&owner(T0), true).unwrap();
        treasury.deposit(&owner(T0), 12 * ONE_TOKEN / 10).unwrap();
        assert_eq!(treasury.status(), LedgerStatus::Funded);

        treasury.disburse(&owner(T0 + 1), 0).unwrap();
        assert_eq!(treasury.status(), LedgerStatus::PartiallyDisbursed);

        let rest = treasury.balance();
        treasury
            .return_token(&owner(T0 + 2), &"PURSE".into(), &"owner".into(), rest)
            .unwrap();
        assert_eq!(treasury.status(), LedgerStatus::Depleted);

        treasury.deposit(&owner(T0 + 3), ONE_TOKEN).unwrap();
        assert_eq!(treasury.status(), LedgerStatus::Funded);
    }

    #[test]
    fn test_update_token_resets_approval() {
        let mut treasury = owner_only_treasury();
        treasury.set_approval(&owner(T0), true).unwrap();
        treasury.update_token(&owner(T0), "USDT".into()).unwrap();
        assert_eq!(treasury.token(), &Address::new("USDT"));
        assert!(!treasury.is_approved());

        assert!(matches!(
            treasury.update_token(&owner(T0), Address::zero()),
            Err(TreasuryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_stats_report() {
        let mut treasury = owner_only_treasury();
        treasury.set_approval(&owner(T0), true).unwrap();
        treasury.deposit(&owner(T0), 12 * ONE_TOKEN).unwrap();

        let stats = treasury.stats();
        assert_eq!(stats.balance, 12 * ONE_TOKEN);
        assert_eq!(stats.current_default_disburse_amount, ONE_TOKEN);
        assert_eq!(stats.status, LedgerStatus::Funded);
        assert_eq!(stats.events, 2);

        let json = stats.to_json().unwrap();
        assert!(json.contains("deposit_historic_total"));
    }

    #[test]
    fn test_deposit_total_overflow_commits_nothing() {
        let mut config = TreasuryConfig::new("treasury", "PURSE", "staking", "owner");
        config.access = crate::access::AccessPreset::OwnerOnly;
        config.accounting = AccountingMode::Snapshot;

        let mut bank = InMemoryTokenBank::new();
        bank.mint(&"PURSE".into(), &"treasury".into(), Amount::MAX);
        let mut treasury = Treasury::new(config, bank).unwrap();

        treasury.deposit(&owner(T0), Amount::MAX).unwrap();
        let before = treasury.state().clone();

        assert_eq!(treasury.deposit(&owner(T0 + 1), 1), Err(TreasuryError::Overflow));
        assert_eq!(treasury.state(), &before);
        assert_eq!(treasury.events().len(), 1);
    }

    #[test]
    fn test_disbursement_at_time_zero_starts_the_interval() {
        let mut treasury = owner_only_treasury();
        treasury.set_approval(&owner(0), true).unwrap();
        treasury.deposit(&owner(0), 12 * ONE_TOKEN).unwrap();

        treasury.disburse(&owner(0), 0).unwrap();
        assert_eq!(treasury.next_disbursement_at(), Some(60));
        assert_eq!(
            treasury.disburse(&owner(0), 0),
            Err(TreasuryError::IntervalNotReached {
                next_allowed_at: 60,
                now: 0
            })
        );
        assert_eq!(treasury.disburse_historic_total(), ONE_TOKEN);
        assert_eq!(treasury.status(), LedgerStatus::PartiallyDisbursed);
    }

    #[test]
    fn test_snapshot_deposit_counts_tokens_once() {
        let mut config = TreasuryConfig::new("treasury", "PURSE", "staking", "owner");
        config.access = crate::access::AccessPreset::OwnerOnly;
        config.accounting = AccountingMode::Snapshot;
        config.disburse_interval_secs = 0;

        let mut bank = InMemoryTokenBank::new();
        bank.mint(&"PURSE".into(), &"treasury".into(), ONE_TOKEN);
        let mut treasury = Treasury::new(config, bank).unwrap();

        treasury.deposit(&owner(T0), ONE_TOKEN).unwrap();
        for i in 1..5 {
            assert_eq!(
                treasury.deposit(&owner(T0 + i), ONE_TOKEN),
                Err(TreasuryError::ExceedsBalance {
                    requested: ONE_TOKEN,
                    available: 0
                })
            );
        }
        assert_eq!(treasury.deposit_historic_total(), ONE_TOKEN);
        assert_eq!(treasury.last_deposit_timestamp(), T0);
        assert_eq!(treasury.accounted_balance(), ONE_TOKEN);

        // Outflows release accounting; only new funds can be recorded
        treasury.disburse(&owner(T0 + 10), 0).unwrap();
        assert_eq!(treasury.accounted_balance(), ONE_TOKEN - ONE_TOKEN / 12);
        assert!(matches!(
            treasury.deposit(&owner(T0 + 11), 1),
            Err(TreasuryError::ExceedsBalance { .. })
        ));

        treasury
            .bank_mut()
            .mint(&"PURSE".into(), &"treasury".into(), ONE_TOKEN / 2);
        treasury.deposit(&owner(T0 + 12), ONE_TOKEN / 2).unwrap();
        assert_eq!(treasury.deposit_historic_total(), 3 * ONE_TOKEN / 2);
        assert_eq!(treasury.accounted_balance(), treasury.balance());
    }

    #[test]
    fn test_return_token_releases_accounted_balance() {
        let mut treasury = owner_only_treasury();
        treasury.set_approval(&owner(T0), true).unwrap();
        treasury.deposit(&owner(T0), 2 * ONE_TOKEN).unwrap();

        treasury
            .return_token(&owner(T0), &"PURSE".into(), &"owner".into(), ONE_TOKEN / 2)
            .unwrap();
        assert_eq!(treasury.accounted_balance(), 3 * ONE_TOKEN / 2);
    }

    #[test]
    fn test_restore_keeps_custom_access_policy() {
        let mut policy = AccessPolicy::from_preset(crate::access::AccessPreset::OwnerOnly);
        policy.allow(Operation::Deposit, vec![Role::Governor]);

        let treasury = owner_only_treasury().with_access_policy(policy.clone());
        let restored = Treasury::restore(
            treasury.config().clone(),
            treasury.snapshot(),
            treasury.bank().clone(),
        )
        .unwrap();

        assert_eq!(restored.access(), &policy);
    }

    #[test]
    fn test_restore_rejects_range_above_max() {
        let treasury = owner_only_treasury();
        let mut snapshot = treasury.snapshot();
        snapshot.state.range = 13;

        assert_eq!(
            Treasury::restore(treasury.config().clone(), snapshot, treasury.bank().clone()).err(),
            Some(TreasuryError::InvalidRange { range: 13, max: 12 })
        );
    }

    #[test]
    fn test_restore_round_trip() {
        let mut treasury = owner_only_treasury();
        treasury.set_approval(&owner(T0), true).unwrap();
        treasury.deposit(&owner(T0), ONE_TOKEN).unwrap();

        let snapshot = treasury.snapshot();
        let config = treasury.config().clone();
        let bank = treasury.bank().clone();

        let restored = Treasury::restore(config.clone(), snapshot.clone(), bank.clone()).unwrap();
        assert_eq!(restored.state(), treasury.state());
        assert_eq!(restored.events().len(), treasury.events().len());

        let mut wrong = config;
        wrong.treasury_address = "elsewhere".into();
        assert!(matches!(
            Treasury::restore(wrong, snapshot, bank),
            Err(TreasuryError::Config(_))
        ));
    }
}
