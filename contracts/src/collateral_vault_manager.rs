//! Collateral Vault Manager
//!
//! Owns the per-account collateral/debt ledger and routes idle collateral
//! into yield vaults.
//!
//! - `deposit` / `withdraw` move collateral in and out of an account
//! - `mint` issues debt asset against collateral headroom
//! - `repay` reduces debt with debt asset (burned) or collateral (sent to
//!   the redemption buffer)
//! - `liquidate` repays an account's own debt from its own collateral
//! - `flush` / `recall` / `harvest` manage the vault list
//!
//! ## Solvency
//!
//! For every account with debt, after `mint` and `withdraw`:
//! `deposited * scale * PRECISION / collateralization_limit >= debt`.
//!
//! Ledger entries are committed before any adapter or token call, and any
//! failing collaborator aborts the whole operation.

use odra::prelude::*;
use odra::casper_types::{runtime_args, RuntimeArgs, U256};
use odra::CallDef;
use crate::access_control::AccessControl;
use crate::errors::CdpError;
use crate::events::*;
use crate::fixed_point::{
    self, MAXIMUM_COLLATERALIZATION_LIMIT, MINIMUM_COLLATERALIZATION_LIMIT, PERCENT_RESOLUTION,
};
use crate::interfaces::VaultInfo;
use crate::token_adapter;
use crate::types::{is_zero_address, Account, Policy, VaultBinding};
use crate::vault_list::VaultList;

/// Collateral Vault Manager Contract
#[odra::module(events = [
    PendingGovernanceUpdated,
    GovernanceUpdated,
    SentinelUpdated,
    RoleUpdated,
    ActiveVaultUpdated,
    FundsFlushed,
    FundsRecalled,
    FundsHarvested,
    RewardsUpdated,
    TokensDeposited,
    TokensWithdrawn,
    TokensMinted,
    TokensRepaid,
    TokensLiquidated,
    RedemptionBufferUpdated,
    HarvestFeeUpdated,
    CollateralizationLimitUpdated,
    FlushActivatorUpdated,
    EmergencyExitUpdated
])]
pub struct CollateralVaultManager {
    /// Role store (governance, sentinel)
    access: SubModule<AccessControl>,
    /// Append-only vault list
    vaults: SubModule<VaultList>,
    /// Collateral token
    collateral_token: Var<Address>,
    /// Debt asset
    debt_asset: Var<Address>,
    /// Redemption buffer receiving collateral repayments and yield
    redemption_buffer: Var<Address>,
    /// Recipient of the harvest fee
    rewards: Var<Address>,
    /// Per-owner ledger
    accounts: Mapping<Address, Account>,
    /// Sum of all accounts' deposited collateral
    total_deposited: Var<U256>,
    /// Sum of all accounts' debt
    total_debt: Var<U256>,
    /// Harvest fee in basis points
    harvest_fee: Var<u64>,
    /// Minimum collateral-to-debt ratio, 1e18-scaled
    collateralization_limit: Var<U256>,
    /// Deposits or mints at or above this amount flush immediately
    flush_activator: Var<U256>,
    /// One-way emergency flag
    emergency_exit: Var<bool>,
    /// Set once the first vault is bound
    initialized: Var<bool>,
    /// 10^(debt decimals - collateral decimals)
    decimal_scale: Var<U256>,
}

#[odra::module]
impl CollateralVaultManager {
    /// Initialize the manager
    pub fn init(
        &mut self,
        collateral_token: Address,
        debt_asset: Address,
        governance: Address,
        sentinel: Address,
        flush_activator: U256,
    ) {
        if is_zero_address(&collateral_token)
            || is_zero_address(&debt_asset)
            || is_zero_address(&governance)
            || is_zero_address(&sentinel)
        {
            self.env().revert(CdpError::ZeroAddress);
        }
        if flush_activator.is_zero() {
            self.env().revert(CdpError::InvalidFlushActivator);
        }

        let env = self.env();
        let collateral_decimals = token_adapter::decimals(&env, collateral_token);
        let debt_decimals = token_adapter::decimals(&env, debt_asset);
        let scale = fixed_point::decimal_scale(collateral_decimals, debt_decimals)
            .unwrap_or_else(|| env.revert(CdpError::DecimalsMismatch));

        self.access.bootstrap(governance, Some(sentinel));
        self.vaults.bind_token(collateral_token);

        self.collateral_token.set(collateral_token);
        self.debt_asset.set(debt_asset);
        self.decimal_scale.set(scale);
        self.flush_activator.set(flush_activator);
        self.collateralization_limit
            .set(U256::from(MINIMUM_COLLATERALIZATION_LIMIT));
        self.harvest_fee.set(0);
        self.total_deposited.set(U256::zero());
        self.total_debt.set(U256::zero());
        self.emergency_exit.set(false);
        self.initialized.set(false);
    }

    // ========== Account Operations ==========

    /// Deposit collateral; flushes to the active vault when
    /// `amount >= flush_activator`
    pub fn deposit(&mut self, amount: U256) {
        self.require_initialized();
        self.require_no_emergency();
        self.require_nonzero(amount);

        let caller = self.env().caller();
        let mut account = self.get_account(caller);
        account.deposited_collateral = account.deposited_collateral + amount;
        self.accounts.set(&caller, account);
        let total_deposited = self.total_deposited() + amount;
        self.total_deposited.set(total_deposited);

        let env = self.env();
        token_adapter::transfer_from(
            &env,
            self.collateral_token(),
            caller,
            env.self_address(),
            amount,
        );

        if amount >= self.get_flush_activator() {
            self.flush_active_vault();
        }

        env.emit_event(TokensDeposited { account: caller, amount });
    }

    /// Withdraw up to `deposited - debt * limit / PRECISION` of collateral,
    /// recalling any shortfall from the active vault
    pub fn withdraw(&mut self, amount: U256) {
        self.require_initialized();
        self.require_nonzero(amount);

        let caller = self.env().caller();
        let mut account = self.get_account(caller);
        let limit = self.get_collateralization_limit();
        let scale = self.get_decimal_scale();

        let withdrawable =
            fixed_point::withdrawable(account.deposited_collateral, account.debt, limit, scale);
        if amount > withdrawable {
            self.env().revert(CdpError::ExceedsWithdrawable);
        }
        account.deposited_collateral = account.deposited_collateral - amount;
        if !fixed_point::is_healthy(account.deposited_collateral, account.debt, limit, scale) {
            self.env().revert(CdpError::CollateralizationBreached);
        }
        self.accounts.set(&caller, account);
        let total_deposited = self.total_deposited() - amount;
        self.total_deposited.set(total_deposited);

        self.withdraw_funds_to(caller, amount);

        self.env().emit_event(TokensWithdrawn { account: caller, amount });
    }

    /// Mint debt asset against the caller's collateral
    pub fn mint(&mut self, amount: U256) {
        self.require_initialized();
        self.require_nonzero(amount);

        let caller = self.env().caller();
        let mut account = self.get_account(caller);
        let new_debt = account.debt + amount;
        let max_debt = fixed_point::maximum_debt(
            account.deposited_collateral,
            self.get_collateralization_limit(),
            self.get_decimal_scale(),
        );
        if new_debt > max_debt {
            self.env().revert(CdpError::CollateralizationBreached);
        }
        account.debt = new_debt;
        self.accounts.set(&caller, account);
        let total_debt = self.total_debt() + amount;
        self.total_debt.set(total_debt);

        token_adapter::mint(&self.env(), self.debt_asset(), caller, amount);

        if amount >= self.get_flush_activator() {
            self.flush_active_vault();
        }

        self.env().emit_event(TokensMinted {
            account: caller,
            amount,
            new_debt,
        });
    }

    /// Repay debt with debt asset (`debt_amount`, burned) and/or collateral
    /// (`collateral_amount`, forwarded to the redemption buffer).
    ///
    /// The collateral path is applied first; a collateral amount worth more
    /// than the outstanding debt aborts with an underflow even when the
    /// combined repayment would fit.
    pub fn repay(&mut self, debt_amount: U256, collateral_amount: U256) {
        self.require_initialized();

        let caller = self.env().caller();
        let mut account = self.get_account(caller);
        let collateral_value = self.to_debt_units(collateral_amount);

        if !collateral_amount.is_zero() {
            account.debt = self.checked_reduce(account.debt, collateral_value);
        }
        if !debt_amount.is_zero() {
            account.debt = self.checked_reduce(account.debt, debt_amount);
        }
        let new_debt = account.debt;
        self.accounts.set(&caller, account);
        let total_debt = self
            .total_debt()
            .saturating_sub(collateral_value + debt_amount);
        self.total_debt.set(total_debt);

        let env = self.env();
        if !collateral_amount.is_zero() {
            token_adapter::transfer_from(
                &env,
                self.collateral_token(),
                caller,
                env.self_address(),
                collateral_amount,
            );
            self.distribute_to_buffer(collateral_amount);
        }
        if !debt_amount.is_zero() {
            let debt_asset = self.debt_asset();
            token_adapter::burn_from(&env, debt_asset, caller, debt_amount);
            token_adapter::lower_has_minted(&env, debt_asset, debt_amount);
        }

        env.emit_event(TokensRepaid {
            account: caller,
            debt_amount,
            collateral_amount,
            new_debt,
        });
    }

    /// Repay the caller's debt with `min(amount, deposited)` of the caller's
    /// collateral, sourced locally first and then from the active vault, and
    /// forwarded to the redemption buffer
    pub fn liquidate(&mut self, amount: U256) {
        self.require_initialized();
        self.require_nonzero(amount);

        let caller = self.env().caller();
        let mut account = self.get_account(caller);
        let withdrawn = amount.min(account.deposited_collateral);
        let debt_reduction = self.to_debt_units(withdrawn);

        account.deposited_collateral = account.deposited_collateral - withdrawn;
        account.debt = self.checked_reduce(account.debt, debt_reduction);
        self.accounts.set(&caller, account);
        let total_deposited = self.total_deposited() - withdrawn;
        self.total_deposited.set(total_deposited);
        let total_debt = self.total_debt().saturating_sub(debt_reduction);
        self.total_debt.set(total_debt);

        let this = self.env().self_address();
        self.withdraw_funds_to(this, withdrawn);
        self.distribute_to_buffer(withdrawn);

        self.env().emit_event(TokensLiquidated {
            account: caller,
            requested: amount,
            withdrawn,
        });
    }

    // ========== Vault Operations ==========

    /// Move the whole local collateral balance into the active vault
    pub fn flush(&mut self) {
        self.require_initialized();
        self.require_no_emergency();
        self.flush_active_vault();
    }

    /// Recall `amount` from vault `vault_id` back to the manager.
    ///
    /// The active vault requires governance unless emergency exit is set;
    /// inactive vaults are open to any caller.
    pub fn recall(&mut self, vault_id: u32, amount: U256) {
        self.require_initialized();
        self.require_recall_permission(vault_id);
        let this = self.env().self_address();
        let withdrawn = self.vaults.withdraw(vault_id, this, amount);
        self.env().emit_event(FundsRecalled { vault_id, withdrawn });
    }

    /// Recall the whole principal of vault `vault_id`
    pub fn recall_all(&mut self, vault_id: u32) {
        self.require_initialized();
        self.require_recall_permission(vault_id);
        let this = self.env().self_address();
        let withdrawn = self.vaults.withdraw_all(vault_id, this);
        self.env().emit_event(FundsRecalled { vault_id, withdrawn });
    }

    /// Bind the first vault (governance only, once)
    pub fn initialize(&mut self, adapter: Address) {
        self.access.require(Policy::Governance);
        if self.is_initialized() {
            self.env().revert(CdpError::AlreadyInitialized);
        }
        if self.redemption_buffer.get().is_none() {
            self.env().revert(CdpError::RedemptionBufferNotSet);
        }
        if self.rewards.get().is_none() {
            self.env().revert(CdpError::RewardsNotSet);
        }
        self.bind_vault(adapter);
        self.initialized.set(true);
    }

    /// Append a new adapter and make it active (governance only)
    pub fn migrate(&mut self, adapter: Address) {
        self.access.require(Policy::Governance);
        self.require_initialized();
        self.bind_vault(adapter);
    }

    /// Harvest yield above principal from vault `vault_id`; the fee goes to
    /// rewards and the rest to the redemption buffer
    pub fn harvest(&mut self, vault_id: u32) {
        self.require_initialized();

        let this = self.env().self_address();
        let harvested = self.vaults.harvest(vault_id, this);
        if harvested.is_zero() {
            return;
        }

        let fee = fixed_point::percent_of(harvested, self.get_harvest_fee());
        let distribute_amount = harvested - fee;
        if !fee.is_zero() {
            let rewards = self.rewards();
            token_adapter::transfer(&self.env(), self.collateral_token(), rewards, fee);
        }
        if !distribute_amount.is_zero() {
            self.distribute_to_buffer(distribute_amount);
        }

        self.env().emit_event(FundsHarvested {
            vault_id,
            harvested,
            fee,
        });
    }

    // ========== Governance Functions ==========

    /// Nominate a new governance (governance only)
    pub fn set_pending_governance(&mut self, pending_governance: Address) {
        self.access.set_pending_governance(pending_governance);
    }

    /// Accept the governance nomination
    pub fn accept_governance(&mut self) {
        self.access.accept_governance();
    }

    /// Replace the sentinel (governance only)
    pub fn set_sentinel(&mut self, sentinel: Address) {
        self.access.set_sentinel(sentinel);
    }

    /// Set the redemption buffer (governance only)
    pub fn set_redemption_buffer(&mut self, redemption_buffer: Address) {
        self.access.require(Policy::Governance);
        if is_zero_address(&redemption_buffer) {
            self.env().revert(CdpError::ZeroAddress);
        }
        self.redemption_buffer.set(redemption_buffer);
        self.env()
            .emit_event(RedemptionBufferUpdated { redemption_buffer });
    }

    /// Set the harvest fee recipient (governance only)
    pub fn set_rewards(&mut self, rewards: Address) {
        self.access.require(Policy::Governance);
        if is_zero_address(&rewards) {
            self.env().revert(CdpError::ZeroAddress);
        }
        self.rewards.set(rewards);
        self.env().emit_event(RewardsUpdated { rewards });
    }

    /// Set the harvest fee in basis points (governance only)
    pub fn set_harvest_fee(&mut self, harvest_fee: u64) {
        self.access.require(Policy::Governance);
        if harvest_fee > PERCENT_RESOLUTION {
            self.env().revert(CdpError::HarvestFeeAboveMaximum);
        }
        self.harvest_fee.set(harvest_fee);
        self.env().emit_event(HarvestFeeUpdated { harvest_fee });
    }

    /// Set the collateralization limit, 1e18-scaled (governance only)
    pub fn set_collateralization_limit(&mut self, limit: U256) {
        self.access.require(Policy::Governance);
        if limit < U256::from(MINIMUM_COLLATERALIZATION_LIMIT) {
            self.env()
                .revert(CdpError::CollateralizationLimitBelowMinimum);
        }
        if limit > U256::from(MAXIMUM_COLLATERALIZATION_LIMIT) {
            self.env()
                .revert(CdpError::CollateralizationLimitAboveMaximum);
        }
        self.collateralization_limit.set(limit);
        self.env()
            .emit_event(CollateralizationLimitUpdated { limit });
    }

    /// Set the flush activator (governance only)
    pub fn set_flush_activator(&mut self, flush_activator: U256) {
        self.access.require(Policy::Governance);
        if flush_activator.is_zero() {
            self.env().revert(CdpError::InvalidFlushActivator);
        }
        self.flush_activator.set(flush_activator);
        self.env()
            .emit_event(FlushActivatorUpdated { flush_activator });
    }

    /// Set emergency exit (governance only); once set it cannot be cleared
    pub fn set_emergency_exit(&mut self, status: bool) {
        self.access.require(Policy::Governance);
        if self.is_emergency_exit() && !status {
            self.env().revert(CdpError::EmergencyExitIrreversible);
        }
        self.emergency_exit.set(status);
        self.env().emit_event(EmergencyExitUpdated { status });
    }

    // ========== Query Functions ==========

    /// Ledger entry of `owner` (zeroed if never used)
    pub fn get_account(&self, owner: Address) -> Account {
        self.accounts.get(&owner).unwrap_or_default()
    }

    /// Collateral `owner` may withdraw now
    pub fn withdrawable_collateral(&self, owner: Address) -> U256 {
        let account = self.get_account(owner);
        fixed_point::withdrawable(
            account.deposited_collateral,
            account.debt,
            self.get_collateralization_limit(),
            self.get_decimal_scale(),
        )
    }

    /// Sum of all deposited collateral
    pub fn total_deposited(&self) -> U256 {
        self.total_deposited.get().unwrap_or(U256::zero())
    }

    /// Sum of all outstanding debt
    pub fn total_debt(&self) -> U256 {
        self.total_debt.get().unwrap_or(U256::zero())
    }

    /// Number of bound vaults
    pub fn vault_count(&self) -> u32 {
        self.vaults.count()
    }

    /// Index of the active vault
    pub fn active_vault_index(&self) -> u32 {
        self.vaults.active_index()
    }

    /// Binding at `vault_id`
    pub fn vault(&self, vault_id: u32) -> VaultBinding {
        self.vaults.get(vault_id)
    }

    /// Binding at `vault_id` with its live value
    pub fn vault_info(&self, vault_id: u32) -> VaultInfo {
        self.vaults.info(vault_id)
    }

    /// Collateralization limit, 1e18-scaled
    pub fn get_collateralization_limit(&self) -> U256 {
        self.collateralization_limit
            .get()
            .unwrap_or(U256::from(MINIMUM_COLLATERALIZATION_LIMIT))
    }

    /// Harvest fee in basis points
    pub fn get_harvest_fee(&self) -> u64 {
        self.harvest_fee.get().unwrap_or(0)
    }

    /// Flush activator
    pub fn get_flush_activator(&self) -> U256 {
        self.flush_activator.get().unwrap_or(U256::zero())
    }

    /// Collateral to debt unit conversion factor
    pub fn get_decimal_scale(&self) -> U256 {
        self.decimal_scale.get().unwrap_or(U256::one())
    }

    /// Whether emergency exit is set
    pub fn is_emergency_exit(&self) -> bool {
        self.emergency_exit.get().unwrap_or(false)
    }

    /// Whether the first vault has been bound
    pub fn is_initialized(&self) -> bool {
        self.initialized.get().unwrap_or(false)
    }

    /// Current governance
    pub fn governance(&self) -> Option<Address> {
        self.access.governance()
    }

    /// Governance nominee
    pub fn pending_governance(&self) -> Option<Address> {
        self.access.pending_governance()
    }

    /// Current sentinel
    pub fn sentinel(&self) -> Option<Address> {
        self.access.sentinel()
    }

    /// Redemption buffer
    pub fn get_redemption_buffer(&self) -> Option<Address> {
        self.redemption_buffer.get()
    }

    /// Harvest fee recipient
    pub fn get_rewards(&self) -> Option<Address> {
        self.rewards.get()
    }

    // ========== Internal Functions ==========

    fn bind_vault(&mut self, adapter: Address) {
        let vault_id = self.vaults.push(adapter);
        self.env()
            .emit_event(ActiveVaultUpdated { adapter, vault_id });
    }

    fn flush_active_vault(&mut self) {
        let env = self.env();
        let balance =
            token_adapter::balance_of(&env, self.collateral_token(), env.self_address());
        if balance.is_zero() {
            return;
        }
        let vault_id = self.vaults.active_index();
        self.vaults.deposit(vault_id, balance);
        env.emit_event(FundsFlushed {
            vault_id,
            amount: balance,
        });
    }

    /// Pay `amount` to `recipient` from the local balance first and the
    /// active vault for the rest
    fn withdraw_funds_to(&mut self, recipient: Address, amount: U256) {
        let env = self.env();
        let this = env.self_address();
        let token = self.collateral_token();

        let local = token_adapter::balance_of(&env, token, this);
        let buffered = amount.min(local);
        if recipient != this {
            token_adapter::transfer(&env, token, recipient, buffered);
        }

        let remaining = amount - buffered;
        if !remaining.is_zero() {
            let vault_id = self.vaults.active_index();
            self.vaults.withdraw(vault_id, recipient, remaining);
        }
    }

    fn distribute_to_buffer(&mut self, amount: U256) {
        let env = self.env();
        let buffer = self
            .redemption_buffer
            .get()
            .unwrap_or_else(|| env.revert(CdpError::RedemptionBufferNotSet));
        token_adapter::approve(&env, self.collateral_token(), buffer, amount);

        let args = runtime_args! { "amount" => amount };
        let call_def = CallDef::new("distribute", true, args);
        env.call_contract::<()>(buffer, call_def);
    }

    /// Debt value of `collateral_amount`; overflow aborts like any other
    /// repayment larger than the debt
    fn to_debt_units(&self, collateral_amount: U256) -> U256 {
        collateral_amount
            .checked_mul(self.get_decimal_scale())
            .unwrap_or_else(|| self.env().revert(CdpError::ArithmeticUnderflow))
    }

    fn checked_reduce(&self, value: U256, reduction: U256) -> U256 {
        value
            .checked_sub(reduction)
            .unwrap_or_else(|| self.env().revert(CdpError::ArithmeticUnderflow))
    }

    fn collateral_token(&self) -> Address {
        self.collateral_token
            .get()
            .unwrap_or_else(|| self.env().revert(CdpError::NotInitialized))
    }

    fn debt_asset(&self) -> Address {
        self.debt_asset
            .get()
            .unwrap_or_else(|| self.env().revert(CdpError::NotInitialized))
    }

    fn rewards(&self) -> Address {
        self.rewards
            .get()
            .unwrap_or_else(|| self.env().revert(CdpError::RewardsNotSet))
    }

    fn require_initialized(&self) {
        if !self.is_initialized() {
            self.env().revert(CdpError::NotInitialized);
        }
    }

    fn require_no_emergency(&self) {
        if self.is_emergency_exit() {
            self.env().revert(CdpError::EmergencyExitActive);
        }
    }

    fn require_nonzero(&self, amount: U256) {
        if amount.is_zero() {
            self.env().revert(CdpError::ZeroAmount);
        }
    }

    fn require_recall_permission(&self, vault_id: u32) {
        let active = vault_id == self.vaults.active_index();
        if active && !self.is_emergency_exit() && !self.access.allows(Policy::Governance) {
            self.env().revert(CdpError::RecallNotPermitted);
        }
    }
}
