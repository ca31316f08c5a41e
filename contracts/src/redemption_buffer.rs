//! Redemption Buffer
//!
//! Stakers lock debt asset here and receive collateral in exchange, burning
//! the debt asset 1:1 (adjusted for the decimal difference between the two
//! tokens).
//!
//! Collateral arrives through `distribute` (harvested yield, collateral
//! repayments, liquidations) into a pending `buffer` that unlocks linearly
//! over `transmutation_period`. Unlocked collateral is spread over stakers
//! through a cumulative dividend-points accumulator:
//!
//! ```text
//! points += unlocked * POINT_MULTIPLIER / total_staked
//! owing(user) = deposited * (points - checkpoint) / POINT_MULTIPLIER
//! ```
//!
//! A staker's `inbucket` holds unlocked collateral; `transmute` burns the
//! matching stake and moves it to `realised`, which `claim` pays out.
//!
//! ## Overflow
//!
//! When the bucket is worth more than the remaining stake:
//! - `transmute` caps at the stake and spreads the overflow over all stakers
//! - `force_transmute` caps at the target's stake and credits the overflow to
//!   the forcer's bucket
//!
//! Local collateral is kept near `plantable_threshold`; the surplus or
//! deficit beyond the margin is planted in or recalled from the active vault.

use odra::prelude::*;
use odra::casper_types::{runtime_args, RuntimeArgs, U256};
use odra::CallDef;
use crate::access_control::AccessControl;
use crate::errors::CdpError;
use crate::events::*;
use crate::fixed_point::{
    self, DEFAULT_PLANTABLE_MARGIN, DEFAULT_TRANSMUTATION_PERIOD, MAXIMUM_PLANTABLE_MARGIN,
};
use crate::interfaces::{BufferInfo, StakerSummary, UserInfo, VaultInfo};
use crate::token_adapter;
use crate::types::{is_zero_address, Policy, UserStake, VaultBinding, ROLE_KEEPER, ROLE_WHITELISTED};
use crate::vault_list::VaultList;

/// Redemption Buffer Contract
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
    Staked,
    Unstaked,
    Transmuted,
    Claimed,
    ForcedTransmute,
    Distributed,
    PauseUpdated,
    PlantableThresholdUpdated,
    PlantableMarginUpdated,
    TransmutationPeriodUpdated,
    MigrationComplete
])]
pub struct RedemptionBuffer {
    /// Role store (governance, sentinel, keepers, whitelist)
    access: SubModule<AccessControl>,
    /// Append-only vault list
    vaults: SubModule<VaultList>,
    /// Debt asset staked here
    debt_asset: Var<Address>,
    /// Collateral token paid out
    collateral_token: Var<Address>,
    /// Recipient of harvested yield
    rewards: Var<Address>,
    /// 10^(debt decimals - collateral decimals)
    decimal_scale: Var<U256>,
    /// Per-staker state
    stakes: Mapping<Address, UserStake>,
    /// Accounts that ever staked or transmuted
    known_users: Mapping<Address, bool>,
    /// Discovery list by position
    user_list: Mapping<u32, Address>,
    /// Length of `user_list`
    user_count: Var<u32>,
    /// Sum of all stakes (debt units)
    total_staked: Var<U256>,
    /// Collateral pending linear unlock
    buffer: Var<U256>,
    /// Block time (ms) of the last phased distribution
    last_distribution_tick: Var<u64>,
    /// Cumulative dividend points
    total_dividend_points: Var<U256>,
    /// Collateral allocated by the accumulator and not yet in any bucket
    unclaimed_dividends: Var<U256>,
    /// Unlock period (ms)
    transmutation_period: Var<u64>,
    /// Local collateral target
    plantable_threshold: Var<U256>,
    /// Band around the threshold, percent
    plantable_margin: Var<U256>,
    /// Emergency pause
    paused: Var<bool>,
    /// Set once the first vault is bound
    initialized: Var<bool>,
}

#[odra::module]
impl RedemptionBuffer {
    /// Initialize the buffer
    pub fn init(&mut self, debt_asset: Address, collateral_token: Address, governance: Address) {
        if is_zero_address(&debt_asset)
            || is_zero_address(&collateral_token)
            || is_zero_address(&governance)
        {
            self.env().revert(CdpError::ZeroAddress);
        }

        let env = self.env();
        let collateral_decimals = token_adapter::decimals(&env, collateral_token);
        let debt_decimals = token_adapter::decimals(&env, debt_asset);
        let scale = fixed_point::decimal_scale(collateral_decimals, debt_decimals)
            .unwrap_or_else(|| env.revert(CdpError::DecimalsMismatch));

        self.access.bootstrap(governance, None);
        self.vaults.bind_token(collateral_token);

        self.debt_asset.set(debt_asset);
        self.collateral_token.set(collateral_token);
        self.decimal_scale.set(scale);
        self.total_staked.set(U256::zero());
        self.buffer.set(U256::zero());
        self.last_distribution_tick.set(env.get_block_time());
        self.total_dividend_points.set(U256::zero());
        self.unclaimed_dividends.set(U256::zero());
        self.transmutation_period.set(DEFAULT_TRANSMUTATION_PERIOD);
        self.plantable_threshold.set(U256::zero());
        self.plantable_margin.set(U256::from(DEFAULT_PLANTABLE_MARGIN));
        self.user_count.set(0);
        self.paused.set(false);
        self.initialized.set(false);
    }

    // ========== Staking ==========

    /// Stake debt asset; the amount is truncated to a whole collateral unit
    pub fn stake(&mut self, amount: U256) {
        self.require_not_paused();
        let caller = self.env().caller();
        self.run_phased_distribution();
        self.update_account(caller);
        self.check_if_new_user(caller);

        let scale = self.get_decimal_scale();
        let amount = amount - amount % scale;
        if amount.is_zero() {
            self.env().revert(CdpError::ZeroAmount);
        }

        let mut stake = self.get_stake(caller);
        stake.deposited = stake.deposited + amount;
        self.stakes.set(&caller, stake);
        let total_staked = self.get_total_staked() + amount;
        self.total_staked.set(total_staked);

        let env = self.env();
        token_adapter::transfer_from(&env, self.debt_asset(), caller, env.self_address(), amount);

        env.emit_event(Staked { account: caller, amount });
    }

    /// Withdraw staked debt asset; the unlocked share stays in the bucket
    pub fn unstake(&mut self, amount: U256) {
        let caller = self.env().caller();
        self.run_phased_distribution();
        self.update_account(caller);

        let mut stake = self.get_stake(caller);
        if amount > stake.deposited {
            self.env().revert(CdpError::UnstakeExceedsDeposit);
        }
        stake.deposited = stake.deposited - amount;
        self.stakes.set(&caller, stake);
        let total_staked = self.get_total_staked() - amount;
        self.total_staked.set(total_staked);

        token_adapter::transfer(&self.env(), self.debt_asset(), caller, amount);

        self.env().emit_event(Unstaked { account: caller, amount });
    }

    /// Burn stake against the caller's bucket and move the collateral to
    /// `realised`. Overflow beyond the stake is spread over all stakers.
    pub fn transmute(&mut self) {
        let caller = self.env().caller();
        self.run_phased_distribution();
        self.update_account(caller);
        self.check_if_new_user(caller);

        let scale = self.get_decimal_scale();
        let mut stake = self.get_stake(caller);
        if stake.inbucket.is_zero() {
            self.env().revert(CdpError::NothingToTransmute);
        }

        let mut pending_collateral = stake.inbucket;
        let mut pending_debt = pending_collateral * scale;
        let mut overflow = U256::zero();
        if pending_debt > stake.deposited {
            overflow = pending_debt - stake.deposited;
            pending_debt = stake.deposited;
            pending_collateral = pending_debt / scale;
        }

        stake.inbucket = U256::zero();
        stake.deposited = stake.deposited - pending_debt;
        stake.realised = stake.realised + pending_collateral;
        self.stakes.set(&caller, stake);
        let total_staked = self.get_total_staked() - pending_debt;
        self.total_staked.set(total_staked);

        token_adapter::burn(&self.env(), self.debt_asset(), pending_debt);

        let redistributed = overflow / scale;
        self.increase_allocations(redistributed);

        self.env().emit_event(Transmuted {
            account: caller,
            burned: pending_debt,
            realised: pending_collateral,
            redistributed,
        });
    }

    /// Pay out the caller's realised collateral
    pub fn claim(&mut self) {
        let caller = self.env().caller();
        let mut stake = self.get_stake(caller);
        let amount = stake.realised;
        if amount.is_zero() {
            self.env().revert(CdpError::NothingToClaim);
        }
        stake.realised = U256::zero();
        self.stakes.set(&caller, stake);

        self.ensure_sufficient_funds_exist_locally(amount);
        token_adapter::transfer(&self.env(), self.collateral_token(), caller, amount);

        self.env().emit_event(Claimed { account: caller, amount });
    }

    /// `transmute` followed by `claim`
    pub fn transmute_and_claim(&mut self) {
        self.transmute();
        self.claim();
    }

    /// `transmute`, `claim`, then unstake everything left
    pub fn transmute_claim_and_withdraw(&mut self) {
        self.transmute();
        self.claim();
        let remaining = self.get_stake(self.env().caller()).deposited;
        self.unstake(remaining);
    }

    /// `transmute`, then unstake everything left; `realised` stays claimable
    pub fn exit(&mut self) {
        self.transmute();
        let remaining = self.get_stake(self.env().caller()).deposited;
        self.unstake(remaining);
    }

    /// Transmute an overfilled `target`: its whole stake burns, the capped
    /// amount goes to its `realised` and the overflow to the caller's bucket
    pub fn force_transmute(&mut self, target: Address) {
        let caller = self.env().caller();
        self.run_phased_distribution();
        self.update_account(caller);
        self.update_account(target);
        self.check_if_new_user(caller);

        let scale = self.get_decimal_scale();
        let mut victim = self.get_stake(target);
        let pending_debt = victim.inbucket * scale;
        if pending_debt <= victim.deposited {
            self.env().revert(CdpError::TargetNotOverfilled);
        }

        let burned = victim.deposited;
        let excess = (pending_debt - burned) / scale;
        victim.inbucket = U256::zero();
        victim.deposited = U256::zero();
        victim.realised = victim.realised + burned / scale;
        self.stakes.set(&target, victim);
        let total_staked = self.get_total_staked() - burned;
        self.total_staked.set(total_staked);

        let mut forcer = self.get_stake(caller);
        forcer.inbucket = forcer.inbucket + excess;
        self.stakes.set(&caller, forcer);

        token_adapter::burn(&self.env(), self.debt_asset(), burned);

        self.env().emit_event(ForcedTransmute {
            forcer: caller,
            target,
            burned,
            excess,
        });
    }

    // ========== Distribution ==========

    /// Pull `amount` of collateral from the caller into the pending buffer
    /// (whitelisted callers only)
    pub fn distribute(&mut self, amount: U256) {
        self.access.require(Policy::Whitelisted);
        self.require_not_paused();
        self.run_phased_distribution();

        let origin = self.env().caller();
        let env = self.env();
        token_adapter::transfer_from(
            &env,
            self.collateral_token(),
            origin,
            env.self_address(),
            amount,
        );
        let buffer = self.buffer_amount() + amount;
        self.buffer.set(buffer);

        self.plant_or_recall_excess_funds();

        env.emit_event(Distributed { origin, amount });
    }

    // ========== Vault Operations ==========

    /// Bind the first vault (governance only, once)
    pub fn initialize(&mut self, adapter: Address) {
        self.access.require(Policy::Governance);
        if self.is_initialized() {
            self.env().revert(CdpError::AlreadyInitialized);
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

    /// Recall `amount` from vault `vault_id` (governance or sentinel, paused only)
    pub fn recall_funds_from_vault(&mut self, vault_id: u32, amount: U256) {
        self.access.require(Policy::GovernanceOrSentinel);
        self.require_paused();
        let this = self.env().self_address();
        let withdrawn = self.vaults.withdraw(vault_id, this, amount);
        self.env().emit_event(FundsRecalled { vault_id, withdrawn });
    }

    /// Recall the whole principal of vault `vault_id` (governance or
    /// sentinel, paused only)
    pub fn recall_all_funds_from_vault(&mut self, vault_id: u32) {
        self.access.require(Policy::GovernanceOrSentinel);
        self.require_paused();
        let this = self.env().self_address();
        let withdrawn = self.vaults.withdraw_all(vault_id, this);
        self.env().emit_event(FundsRecalled { vault_id, withdrawn });
    }

    /// Send yield above principal of vault `vault_id` to rewards (keepers only)
    pub fn harvest(&mut self, vault_id: u32) {
        self.access.require(Policy::Keeper);
        let rewards = self
            .rewards
            .get()
            .unwrap_or_else(|| self.env().revert(CdpError::RewardsNotSet));
        let harvested = self.vaults.harvest(vault_id, rewards);
        if harvested.is_zero() {
            return;
        }
        self.env().emit_event(FundsHarvested {
            vault_id,
            harvested,
            fee: harvested,
        });
    }

    /// Move every collateral unit not owed to stakers into `new_buffer`
    /// (governance only, paused only)
    pub fn migrate_funds(&mut self, new_buffer: Address) {
        self.access.require(Policy::Governance);
        self.require_paused();
        if is_zero_address(&new_buffer) {
            self.env().revert(CdpError::ZeroAddress);
        }

        if !self.vaults.is_empty() {
            let vault_id = self.vaults.active_index();
            let this = self.env().self_address();
            let withdrawn = self.vaults.withdraw_all(vault_id, this);
            self.env().emit_event(FundsRecalled { vault_id, withdrawn });
        }

        let env = self.env();
        let token = self.collateral_token();
        let total_funds = token_adapter::balance_of(&env, token, env.self_address());
        let obligations = self.get_total_staked() / self.get_decimal_scale();
        let amount = total_funds
            .checked_sub(obligations)
            .unwrap_or_else(|| env.revert(CdpError::InsufficientFundsForStakes));

        token_adapter::approve(&env, token, new_buffer, amount);
        let args = runtime_args! { "amount" => amount };
        let call_def = CallDef::new("distribute", true, args);
        env.call_contract::<()>(new_buffer, call_def);

        env.emit_event(MigrationComplete {
            migrate_to: new_buffer,
            amount,
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

    /// Allow or disallow `account` to call `distribute` (governance only)
    pub fn set_whitelist(&mut self, account: Address, enabled: bool) {
        self.access.set_whitelisted(account, enabled);
    }

    /// Flag or unflag `account` as keeper (governance only)
    pub fn set_keeper(&mut self, account: Address, enabled: bool) {
        self.access.set_keeper(account, enabled);
    }

    /// Set the harvest recipient (governance only)
    pub fn set_rewards(&mut self, rewards: Address) {
        self.access.require(Policy::Governance);
        if is_zero_address(&rewards) {
            self.env().revert(CdpError::ZeroAddress);
        }
        self.rewards.set(rewards);
        self.env().emit_event(RewardsUpdated { rewards });
    }

    /// Set the local collateral target (governance only)
    pub fn set_plantable_threshold(&mut self, threshold: U256) {
        self.access.require(Policy::Governance);
        self.plantable_threshold.set(threshold);
        self.env()
            .emit_event(PlantableThresholdUpdated { threshold });
    }

    /// Set the band around the threshold, in percent (governance only)
    pub fn set_plantable_margin(&mut self, margin: U256) {
        self.access.require(Policy::Governance);
        if margin > U256::from(MAXIMUM_PLANTABLE_MARGIN) {
            self.env().revert(CdpError::PlantableMarginAboveMaximum);
        }
        self.plantable_margin.set(margin);
        self.env().emit_event(PlantableMarginUpdated { margin });
    }

    /// Set the unlock period in ms (governance only)
    pub fn set_transmutation_period(&mut self, period: u64) {
        self.access.require(Policy::Governance);
        if period == 0 {
            self.env().revert(CdpError::InvalidTransmutationPeriod);
        }
        self.transmutation_period.set(period);
        self.env()
            .emit_event(TransmutationPeriodUpdated { period });
    }

    /// Pause or unpause (governance or sentinel)
    pub fn set_pause(&mut self, paused: bool) {
        self.access.require(Policy::GovernanceOrSentinel);
        self.paused.set(paused);
        self.env().emit_event(PauseUpdated { paused });
    }

    // ========== Query Functions ==========

    /// Staker view of `account`: `inbucket` includes what the accumulator
    /// already owes, `pending_divs` is the share of the unlock not run yet
    pub fn user_info(&self, account: Address) -> UserInfo {
        let stake = self.get_stake(account);
        let total_staked = self.get_total_staked();

        let points_delta = self.get_total_dividend_points() - stake.checkpoint;
        let owing = fixed_point::dividends_owing(stake.deposited, points_delta);
        let pending_divs = if total_staked.is_zero() {
            U256::zero()
        } else {
            self.pending_unlock() * stake.deposited / total_staked
        };

        UserInfo {
            deposited: stake.deposited,
            pending_divs,
            inbucket: stake.inbucket + owing,
            realised: stake.realised,
        }
    }

    /// Views of the accounts at positions `start .. start + count` of the
    /// discovery list
    pub fn get_multiple_user_info(&self, start: u32, count: u32) -> Vec<StakerSummary> {
        let end = start.saturating_add(count).min(self.user_count());
        let mut result = Vec::new();
        for index in start..end {
            if let Some(account) = self.user_list.get(&index) {
                result.push(StakerSummary {
                    account,
                    info: self.user_info(account),
                });
            }
        }
        result
    }

    /// Number of accounts in the discovery list
    pub fn user_count(&self) -> u32 {
        self.user_count.get().unwrap_or(0)
    }

    /// Raw staker record of `account`
    pub fn get_stake(&self, account: Address) -> UserStake {
        self.stakes.get(&account).unwrap_or_default()
    }

    /// Global distribution state
    pub fn buffer_info(&self) -> BufferInfo {
        BufferInfo {
            buffer: self.buffer_amount(),
            last_distribution_tick: self.last_distribution_tick.get().unwrap_or(0),
            total_dividend_points: self.get_total_dividend_points(),
            unclaimed_dividends: self.unclaimed_dividends.get().unwrap_or(U256::zero()),
            total_staked: self.get_total_staked(),
        }
    }

    /// Sum of all stakes
    pub fn get_total_staked(&self) -> U256 {
        self.total_staked.get().unwrap_or(U256::zero())
    }

    /// Unlock period (ms)
    pub fn get_transmutation_period(&self) -> u64 {
        self.transmutation_period
            .get()
            .unwrap_or(DEFAULT_TRANSMUTATION_PERIOD)
    }

    /// Local collateral target
    pub fn get_plantable_threshold(&self) -> U256 {
        self.plantable_threshold.get().unwrap_or(U256::zero())
    }

    /// Band around the threshold, percent
    pub fn get_plantable_margin(&self) -> U256 {
        self.plantable_margin
            .get()
            .unwrap_or(U256::from(DEFAULT_PLANTABLE_MARGIN))
    }

    /// Collateral to debt unit conversion factor
    pub fn get_decimal_scale(&self) -> U256 {
        self.decimal_scale.get().unwrap_or(U256::one())
    }

    /// Whether the buffer is paused
    pub fn is_paused(&self) -> bool {
        self.paused.get().unwrap_or(false)
    }

    /// Whether the first vault has been bound
    pub fn is_initialized(&self) -> bool {
        self.initialized.get().unwrap_or(false)
    }

    /// Whether `account` may call `distribute`
    pub fn is_whitelisted(&self, account: Address) -> bool {
        self.access.has_role(ROLE_WHITELISTED, account)
    }

    /// Whether `account` may call `harvest`
    pub fn is_keeper(&self, account: Address) -> bool {
        self.access.has_role(ROLE_KEEPER, account)
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

    /// Harvest recipient
    pub fn get_rewards(&self) -> Option<Address> {
        self.rewards.get()
    }

    /// Number of bound vaults
    pub fn vault_count(&self) -> u32 {
        self.vaults.count()
    }

    /// Binding at `vault_id`
    pub fn vault(&self, vault_id: u32) -> VaultBinding {
        self.vaults.get(vault_id)
    }

    /// Binding at `vault_id` with its live value
    pub fn vault_info(&self, vault_id: u32) -> VaultInfo {
        self.vaults.info(vault_id)
    }

    // ========== Internal Functions ==========

    /// Unlock the elapsed share of the buffer into the accumulator
    fn run_phased_distribution(&mut self) {
        let now = self.env().get_block_time();
        let buffer = self.buffer_amount();
        if !buffer.is_zero() {
            let unlocked = self.pending_unlock();
            self.buffer.set(buffer - unlocked);
            self.increase_allocations(unlocked);
        }
        self.last_distribution_tick.set(now);
    }

    /// Buffer share that would unlock if the distribution ran now
    fn pending_unlock(&self) -> U256 {
        let now = self.env().get_block_time();
        let last = self.last_distribution_tick.get().unwrap_or(now);
        fixed_point::unlocked_amount(
            self.buffer_amount(),
            now.saturating_sub(last),
            self.get_transmutation_period(),
        )
    }

    /// Spread `amount` over the current stakers, or return it to the buffer
    /// when nobody is staked
    fn increase_allocations(&mut self, amount: U256) {
        let total_staked = self.get_total_staked();
        if !total_staked.is_zero() && !amount.is_zero() {
            let points = self.get_total_dividend_points()
                + fixed_point::points_for(amount, total_staked);
            self.total_dividend_points.set(points);
            let unclaimed = self.unclaimed_dividends.get().unwrap_or(U256::zero()) + amount;
            self.unclaimed_dividends.set(unclaimed);
        } else {
            let buffer = self.buffer_amount() + amount;
            self.buffer.set(buffer);
        }
    }

    /// Move what the accumulator owes `account` into its bucket
    fn update_account(&mut self, account: Address) {
        let points = self.get_total_dividend_points();
        let mut stake = self.get_stake(account);
        let owing = fixed_point::dividends_owing(stake.deposited, points - stake.checkpoint);
        if !owing.is_zero() {
            let unclaimed = self
                .unclaimed_dividends
                .get()
                .unwrap_or(U256::zero())
                .saturating_sub(owing);
            self.unclaimed_dividends.set(unclaimed);
            stake.inbucket = stake.inbucket + owing;
        }
        stake.checkpoint = points;
        self.stakes.set(&account, stake);
    }

    fn check_if_new_user(&mut self, account: Address) {
        if self.known_users.get(&account).unwrap_or(false) {
            return;
        }
        let index = self.user_count();
        self.user_list.set(&index, account);
        self.known_users.set(&account, true);
        self.user_count.set(index + 1);
    }

    /// Keep the local balance inside the plantable band
    fn plant_or_recall_excess_funds(&mut self) {
        if !self.is_initialized() {
            return;
        }
        let env = self.env();
        let balance =
            token_adapter::balance_of(&env, self.collateral_token(), env.self_address());
        let threshold = self.get_plantable_threshold();
        let (low, high) = fixed_point::plantable_band(threshold, self.get_plantable_margin());

        if balance > high {
            let vault_id = self.vaults.active_index();
            let amount = self.vaults.deposit(vault_id, balance - threshold);
            env.emit_event(FundsFlushed { vault_id, amount });
        } else if balance < low {
            self.recall_from_active_vault(threshold - balance);
        }
    }

    /// Top up the local balance so `amount` can be paid, refilling to the
    /// plantable threshold on the way
    fn ensure_sufficient_funds_exist_locally(&mut self, amount: U256) {
        let env = self.env();
        let balance =
            token_adapter::balance_of(&env, self.collateral_token(), env.self_address());
        if balance < amount {
            let target = self.get_plantable_threshold() + (amount - balance);
            self.recall_from_active_vault(target);
        }
    }

    /// Recall up to `amount`, capped at what the active vault can return
    fn recall_from_active_vault(&mut self, amount: U256) {
        let amount = amount.min(self.vaults.active_recallable());
        if amount.is_zero() {
            return;
        }
        let vault_id = self.vaults.active_index();
        let this = self.env().self_address();
        let withdrawn = self.vaults.withdraw(vault_id, this, amount);
        self.env().emit_event(FundsRecalled { vault_id, withdrawn });
    }

    fn bind_vault(&mut self, adapter: Address) {
        let vault_id = self.vaults.push(adapter);
        self.env()
            .emit_event(ActiveVaultUpdated { adapter, vault_id });
    }

    fn buffer_amount(&self) -> U256 {
        self.buffer.get().unwrap_or(U256::zero())
    }

    fn get_total_dividend_points(&self) -> U256 {
        self.total_dividend_points.get().unwrap_or(U256::zero())
    }

    fn debt_asset(&self) -> Address {
        self.debt_asset
            .get()
            .unwrap_or_else(|| self.env().revert(CdpError::NotInitialized))
    }

    fn collateral_token(&self) -> Address {
        self.collateral_token
            .get()
            .unwrap_or_else(|| self.env().revert(CdpError::NotInitialized))
    }

    fn require_initialized(&self) {
        if !self.is_initialized() {
            self.env().revert(CdpError::NotInitialized);
        }
    }

    fn require_paused(&self) {
        if !self.is_paused() {
            self.env().revert(CdpError::NotPaused);
        }
    }

    fn require_not_paused(&self) {
        if self.is_paused() {
            self.env().revert(CdpError::Paused);
        }
    }
}
