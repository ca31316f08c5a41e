//! Debt Asset Contract
//!
//! CEP-18 compatible token minted against collateral by the vault manager.
//! Minting is limited to whitelisted, non-blacklisted minters, each under
//! its own ceiling on the cumulative amount minted. Repaid debt lowers the
//! minter's counter again.
//!
//! The same contract, deployed with a different name and decimals, serves
//! as the collateral token in test deployments.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::CdpError;

/// Debt Asset Contract
#[odra::module]
pub struct DebtAsset {
    /// Token name
    name: Var<String>,
    /// Token symbol
    symbol: Var<String>,
    /// Decimals
    decimals: Var<u8>,
    /// Total supply
    total_supply: Var<U256>,
    /// Balance mapping
    balances: Mapping<Address, U256>,
    /// Allowance mapping (owner, spender) -> amount
    allowances: Mapping<(Address, Address), U256>,
    /// Token administrator
    admin: Var<Address>,
    /// Minters allowed to call `mint`
    whitelist: Mapping<Address, bool>,
    /// Minters barred from calling `mint`
    blacklist: Mapping<Address, bool>,
    /// Per-minter cap on the cumulative minted amount
    ceiling: Mapping<Address, U256>,
    /// Per-minter cumulative minted amount
    has_minted: Mapping<Address, U256>,
}

#[odra::module]
impl DebtAsset {
    /// Initialize the token; the deployer becomes admin
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());
        self.admin.set(self.env().caller());
    }

    // ========== CEP-18 Standard Functions ==========

    /// Get token name
    pub fn name(&self) -> String {
        self.name.get().unwrap_or_default()
    }

    /// Get token symbol
    pub fn symbol(&self) -> String {
        self.symbol.get().unwrap_or_default()
    }

    /// Get decimals
    pub fn decimals(&self) -> u8 {
        self.decimals.get().unwrap_or(18)
    }

    /// Get total supply
    pub fn total_supply(&self) -> U256 {
        self.total_supply.get().unwrap_or(U256::zero())
    }

    /// Get balance of an account
    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).unwrap_or(U256::zero())
    }

    /// Get allowance for spender
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or(U256::zero())
    }

    /// Transfer tokens to recipient
    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.transfer_internal(sender, recipient, amount);
        true
    }

    /// Approve spender to spend tokens
    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.allowances.set(&(owner, spender), amount);
        true
    }

    /// Transfer tokens from owner to recipient (requires allowance)
    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();
        self.spend_allowance(owner, spender, amount);
        self.transfer_internal(owner, recipient, amount);
        true
    }

    // ========== Minting and Burning ==========

    /// Mint new tokens (whitelisted minters, within ceiling)
    pub fn mint(&mut self, to: Address, amount: U256) {
        let minter = self.env().caller();
        if !self.is_whitelisted(minter) {
            self.env().revert(CdpError::NotWhitelisted);
        }
        if self.is_blacklisted(minter) {
            self.env().revert(CdpError::Blacklisted);
        }

        let minted = self.has_minted(minter) + amount;
        if minted > self.ceiling(minter) {
            self.env().revert(CdpError::CeilingBreached);
        }
        self.has_minted.set(&minter, minted);

        let balance = self.balance_of(to);
        self.balances.set(&to, balance + amount);

        let new_supply = self.total_supply() + amount;
        self.total_supply.set(new_supply);
    }

    /// Burn tokens from caller
    pub fn burn(&mut self, amount: U256) {
        let caller = self.env().caller();
        self.burn_internal(caller, amount);
    }

    /// Burn tokens from `from` using the caller's allowance
    pub fn burn_from(&mut self, from: Address, amount: U256) {
        let spender = self.env().caller();
        self.spend_allowance(from, spender, amount);
        self.burn_internal(from, amount);
    }

    /// Lower the caller's minted counter after its debt was repaid
    pub fn lower_has_minted(&mut self, amount: U256) {
        let minter = self.env().caller();
        if !self.is_whitelisted(minter) {
            self.env().revert(CdpError::NotWhitelisted);
        }
        let minted = self
            .has_minted(minter)
            .checked_sub(amount)
            .unwrap_or_else(|| self.env().revert(CdpError::ArithmeticUnderflow));
        self.has_minted.set(&minter, minted);
    }

    // ========== Admin Functions ==========

    /// Allow or disallow `minter` to mint (admin only)
    pub fn set_whitelist(&mut self, minter: Address, enabled: bool) {
        self.require_admin();
        self.whitelist.set(&minter, enabled);
    }

    /// Bar `minter` from minting (admin only)
    pub fn set_blacklist(&mut self, minter: Address) {
        self.require_admin();
        self.blacklist.set(&minter, true);
    }

    /// Set the cumulative mint cap for `minter` (admin only)
    pub fn set_ceiling(&mut self, minter: Address, ceiling: U256) {
        self.require_admin();
        self.ceiling.set(&minter, ceiling);
    }

    /// Check if `minter` is whitelisted
    pub fn is_whitelisted(&self, minter: Address) -> bool {
        self.whitelist.get(&minter).unwrap_or(false)
    }

    /// Check if `minter` is blacklisted
    pub fn is_blacklisted(&self, minter: Address) -> bool {
        self.blacklist.get(&minter).unwrap_or(false)
    }

    /// Mint cap of `minter`
    pub fn ceiling(&self, minter: Address) -> U256 {
        self.ceiling.get(&minter).unwrap_or(U256::zero())
    }

    /// Cumulative amount minted by `minter`
    pub fn has_minted(&self, minter: Address) -> U256 {
        self.has_minted.get(&minter).unwrap_or(U256::zero())
    }

    /// Token administrator
    pub fn admin(&self) -> Option<Address> {
        self.admin.get()
    }

    // ========== Internal Functions ==========

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            self.env().revert(CdpError::InsufficientTokenBalance);
        }
        self.balances.set(&from, from_balance - amount);

        let to_balance = self.balance_of(to);
        self.balances.set(&to, to_balance + amount);
    }

    fn spend_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        let current_allowance = self.allowance(owner, spender);
        if current_allowance < amount {
            self.env().revert(CdpError::InsufficientAllowance);
        }
        self.allowances.set(&(owner, spender), current_allowance - amount);
    }

    fn burn_internal(&mut self, from: Address, amount: U256) {
        let current_balance = self.balance_of(from);
        if current_balance < amount {
            self.env().revert(CdpError::InsufficientTokenBalance);
        }
        self.balances.set(&from, current_balance - amount);

        let new_supply = self.total_supply() - amount;
        self.total_supply.set(new_supply);
    }

    fn require_admin(&self) {
        if self.admin.get() != Some(self.env().caller()) {
            self.env().revert(CdpError::Unauthorized);
        }
    }
}
