//! Vault adapters
//!
//! A vault adapter wraps one yield source for a single owner (the vault
//! manager or the redemption buffer). The owner transfers the underlying
//! token to the adapter and then calls `deposit`; `withdraw` sends tokens
//! back to any recipient; `total_value` reports principal plus accrued
//! yield in underlying units.
//!
//! [`HoldingVaultAdapter`] is the minimal venue: it simply holds the token,
//! so any tokens sent to it directly show up as yield.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::CdpError;
use crate::token_adapter;
use crate::types::is_zero_address;

/// Interface every yield venue exposes to its owner
#[odra::external_contract]
pub trait VaultAdapter {
    /// Underlying token, must equal the owner's collateral token
    fn token(&self) -> Address;
    /// Put `amount` (already transferred to the adapter) to work
    fn deposit(&mut self, amount: U256);
    /// Send `amount` of underlying to `recipient`
    fn withdraw(&mut self, recipient: Address, amount: U256);
    /// Principal plus accrued yield, in underlying units
    fn total_value(&self) -> U256;
}

/// Adapter that keeps the underlying token on its own balance
#[odra::module]
pub struct HoldingVaultAdapter {
    /// Underlying token
    token: Var<Address>,
    /// Owning contract allowed to deposit and withdraw
    admin: Var<Address>,
    /// Sum of amounts passed to `deposit`
    deposited: Var<U256>,
}

#[odra::module]
impl HoldingVaultAdapter {
    /// Initialize the adapter for `token`, owned by `admin`
    pub fn init(&mut self, token: Address, admin: Address) {
        if is_zero_address(&token) || is_zero_address(&admin) {
            self.env().revert(CdpError::ZeroAddress);
        }
        self.token.set(token);
        self.admin.set(admin);
        self.deposited.set(U256::zero());
    }

    /// Underlying token
    pub fn token(&self) -> Address {
        self.token
            .get()
            .unwrap_or_else(|| self.env().revert(CdpError::NotInitialized))
    }

    /// Owning contract
    pub fn admin(&self) -> Option<Address> {
        self.admin.get()
    }

    /// Record a deposit; the tokens are already on this contract's balance
    pub fn deposit(&mut self, amount: U256) {
        self.require_admin();
        let deposited = self.deposited.get().unwrap_or(U256::zero());
        self.deposited.set(deposited + amount);
    }

    /// Send `amount` of underlying to `recipient`
    pub fn withdraw(&mut self, recipient: Address, amount: U256) {
        self.require_admin();
        let token = self.token();
        token_adapter::transfer(&self.env(), token, recipient, amount);

        let deposited = self.deposited.get().unwrap_or(U256::zero());
        self.deposited.set(deposited.saturating_sub(amount));
    }

    /// Current token balance of the adapter
    pub fn total_value(&self) -> U256 {
        let token = self.token();
        token_adapter::balance_of(&self.env(), token, self.env().self_address())
    }

    /// Sum of recorded deposits net of withdrawals
    pub fn total_deposited(&self) -> U256 {
        self.deposited.get().unwrap_or(U256::zero())
    }

    // ========== Internal Functions ==========

    fn require_admin(&self) {
        if self.admin.get() != Some(self.env().caller()) {
            self.env().revert(CdpError::Unauthorized);
        }
    }
}
