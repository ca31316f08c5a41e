//! Vault list
//!
//! Append-only sequence of [`VaultBinding`]s with the last entry acting as
//! the active vault. Bindings are never removed, so earlier vaults stay
//! valid recall targets after a migration. Each binding tracks the
//! principal routed into its adapter; anything the adapter reports above
//! that principal is harvestable yield.
//!
//! Principal is updated before the adapter is called.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::errors::CdpError;
use crate::interfaces::VaultInfo;
use crate::token_adapter::{self, BalanceSnapshot};
use crate::types::{is_zero_address, VaultBinding};
use crate::vault_adapter::VaultAdapterContractRef;

/// Vault list module
#[odra::module]
pub struct VaultList {
    /// Underlying token every adapter must hold
    token: Var<Address>,
    /// Bindings by position
    bindings: Mapping<u32, VaultBinding>,
    /// Number of bindings
    count: Var<u32>,
    /// Adapters ever pushed
    registered: Mapping<Address, bool>,
}

#[odra::module]
impl VaultList {
    /// Fix the underlying token for the list
    pub fn bind_token(&mut self, token: Address) {
        if self.token.get().is_some() {
            self.env().revert(CdpError::AlreadyInitialized);
        }
        self.token.set(token);
    }

    // ========== Queries ==========

    /// Number of bindings
    pub fn count(&self) -> u32 {
        self.count.get().unwrap_or(0)
    }

    /// Whether no vault has been pushed yet
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Index of the active (last) vault
    pub fn active_index(&self) -> u32 {
        let count = self.count();
        if count == 0 {
            self.env().revert(CdpError::NotInitialized);
        }
        count - 1
    }

    /// Whether `adapter` was ever pushed
    pub fn is_registered(&self, adapter: Address) -> bool {
        self.registered.get(&adapter).unwrap_or(false)
    }

    /// Binding at `vault_id`
    pub fn get(&self, vault_id: u32) -> VaultBinding {
        self.bindings
            .get(&vault_id)
            .unwrap_or_else(|| self.env().revert(CdpError::InvalidVaultId))
    }

    /// Value the adapter at `vault_id` currently reports
    pub fn total_value(&self, vault_id: u32) -> U256 {
        let binding = self.get(vault_id);
        VaultAdapterContractRef::new(self.env(), binding.adapter).total_value()
    }

    /// Binding at `vault_id` with its live value
    pub fn info(&self, vault_id: u32) -> VaultInfo {
        let binding = self.get(vault_id);
        VaultInfo {
            vault_id,
            adapter: binding.adapter,
            total_deposited: binding.total_deposited,
            total_value: self.total_value(vault_id),
            active: vault_id == self.active_index(),
        }
    }

    /// Amount that can be recalled from the active vault without exceeding
    /// its principal or its reported value
    pub fn active_recallable(&self) -> U256 {
        if self.is_empty() {
            return U256::zero();
        }
        let vault_id = self.active_index();
        let principal = self.get(vault_id).total_deposited;
        if principal.is_zero() {
            return U256::zero();
        }
        principal.min(self.total_value(vault_id))
    }

    // ========== Mutations ==========

    /// Append `adapter` and make it the active vault.
    ///
    /// Rejects the zero address, an adapter already in the list and an
    /// adapter whose token differs from the list's token.
    pub fn push(&mut self, adapter: Address) -> u32 {
        if is_zero_address(&adapter) {
            self.env().revert(CdpError::ZeroAddress);
        }
        if self.is_registered(adapter) {
            self.env().revert(CdpError::AdapterAlreadyRegistered);
        }
        let token = self.token();
        let adapter_token = VaultAdapterContractRef::new(self.env(), adapter).token();
        if adapter_token != token {
            self.env().revert(CdpError::AdapterTokenMismatch);
        }

        let vault_id = self.count();
        self.bindings.set(
            &vault_id,
            VaultBinding {
                adapter,
                total_deposited: U256::zero(),
            },
        );
        self.registered.set(&adapter, true);
        self.count.set(vault_id + 1);
        vault_id
    }

    /// Move `amount` of this contract's tokens into the vault
    pub fn deposit(&mut self, vault_id: u32, amount: U256) -> U256 {
        let mut binding = self.get(vault_id);
        if amount.is_zero() {
            return U256::zero();
        }
        binding.total_deposited = binding.total_deposited + amount;
        self.bindings.set(&vault_id, binding.clone());

        let token = self.token();
        token_adapter::transfer(&self.env(), token, binding.adapter, amount);
        VaultAdapterContractRef::new(self.env(), binding.adapter).deposit(amount);
        amount
    }

    /// Recall `amount` of principal to `recipient`; returns the amount the
    /// recipient received
    pub fn withdraw(&mut self, vault_id: u32, recipient: Address, amount: U256) -> U256 {
        let mut binding = self.get(vault_id);
        if amount.is_zero() {
            return U256::zero();
        }
        binding.total_deposited = binding
            .total_deposited
            .checked_sub(amount)
            .unwrap_or_else(|| self.env().revert(CdpError::ArithmeticUnderflow));
        self.bindings.set(&vault_id, binding.clone());

        self.send_from_adapter(binding.adapter, recipient, amount)
    }

    /// Recall the whole recorded principal to `recipient`
    pub fn withdraw_all(&mut self, vault_id: u32, recipient: Address) -> U256 {
        let principal = self.get(vault_id).total_deposited;
        self.withdraw(vault_id, recipient, principal)
    }

    /// Send everything the adapter holds above its principal to `recipient`.
    ///
    /// Returns zero, and moves nothing, when there is no yield.
    pub fn harvest(&mut self, vault_id: u32, recipient: Address) -> U256 {
        let binding = self.get(vault_id);
        let value = self.total_value(vault_id);
        if value <= binding.total_deposited {
            return U256::zero();
        }
        let harvestable = value - binding.total_deposited;
        self.send_from_adapter(binding.adapter, recipient, harvestable)
    }

    // ========== Internal Functions ==========

    fn token(&self) -> Address {
        self.token
            .get()
            .unwrap_or_else(|| self.env().revert(CdpError::NotInitialized))
    }

    fn send_from_adapter(&mut self, adapter: Address, recipient: Address, amount: U256) -> U256 {
        let token = self.token();
        let env = self.env();
        let mut snapshot = BalanceSnapshot {
            before: token_adapter::balance_of(&env, token, recipient),
            after: U256::zero(),
        };
        VaultAdapterContractRef::new(env.clone(), adapter).withdraw(recipient, amount);
        snapshot.after = token_adapter::balance_of(&env, token, recipient);
        snapshot.increase()
    }
}
