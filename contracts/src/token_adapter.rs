//! Token Adapter
//!
//! Cross-contract helpers for the CEP-18 style tokens the protocol moves
//! around: the collateral token and the debt asset. Every helper takes the
//! calling contract's environment and issues a `CallDef` against the token,
//! so a failing token call aborts the caller's whole operation.
//!
//! The runtime argument names match the entry points of
//! [`crate::debt_asset::DebtAsset`].

use odra::prelude::*;
use odra::casper_types::{runtime_args, RuntimeArgs, U256};
use odra::{CallDef, ContractEnv};
use crate::errors::CdpError;

/// Token balance snapshot around an external call
#[odra::odra_type]
#[derive(Default)]
pub struct BalanceSnapshot {
    /// Balance before operation
    pub before: U256,
    /// Balance after operation
    pub after: U256,
}

impl BalanceSnapshot {
    /// Amount gained between the two readings (zero if the balance fell)
    pub fn increase(&self) -> U256 {
        self.after.saturating_sub(self.before)
    }
}

// ========== Queries ==========

/// Balance of `account` on `token`
pub fn balance_of(env: &ContractEnv, token: Address, account: Address) -> U256 {
    let args = runtime_args! { "account" => account };
    let call_def = CallDef::new("balance_of", false, args);
    env.call_contract(token, call_def)
}

/// Decimals reported by `token`
pub fn decimals(env: &ContractEnv, token: Address) -> u8 {
    let call_def = CallDef::new("decimals", false, RuntimeArgs::new());
    env.call_contract(token, call_def)
}

// ========== Transfers ==========

/// Send `amount` of the caller contract's own tokens to `recipient`
pub fn transfer(env: &ContractEnv, token: Address, recipient: Address, amount: U256) {
    if amount.is_zero() {
        return;
    }
    let args = runtime_args! {
        "recipient" => recipient,
        "amount" => amount
    };
    let call_def = CallDef::new("transfer", true, args);
    let ok: bool = env.call_contract(token, call_def);
    if !ok {
        env.revert(CdpError::TokenTransferFailed);
    }
}

/// Pull `amount` from `owner` to `recipient` using the caller contract's allowance
pub fn transfer_from(
    env: &ContractEnv,
    token: Address,
    owner: Address,
    recipient: Address,
    amount: U256,
) {
    if amount.is_zero() {
        return;
    }
    let args = runtime_args! {
        "owner" => owner,
        "recipient" => recipient,
        "amount" => amount
    };
    let call_def = CallDef::new("transfer_from", true, args);
    let ok: bool = env.call_contract(token, call_def);
    if !ok {
        env.revert(CdpError::TokenTransferFailed);
    }
}

/// Set the caller contract's allowance for `spender`
pub fn approve(env: &ContractEnv, token: Address, spender: Address, amount: U256) {
    let args = runtime_args! {
        "spender" => spender,
        "amount" => amount
    };
    let call_def = CallDef::new("approve", true, args);
    let ok: bool = env.call_contract(token, call_def);
    if !ok {
        env.revert(CdpError::TokenTransferFailed);
    }
}

// ========== Debt Asset Supply ==========

/// Mint debt asset to `to`; the token enforces whitelist, blacklist and ceiling
pub fn mint(env: &ContractEnv, token: Address, to: Address, amount: U256) {
    let args = runtime_args! {
        "to" => to,
        "amount" => amount
    };
    let call_def = CallDef::new("mint", true, args);
    env.call_contract::<()>(token, call_def);
}

/// Burn the caller contract's own balance
pub fn burn(env: &ContractEnv, token: Address, amount: U256) {
    if amount.is_zero() {
        return;
    }
    let args = runtime_args! { "amount" => amount };
    let call_def = CallDef::new("burn", true, args);
    env.call_contract::<()>(token, call_def);
}

/// Burn `amount` from `from` against the caller contract's allowance
pub fn burn_from(env: &ContractEnv, token: Address, from: Address, amount: U256) {
    if amount.is_zero() {
        return;
    }
    let args = runtime_args! {
        "from" => from,
        "amount" => amount
    };
    let call_def = CallDef::new("burn_from", true, args);
    env.call_contract::<()>(token, call_def);
}

/// Reduce the caller contract's minted counter on the debt asset
pub fn lower_has_minted(env: &ContractEnv, token: Address, amount: U256) {
    if amount.is_zero() {
        return;
    }
    let args = runtime_args! { "amount" => amount };
    let call_def = CallDef::new("lower_has_minted", true, args);
    env.call_contract::<()>(token, call_def);
}
