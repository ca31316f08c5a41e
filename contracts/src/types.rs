//! Common types used across the CDP protocol.

use odra::prelude::*;
use odra::casper_types::account::AccountHash;
use odra::casper_types::U256;

/// Role constants (u8 for efficient storage)
pub const ROLE_GOVERNANCE: u8 = 0;
pub const ROLE_SENTINEL: u8 = 1;
pub const ROLE_KEEPER: u8 = 2;
pub const ROLE_WHITELISTED: u8 = 3;

/// Per-owner position in the CollateralVaultManager.
///
/// Created implicitly on first deposit and left in place (zeroed) when the
/// position is closed.
#[odra::odra_type]
#[derive(Default)]
pub struct Account {
    /// Collateral credited to the owner (collateral units)
    pub deposited_collateral: U256,
    /// Outstanding debt (debt asset units)
    pub debt: U256,
}

/// One entry of the append-only vault list.
#[odra::odra_type]
pub struct VaultBinding {
    /// VaultAdapter contract
    pub adapter: Address,
    /// Principal routed into the adapter and not yet recalled
    pub total_deposited: U256,
}

/// Per-staker state in the RedemptionBuffer.
#[odra::odra_type]
#[derive(Default)]
pub struct UserStake {
    /// Staked debt asset (debt units)
    pub deposited: U256,
    /// Value of the dividend accumulator at the last account update
    pub checkpoint: U256,
    /// Unlocked collateral not yet transmuted (collateral units)
    pub inbucket: U256,
    /// Transmuted collateral awaiting claim (collateral units)
    pub realised: U256,
}

/// Access policy evaluated by the role store.
#[odra::odra_type]
#[derive(Copy)]
pub enum Policy {
    /// Current governance only
    Governance,
    /// Governance or the sentinel
    GovernanceOrSentinel,
    /// Accounts flagged as keepers
    Keeper,
    /// Accounts flagged as whitelisted
    Whitelisted,
}

/// The all-zero account address, treated as "unset".
pub fn zero_address() -> Address {
    Address::Account(AccountHash::default())
}

/// Whether `address` is the all-zero account address.
pub fn is_zero_address(address: &Address) -> bool {
    *address == zero_address()
}
