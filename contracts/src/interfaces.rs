//! Query results exposed by the protocol contracts.

use odra::prelude::*;
use odra::casper_types::U256;

/// Staker view returned by `RedemptionBuffer::user_info`
#[odra::odra_type]
#[derive(Default)]
pub struct UserInfo {
    /// Staked debt asset
    pub deposited: U256,
    /// Staker's share of the buffer that would unlock if the phased
    /// distribution ran now
    pub pending_divs: U256,
    /// Bucket balance plus dividends the accumulator already owes
    pub inbucket: U256,
    /// Collateral ready to claim
    pub realised: U256,
}

/// One row of `RedemptionBuffer::get_multiple_user_info`
#[odra::odra_type]
pub struct StakerSummary {
    /// Staker address
    pub account: Address,
    /// Staker view
    pub info: UserInfo,
}

/// Global distribution state of the RedemptionBuffer
#[odra::odra_type]
pub struct BufferInfo {
    /// Collateral waiting to be unlocked
    pub buffer: U256,
    /// Block time (ms) of the last phased distribution
    pub last_distribution_tick: u64,
    /// Cumulative dividend points per staked unit
    pub total_dividend_points: U256,
    /// Collateral allocated to stakers and not yet moved to buckets
    pub unclaimed_dividends: U256,
    /// Total staked debt asset
    pub total_staked: U256,
}

/// Vault binding enriched with the adapter's live value
#[odra::odra_type]
pub struct VaultInfo {
    /// Position in the vault list
    pub vault_id: u32,
    /// VaultAdapter contract
    pub adapter: Address,
    /// Principal recorded for the binding
    pub total_deposited: U256,
    /// Value currently reported by the adapter
    pub total_value: U256,
    /// Whether this is the active vault
    pub active: bool,
}
