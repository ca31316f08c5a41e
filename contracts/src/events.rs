//! Events emitted by the protocol contracts.

use odra::prelude::*;
use odra::casper_types::U256;

// ========== Role store ==========

#[odra::event]
pub struct PendingGovernanceUpdated {
    pub pending_governance: Address,
}

#[odra::event]
pub struct GovernanceUpdated {
    pub governance: Address,
}

#[odra::event]
pub struct SentinelUpdated {
    pub sentinel: Address,
}

#[odra::event]
pub struct RoleUpdated {
    pub role: u8,
    pub account: Address,
    pub enabled: bool,
}

// ========== Vault routing ==========

#[odra::event]
pub struct ActiveVaultUpdated {
    pub adapter: Address,
    pub vault_id: u32,
}

#[odra::event]
pub struct FundsFlushed {
    pub vault_id: u32,
    pub amount: U256,
}

#[odra::event]
pub struct FundsRecalled {
    pub vault_id: u32,
    pub withdrawn: U256,
}

#[odra::event]
pub struct FundsHarvested {
    pub vault_id: u32,
    pub harvested: U256,
    pub fee: U256,
}

#[odra::event]
pub struct RewardsUpdated {
    pub rewards: Address,
}

// ========== CollateralVaultManager ==========

#[odra::event]
pub struct TokensDeposited {
    pub account: Address,
    pub amount: U256,
}

#[odra::event]
pub struct TokensWithdrawn {
    pub account: Address,
    pub amount: U256,
}

#[odra::event]
pub struct TokensMinted {
    pub account: Address,
    pub amount: U256,
    pub new_debt: U256,
}

#[odra::event]
pub struct TokensRepaid {
    pub account: Address,
    pub debt_amount: U256,
    pub collateral_amount: U256,
    pub new_debt: U256,
}

#[odra::event]
pub struct TokensLiquidated {
    pub account: Address,
    pub requested: U256,
    pub withdrawn: U256,
}

#[odra::event]
pub struct RedemptionBufferUpdated {
    pub redemption_buffer: Address,
}

#[odra::event]
pub struct HarvestFeeUpdated {
    pub harvest_fee: u64,
}

#[odra::event]
pub struct CollateralizationLimitUpdated {
    pub limit: U256,
}

#[odra::event]
pub struct FlushActivatorUpdated {
    pub flush_activator: U256,
}

#[odra::event]
pub struct EmergencyExitUpdated {
    pub status: bool,
}

// ========== RedemptionBuffer ==========

#[odra::event]
pub struct Staked {
    pub account: Address,
    pub amount: U256,
}

#[odra::event]
pub struct Unstaked {
    pub account: Address,
    pub amount: U256,
}

#[odra::event]
pub struct Transmuted {
    pub account: Address,
    pub burned: U256,
    pub realised: U256,
    pub redistributed: U256,
}

#[odra::event]
pub struct Claimed {
    pub account: Address,
    pub amount: U256,
}

#[odra::event]
pub struct ForcedTransmute {
    pub forcer: Address,
    pub target: Address,
    pub burned: U256,
    pub excess: U256,
}

#[odra::event]
pub struct Distributed {
    pub origin: Address,
    pub amount: U256,
}

#[odra::event]
pub struct PauseUpdated {
    pub paused: bool,
}

#[odra::event]
pub struct PlantableThresholdUpdated {
    pub threshold: U256,
}

#[odra::event]
pub struct PlantableMarginUpdated {
    pub margin: U256,
}

#[odra::event]
pub struct TransmutationPeriodUpdated {
    pub period: u64,
}

#[odra::event]
pub struct MigrationComplete {
    pub migrate_to: Address,
    pub amount: U256,
}
