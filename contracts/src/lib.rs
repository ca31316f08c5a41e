//! Formation CDP Contracts
//!
//! Yield-backed collateralized debt positions on Casper.
//!
//! ## Architecture
//!
//! - **CollateralVaultManager**: collateral/debt ledger, minting against
//!   collateral, routing idle collateral into yield vaults, harvesting
//! - **RedemptionBuffer**: stakers lock debt asset and receive harvested
//!   collateral 1:1, unlocked linearly over the transmutation period
//! - **DebtAsset**: CEP-18 debt token with whitelisted, ceiling-capped minters
//! - **HoldingVaultAdapter**: minimal yield venue behind the `VaultAdapter`
//!   interface
//!
//! ## Flow
//!
//! deposit -> mint -> (vault yield) -> harvest -> distribute -> transmute -> claim
//!
//! Every entry point either commits fully or reverts; ledgers are written
//! before any token or adapter call.

#![cfg_attr(target_arch = "wasm32", no_std)]

#[cfg(target_arch = "wasm32")]
extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod types;
pub mod errors;
pub mod events;
pub mod interfaces;
pub mod fixed_point;

// Building blocks
pub mod access_control;
pub mod token_adapter;
pub mod vault_adapter;
pub mod vault_list;

// Contract modules
pub mod debt_asset;
pub mod collateral_vault_manager;
pub mod redemption_buffer;
