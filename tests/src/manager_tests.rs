//! CollateralVaultManager scenarios

use crate::fixture::{limit, units, Protocol, STARTING_COLLATERAL};
use formation_cdp_contracts::collateral_vault_manager::{
    CollateralVaultManager, CollateralVaultManagerInitArgs,
};
use formation_cdp_contracts::errors::CdpError;
use formation_cdp_contracts::types::zero_address;
use formation_cdp_contracts::vault_adapter::{HoldingVaultAdapter, HoldingVaultAdapterInitArgs};
use odra::casper_types::U256;
use odra::host::{Deployer, HostRef};
use odra::prelude::*;
use pretty_assertions::assert_eq;

// ========== Construction ==========

#[test]
fn test_init_rejects_zero_addresses_and_activator() {
    let p = Protocol::deploy();
    let collateral_token = p.collateral.address().clone();
    let debt_asset = p.debt.address().clone();
    let args = || CollateralVaultManagerInitArgs {
        collateral_token,
        debt_asset,
        governance: p.governance,
        sentinel: p.sentinel,
        flush_activator: units(1000),
    };

    let cases = [
        CollateralVaultManagerInitArgs {
            collateral_token: zero_address(),
            ..args()
        },
        CollateralVaultManagerInitArgs {
            debt_asset: zero_address(),
            ..args()
        },
        CollateralVaultManagerInitArgs {
            governance: zero_address(),
            ..args()
        },
        CollateralVaultManagerInitArgs {
            sentinel: zero_address(),
            ..args()
        },
    ];
    for init_args in cases {
        assert_eq!(
            CollateralVaultManager::try_deploy(&p.env, init_args).err(),
            Some(CdpError::ZeroAddress.into())
        );
    }

    let zero_activator = CollateralVaultManagerInitArgs {
        flush_activator: U256::zero(),
        ..args()
    };
    assert_eq!(
        CollateralVaultManager::try_deploy(&p.env, zero_activator).err(),
        Some(CdpError::InvalidFlushActivator.into())
    );
    assert!(CollateralVaultManager::try_deploy(&p.env, args()).is_ok());
}

// ========== Ledger ==========

#[test]
fn test_deposit_mint_withdraw_at_two_x() {
    let mut p = Protocol::deploy();
    p.as_user(p.alice);
    p.manager.deposit(units(5000));
    p.manager.mint(units(1000));

    assert_eq!(p.manager.withdrawable_collateral(p.alice), units(3000));
    p.manager.withdraw(units(3000));

    let account = p.manager.get_account(p.alice);
    assert_eq!(account.deposited_collateral, units(2000));
    assert_eq!(account.debt, units(1000));
    assert_eq!(
        p.collateral_of(p.alice),
        units(STARTING_COLLATERAL) - units(2000)
    );
    assert_eq!(p.debt.balance_of(p.alice), units(1000));
}

#[test]
fn test_withdraw_beyond_withdrawable_fails() {
    let mut p = Protocol::deploy();
    p.as_user(p.alice);
    p.manager.deposit(units(5000));
    p.manager.mint(units(1000));

    assert_eq!(
        p.manager.try_withdraw(units(3001)),
        Err(CdpError::ExceedsWithdrawable.into())
    );
    assert_eq!(p.manager.get_account(p.alice).deposited_collateral, units(5000));
}

#[test]
fn test_mint_respects_collateralization_limit() {
    let mut p = Protocol::deploy();
    p.as_user(p.alice);
    p.manager.deposit(units(5000));

    assert_eq!(
        p.manager.try_mint(units(2501)),
        Err(CdpError::CollateralizationBreached.into())
    );
    p.manager.mint(units(2500));
    assert_eq!(
        p.manager.try_mint(units(1)),
        Err(CdpError::CollateralizationBreached.into())
    );
    assert_eq!(p.manager.total_debt(), units(2500));
}

#[test]
fn test_mint_above_debt_ceiling_aborts() {
    let mut p = Protocol::deploy();
    let manager = p.manager_address();
    p.as_user(p.governance);
    p.debt.set_ceiling(manager, units(100));

    p.as_user(p.alice);
    p.manager.deposit(units(5000));
    assert!(p.manager.try_mint(units(101)).is_err());
    assert_eq!(p.manager.get_account(p.alice).debt, U256::zero());
    p.manager.mint(units(100));
}

#[test]
fn test_zero_amounts_rejected() {
    let mut p = Protocol::deploy();
    p.as_user(p.alice);
    assert_eq!(
        p.manager.try_deposit(U256::zero()),
        Err(CdpError::ZeroAmount.into())
    );
    assert_eq!(
        p.manager.try_mint(U256::zero()),
        Err(CdpError::ZeroAmount.into())
    );
}

#[test]
fn test_deposit_withdraw_round_trip() {
    let mut p = Protocol::deploy_with(18, units(1000));
    let before = p.collateral_of(p.alice);

    p.as_user(p.alice);
    p.manager.deposit(units(4321));
    p.manager.withdraw(units(4321));

    assert_eq!(p.collateral_of(p.alice), before);
    assert_eq!(p.manager.get_account(p.alice).deposited_collateral, U256::zero());
    assert_eq!(p.manager.total_deposited(), U256::zero());
}

#[test]
fn test_deposits_match_holdings() {
    let mut p = Protocol::deploy_with(18, units(3000));

    p.as_user(p.alice);
    p.manager.deposit(units(5000));
    p.manager.mint(units(1000));
    p.as_user(p.bob);
    p.manager.deposit(units(1200));
    p.as_user(p.alice);
    p.manager.withdraw(units(2500));
    p.as_user(p.bob);
    p.manager.deposit(units(800));
    p.manager.withdraw(units(1500));

    let deposited = p.manager.get_account(p.alice).deposited_collateral
        + p.manager.get_account(p.bob).deposited_collateral;
    assert_eq!(deposited, p.manager.total_deposited());
    assert_eq!(deposited, p.manager_holdings());
}

// ========== Flushing ==========

#[test]
fn test_flush_threshold() {
    let mut p = Protocol::deploy_with(18, units(1000));
    let manager = p.manager_address();
    let vault = p.manager_vault_address();

    p.as_user(p.alice);
    p.manager.deposit(units(999));
    assert_eq!(p.collateral_of(manager), units(999));
    assert_eq!(p.collateral_of(vault), U256::zero());

    p.manager.deposit(units(1000));
    assert_eq!(p.collateral_of(manager), U256::zero());
    assert_eq!(p.collateral_of(vault), units(1999));
    assert_eq!(p.manager.vault(0).total_deposited, units(1999));
}

#[test]
fn test_large_mint_flushes() {
    let mut p = Protocol::deploy_with(18, units(1000));
    let vault = p.manager_vault_address();

    p.as_user(p.alice);
    for _ in 0..3 {
        p.manager.deposit(units(900));
    }
    p.manager.mint(units(999));
    assert_eq!(p.collateral_of(vault), U256::zero());

    p.manager.deposit(units(900));
    p.manager.deposit(units(900));
    assert_eq!(p.collateral_of(vault), U256::zero());

    p.manager.mint(units(1000));
    assert_eq!(p.collateral_of(vault), units(4500));
    assert_eq!(p.collateral_of(p.manager_address()), U256::zero());
}

#[test]
fn test_withdraw_recalls_shortfall_from_active_vault() {
    let mut p = Protocol::deploy_with(18, units(1000));
    let vault = p.manager_vault_address();

    p.as_user(p.alice);
    p.manager.deposit(units(1000));
    p.manager.withdraw(units(600));

    assert_eq!(p.collateral_of(vault), units(400));
    assert_eq!(p.manager.vault(0).total_deposited, units(400));
    assert_eq!(
        p.collateral_of(p.alice),
        units(STARTING_COLLATERAL) - units(400)
    );
}

#[test]
fn test_manual_flush_moves_local_balance() {
    let mut p = Protocol::deploy();
    let manager = p.manager_address();

    p.as_user(p.bob);
    p.manager.flush();
    assert_eq!(p.manager.vault(0).total_deposited, U256::zero());

    p.manager.deposit(units(700));
    p.as_user(p.carol);
    p.manager.flush();
    assert_eq!(p.collateral_of(manager), U256::zero());
    assert_eq!(p.manager.vault(0).total_deposited, units(700));
}

// ========== Harvest ==========

#[test]
fn test_harvest_without_yield_changes_nothing() {
    let mut p = Protocol::deploy_with(18, units(100));
    let vault = p.manager_vault_address();
    let buffer = p.buffer_address();

    p.as_user(p.alice);
    p.manager.deposit(units(5000));
    p.manager.harvest(0);

    assert_eq!(p.collateral_of(vault), units(5000));
    assert_eq!(p.manager.vault(0).total_deposited, units(5000));
    assert_eq!(p.collateral_of(p.rewards), U256::zero());
    assert_eq!(p.collateral_of(buffer), U256::zero());
    assert_eq!(p.buffer.buffer_info().buffer, U256::zero());
}

#[test]
fn test_harvest_splits_fee_and_distributes_rest() {
    let mut p = Protocol::deploy_with(18, units(100));
    let vault = p.manager_vault_address();
    let buffer_vault = p.buffer_vault_address();

    p.as_user(p.governance);
    p.manager.set_harvest_fee(1000);

    p.as_user(p.alice);
    p.manager.deposit(units(10_000));
    p.accrue_yield(vault, units(1000));

    p.as_user(p.carol);
    p.manager.harvest(0);

    assert_eq!(p.collateral_of(p.rewards), units(100));
    assert_eq!(p.buffer.buffer_info().buffer, units(900));
    assert_eq!(p.collateral_of(buffer_vault), units(900));
    assert_eq!(p.collateral_of(vault), units(10_000));
    assert_eq!(p.manager.vault(0).total_deposited, units(10_000));
}

// ========== Repay ==========

#[test]
fn test_repay_with_debt_asset_burns() {
    let mut p = Protocol::deploy();
    let manager = p.manager_address();

    p.as_user(p.alice);
    p.manager.deposit(units(5000));
    p.manager.mint(units(1000));
    let supply = p.debt.total_supply();

    p.manager.repay(units(400), U256::zero());

    assert_eq!(p.manager.get_account(p.alice).debt, units(600));
    assert_eq!(p.debt.total_supply(), supply - units(400));
    assert_eq!(p.debt.has_minted(manager), units(600));
    assert_eq!(p.manager.total_debt(), units(600));
}

#[test]
fn test_repay_with_collateral_feeds_buffer() {
    let mut p = Protocol::deploy();

    p.as_user(p.alice);
    p.manager.deposit(units(5000));
    p.manager.mint(units(1000));
    p.manager.repay(U256::zero(), units(300));

    assert_eq!(p.manager.get_account(p.alice).debt, units(700));
    assert_eq!(p.manager.get_account(p.alice).deposited_collateral, units(5000));
    assert_eq!(p.buffer.buffer_info().buffer, units(300));
}

#[test]
fn test_collateral_path_applies_before_debt_path() {
    let mut p = Protocol::deploy();

    p.as_user(p.alice);
    p.manager.deposit(units(5000));
    p.manager.mint(units(1000));

    assert_eq!(
        p.manager.try_repay(units(100), units(1001)),
        Err(CdpError::ArithmeticUnderflow.into())
    );
    assert_eq!(
        p.manager.try_repay(units(1001), U256::zero()),
        Err(CdpError::ArithmeticUnderflow.into())
    );
    assert_eq!(p.manager.get_account(p.alice).debt, units(1000));

    p.manager.repay(units(600), units(400));
    assert_eq!(p.manager.get_account(p.alice).debt, U256::zero());
}

#[test]
fn test_collateral_repay_scales_decimals() {
    let unit = U256::from(1_000_000u64);
    let debt_unit = U256::from(1_000_000_000_000_000_000u64);
    let mut p = Protocol::deploy_with(6, U256::MAX);

    p.as_user(p.governance);
    p.collateral.mint(p.alice, unit * units(5100));

    p.as_user(p.alice);
    p.manager.deposit(unit * units(5000));
    p.manager.mint(debt_unit * units(2500));
    assert_eq!(
        p.manager.try_mint(U256::one()),
        Err(CdpError::CollateralizationBreached.into())
    );

    let before = p.collateral_of(p.alice);
    p.manager.repay(U256::zero(), unit * units(100));
    assert_eq!(p.manager.get_account(p.alice).debt, debt_unit * units(2400));
    assert_eq!(p.collateral_of(p.alice), before - unit * units(100));
    assert_eq!(p.buffer.buffer_info().buffer, unit * units(100));
}

#[test]
fn test_oversized_collateral_repay_reverts() {
    let mut p = Protocol::deploy_with(6, U256::MAX);

    p.as_user(p.alice);
    p.manager.deposit(units(500_000));
    p.manager.mint(units(1000));
    assert_eq!(
        p.manager.try_repay(U256::zero(), U256::MAX),
        Err(CdpError::ArithmeticUnderflow.into())
    );
    assert_eq!(
        p.manager.try_repay(U256::zero(), U256::MAX / U256::from(1_000_000u64)),
        Err(CdpError::ArithmeticUnderflow.into())
    );
    assert_eq!(p.manager.get_account(p.alice).debt, units(1000));
}

// ========== Liquidation ==========

#[test]
fn test_liquidate_repays_from_own_collateral() {
    let mut p = Protocol::deploy_with(18, units(1000));

    p.as_user(p.alice);
    p.manager.deposit(units(5000));
    p.manager.mint(units(1000));
    p.manager.liquidate(units(400));

    let account = p.manager.get_account(p.alice);
    assert_eq!(account.deposited_collateral, units(4600));
    assert_eq!(account.debt, units(600));
    assert_eq!(p.manager.vault(0).total_deposited, units(4600));
    assert_eq!(p.buffer.buffer_info().buffer, units(400));
    assert_eq!(p.manager.total_deposited(), p.manager_holdings());
}

#[test]
fn test_liquidate_more_than_debt_underflows() {
    let mut p = Protocol::deploy();

    p.as_user(p.alice);
    p.manager.deposit(units(5000));
    p.manager.mint(units(1000));
    assert_eq!(
        p.manager.try_liquidate(units(6000)),
        Err(CdpError::ArithmeticUnderflow.into())
    );
    assert_eq!(p.manager.get_account(p.alice).deposited_collateral, units(5000));
}

// ========== Vault List ==========

#[test]
fn test_migrate_keeps_old_vault_recallable() {
    let mut p = Protocol::deploy_with(18, units(100));
    let manager = p.manager_address();
    let old_vault = p.manager_vault_address();

    p.as_user(p.alice);
    p.manager.deposit(units(3000));
    assert_eq!(p.collateral_of(old_vault), units(3000));

    let new_vault = HoldingVaultAdapter::deploy(
        &p.env,
        HoldingVaultAdapterInitArgs {
            token: p.collateral.address().clone(),
            admin: manager,
        },
    );
    p.as_user(p.governance);
    p.manager.migrate(new_vault.address().clone());
    assert_eq!(p.manager.vault_count(), 2);
    assert_eq!(p.manager.active_vault_index(), 1);

    p.as_user(p.bob);
    p.manager.recall(0, units(1000));
    assert_eq!(p.manager.vault(0).total_deposited, units(2000));
    assert_eq!(p.collateral_of(manager), units(1000));

    p.manager.recall_all(0);
    assert_eq!(p.collateral_of(old_vault), U256::zero());

    p.manager.flush();
    assert_eq!(p.manager.vault(1).total_deposited, units(3000));
    assert_eq!(
        p.manager.try_recall(1, units(1)),
        Err(CdpError::RecallNotPermitted.into())
    );
    p.as_user(p.governance);
    p.manager.recall(1, units(1));
}

#[test]
fn test_migrate_rejects_bad_adapters() {
    let mut p = Protocol::deploy();
    let manager = p.manager_address();
    let current = p.manager_vault_address();

    p.as_user(p.governance);
    assert_eq!(
        p.manager.try_migrate(current),
        Err(CdpError::AdapterAlreadyRegistered.into())
    );

    let wrong_token = HoldingVaultAdapter::deploy(
        &p.env,
        HoldingVaultAdapterInitArgs {
            token: p.debt.address().clone(),
            admin: manager,
        },
    );
    assert_eq!(
        p.manager.try_migrate(wrong_token.address().clone()),
        Err(CdpError::AdapterTokenMismatch.into())
    );

    p.as_user(p.alice);
    assert_eq!(
        p.manager.try_migrate(current),
        Err(CdpError::Unauthorized.into())
    );
    assert_eq!(p.manager.vault_count(), 1);
}

#[test]
fn test_initialize_only_once() {
    let mut p = Protocol::deploy();
    let current = p.manager_vault_address();
    p.as_user(p.governance);
    assert_eq!(
        p.manager.try_initialize(current),
        Err(CdpError::AlreadyInitialized.into())
    );
}

// ========== Emergency Exit ==========

#[test]
fn test_emergency_exit_is_one_way() {
    let mut p = Protocol::deploy_with(18, units(100));

    p.as_user(p.alice);
    p.manager.deposit(units(1000));

    p.as_user(p.governance);
    p.manager.set_emergency_exit(true);
    assert_eq!(
        p.manager.try_set_emergency_exit(false),
        Err(CdpError::EmergencyExitIrreversible.into())
    );

    p.as_user(p.bob);
    assert_eq!(
        p.manager.try_deposit(units(10)),
        Err(CdpError::EmergencyExitActive.into())
    );
    assert_eq!(p.manager.try_flush(), Err(CdpError::EmergencyExitActive.into()));
    p.manager.recall_all(0);
    assert_eq!(p.collateral_of(p.manager_address()), units(1000));

    p.as_user(p.alice);
    p.manager.withdraw(units(1000));
    assert_eq!(p.collateral_of(p.alice), units(STARTING_COLLATERAL));
}

// ========== Governance ==========

#[test]
fn test_parameter_bounds() {
    let mut p = Protocol::deploy();
    p.as_user(p.governance);

    assert_eq!(
        p.manager.try_set_harvest_fee(10_001),
        Err(CdpError::HarvestFeeAboveMaximum.into())
    );
    p.manager.set_harvest_fee(10_000);

    assert_eq!(
        p.manager.try_set_collateralization_limit(limit(1) - U256::one()),
        Err(CdpError::CollateralizationLimitBelowMinimum.into())
    );
    assert_eq!(
        p.manager.try_set_collateralization_limit(limit(4) + U256::one()),
        Err(CdpError::CollateralizationLimitAboveMaximum.into())
    );
    p.manager.set_collateralization_limit(limit(3));
    assert_eq!(p.manager.get_collateralization_limit(), limit(3));

    assert_eq!(
        p.manager.try_set_flush_activator(U256::zero()),
        Err(CdpError::InvalidFlushActivator.into())
    );
}

#[test]
fn test_setters_require_governance() {
    let mut p = Protocol::deploy();
    p.as_user(p.sentinel);

    assert_eq!(
        p.manager.try_set_harvest_fee(1),
        Err(CdpError::Unauthorized.into())
    );
    assert_eq!(
        p.manager.try_set_rewards(p.bob),
        Err(CdpError::Unauthorized.into())
    );
    assert_eq!(
        p.manager.try_set_emergency_exit(true),
        Err(CdpError::Unauthorized.into())
    );
    assert_eq!(
        p.manager.try_set_pending_governance(p.bob),
        Err(CdpError::Unauthorized.into())
    );
}

#[test]
fn test_governance_handover() {
    let mut p = Protocol::deploy();
    p.as_user(p.governance);
    p.manager.set_pending_governance(p.alice);

    p.as_user(p.bob);
    assert_eq!(
        p.manager.try_accept_governance(),
        Err(CdpError::NotPendingGovernance.into())
    );

    p.as_user(p.alice);
    p.manager.accept_governance();
    assert_eq!(p.manager.governance(), Some(p.alice));
    p.manager.set_harvest_fee(50);

    p.as_user(p.governance);
    assert_eq!(
        p.manager.try_set_harvest_fee(60),
        Err(CdpError::Unauthorized.into())
    );
    assert_eq!(p.manager.get_harvest_fee(), 50);
}
