//! Shared deployment for scenario tests.
//!
//! Deploys the collateral token, the debt asset, the manager, the buffer
//! and one holding vault for each of them, wired together the way a live
//! deployment is. Account 0 is governance and token admin.

use formation_cdp_contracts::collateral_vault_manager::{
    CollateralVaultManager, CollateralVaultManagerHostRef, CollateralVaultManagerInitArgs,
};
use formation_cdp_contracts::debt_asset::{DebtAsset, DebtAssetHostRef, DebtAssetInitArgs};
use formation_cdp_contracts::fixed_point::PRECISION;
use formation_cdp_contracts::redemption_buffer::{
    RedemptionBuffer, RedemptionBufferHostRef, RedemptionBufferInitArgs,
};
use formation_cdp_contracts::vault_adapter::{
    HoldingVaultAdapter, HoldingVaultAdapterHostRef, HoldingVaultAdapterInitArgs,
};
use odra::casper_types::U256;
use odra::host::{Deployer, HostEnv, HostRef};
use odra::prelude::*;

/// Collateral every user starts with
pub const STARTING_COLLATERAL: u64 = 1_000_000;

/// Flush activator high enough that ordinary test deposits stay local
pub const LAZY_FLUSH_ACTIVATOR: u64 = 1_000_000_000;

pub fn units(amount: u64) -> U256 {
    U256::from(amount)
}

/// Collateralization limit of `multiple`x, 1e18-scaled
pub fn limit(multiple: u64) -> U256 {
    U256::from(multiple) * U256::from(PRECISION)
}

fn unlimited() -> U256 {
    U256::MAX / U256::from(2u64)
}

pub struct Protocol {
    pub env: HostEnv,
    pub governance: Address,
    pub sentinel: Address,
    pub rewards: Address,
    pub alice: Address,
    pub bob: Address,
    pub carol: Address,
    pub collateral: DebtAssetHostRef,
    pub debt: DebtAssetHostRef,
    pub manager: CollateralVaultManagerHostRef,
    pub buffer: RedemptionBufferHostRef,
    pub manager_vault: HoldingVaultAdapterHostRef,
    pub buffer_vault: HoldingVaultAdapterHostRef,
}

impl Protocol {
    /// 18-decimal collateral, lazy flushing, 2x limit
    pub fn deploy() -> Self {
        Self::deploy_with(18, units(LAZY_FLUSH_ACTIVATOR))
    }

    pub fn deploy_with(collateral_decimals: u8, flush_activator: U256) -> Self {
        let env = odra_test::env();
        let governance = env.get_account(0);
        let sentinel = env.get_account(1);
        let rewards = env.get_account(2);
        let alice = env.get_account(3);
        let bob = env.get_account(4);
        let carol = env.get_account(5);
        env.set_caller(governance);

        let mut collateral = DebtAsset::deploy(
            &env,
            DebtAssetInitArgs {
                name: "Wrapped Collateral".to_string(),
                symbol: "WCOL".to_string(),
                decimals: collateral_decimals,
            },
        );
        let mut debt = DebtAsset::deploy(
            &env,
            DebtAssetInitArgs {
                name: "Formation USD".to_string(),
                symbol: "fUSD".to_string(),
                decimals: 18,
            },
        );
        let collateral_address = collateral.address().clone();
        let debt_address = debt.address().clone();

        let mut manager = CollateralVaultManager::deploy(
            &env,
            CollateralVaultManagerInitArgs {
                collateral_token: collateral_address,
                debt_asset: debt_address,
                governance,
                sentinel,
                flush_activator,
            },
        );
        let mut buffer = RedemptionBuffer::deploy(
            &env,
            RedemptionBufferInitArgs {
                debt_asset: debt_address,
                collateral_token: collateral_address,
                governance,
            },
        );
        let manager_address = manager.address().clone();
        let buffer_address = buffer.address().clone();

        // Token permissions
        collateral.set_whitelist(governance, true);
        collateral.set_ceiling(governance, unlimited());
        debt.set_whitelist(governance, true);
        debt.set_ceiling(governance, unlimited());
        debt.set_whitelist(manager_address, true);
        debt.set_ceiling(manager_address, unlimited());

        // Manager wiring
        buffer.set_whitelist(manager_address, true);
        buffer.set_whitelist(governance, true);
        manager.set_redemption_buffer(buffer_address);
        manager.set_rewards(rewards);
        manager.set_collateralization_limit(limit(2));

        let manager_vault = HoldingVaultAdapter::deploy(
            &env,
            HoldingVaultAdapterInitArgs {
                token: collateral_address,
                admin: manager_address,
            },
        );
        manager.initialize(manager_vault.address().clone());

        // Buffer wiring
        buffer.set_rewards(rewards);
        buffer.set_sentinel(sentinel);
        let buffer_vault = HoldingVaultAdapter::deploy(
            &env,
            HoldingVaultAdapterInitArgs {
                token: collateral_address,
                admin: buffer_address,
            },
        );
        buffer.initialize(buffer_vault.address().clone());

        let mut protocol = Self {
            env,
            governance,
            sentinel,
            rewards,
            alice,
            bob,
            carol,
            collateral,
            debt,
            manager,
            buffer,
            manager_vault,
            buffer_vault,
        };

        for user in [alice, bob, carol] {
            protocol.onboard(user);
        }
        protocol.env.set_caller(governance);
        protocol
    }

    fn onboard(&mut self, user: Address) {
        self.env.set_caller(self.governance);
        self.collateral.mint(user, units(STARTING_COLLATERAL));

        let manager = self.manager_address();
        let buffer = self.buffer_address();
        self.env.set_caller(user);
        self.collateral.approve(manager, unlimited());
        self.debt.approve(manager, unlimited());
        self.debt.approve(buffer, unlimited());
    }

    pub fn manager_address(&self) -> Address {
        self.manager.address().clone()
    }

    pub fn buffer_address(&self) -> Address {
        self.buffer.address().clone()
    }

    pub fn manager_vault_address(&self) -> Address {
        self.manager_vault.address().clone()
    }

    pub fn buffer_vault_address(&self) -> Address {
        self.buffer_vault.address().clone()
    }

    pub fn as_user(&self, user: Address) {
        self.env.set_caller(user);
    }

    /// Mint debt asset straight to `user` (governance is a whitelisted minter)
    pub fn give_debt(&mut self, user: Address, amount: U256) {
        self.env.set_caller(self.governance);
        self.debt.mint(user, amount);
    }

    /// Distribute `amount` of fresh collateral into the buffer as governance
    pub fn distribute(&mut self, amount: U256) {
        self.env.set_caller(self.governance);
        self.collateral.mint(self.governance, amount);
        let buffer = self.buffer_address();
        self.collateral.approve(buffer, amount);
        self.buffer.distribute(amount);
    }

    /// Simulate vault yield by minting collateral straight into `vault`
    pub fn accrue_yield(&mut self, vault: Address, amount: U256) {
        self.env.set_caller(self.governance);
        self.collateral.mint(vault, amount);
    }

    /// Stake `amount` of freshly minted debt asset for `user`
    pub fn stake_for(&mut self, user: Address, amount: U256) {
        self.give_debt(user, amount);
        self.as_user(user);
        self.buffer.stake(amount);
    }

    pub fn collateral_of(&self, account: Address) -> U256 {
        self.collateral.balance_of(account)
    }

    /// Collateral held locally by the manager plus everything its vaults
    /// report
    pub fn manager_holdings(&self) -> U256 {
        let mut holdings = self.collateral_of(self.manager_address());
        for vault_id in 0..self.manager.vault_count() {
            holdings = holdings + self.manager.vault_info(vault_id).total_value;
        }
        holdings
    }
}
