//! Role store
//!
//! Composed into the vault manager and the redemption buffer as a
//! `SubModule`. Holds governance (with two-step handover), the sentinel and
//! flag roles (keepers, whitelisted distributors), and evaluates a
//! [`Policy`] against the current caller.
//!
//! Role hierarchy:
//! - GOVERNANCE grants and revokes every other role
//! - SENTINEL may pause and recall in emergencies
//! - KEEPER may harvest the buffer's vaults
//! - WHITELISTED may push collateral into the buffer

use odra::prelude::*;
use crate::errors::CdpError;
use crate::events::{GovernanceUpdated, PendingGovernanceUpdated, RoleUpdated, SentinelUpdated};
use crate::types::{
    is_zero_address, Policy, ROLE_GOVERNANCE, ROLE_KEEPER, ROLE_SENTINEL, ROLE_WHITELISTED,
};

/// Access Control Module
#[odra::module]
pub struct AccessControl {
    /// Role assignments: (role, account) -> bool
    roles: Mapping<(u8, Address), bool>,
    /// Current governance
    governance: Var<Address>,
    /// Governance nominee awaiting acceptance
    pending_governance: Var<Address>,
    /// Current sentinel
    sentinel: Var<Address>,
}

#[odra::module]
impl AccessControl {
    /// Install the initial governance and, optionally, a sentinel.
    pub fn bootstrap(&mut self, governance: Address, sentinel: Option<Address>) {
        if self.governance.get().is_some() {
            self.env().revert(CdpError::AlreadyInitialized);
        }
        if is_zero_address(&governance) {
            self.env().revert(CdpError::ZeroAddress);
        }

        self.governance.set(governance);
        self.roles.set(&(ROLE_GOVERNANCE, governance), true);

        if let Some(sentinel) = sentinel {
            if is_zero_address(&sentinel) {
                self.env().revert(CdpError::ZeroAddress);
            }
            self.sentinel.set(sentinel);
            self.roles.set(&(ROLE_SENTINEL, sentinel), true);
        }
    }

    // ========== Role Query Functions ==========

    /// Check if account has a specific role
    pub fn has_role(&self, role_id: u8, account: Address) -> bool {
        self.roles.get(&(role_id, account)).unwrap_or(false)
    }

    /// Current governance
    pub fn governance(&self) -> Option<Address> {
        self.governance.get()
    }

    /// Governance nominee, if any
    pub fn pending_governance(&self) -> Option<Address> {
        self.pending_governance.get()
    }

    /// Current sentinel, if any
    pub fn sentinel(&self) -> Option<Address> {
        self.sentinel.get()
    }

    /// Whether the caller satisfies `policy`
    pub fn allows(&self, policy: Policy) -> bool {
        let caller = self.env().caller();
        match policy {
            Policy::Governance => self.has_role(ROLE_GOVERNANCE, caller),
            Policy::GovernanceOrSentinel => {
                self.has_role(ROLE_GOVERNANCE, caller) || self.has_role(ROLE_SENTINEL, caller)
            }
            Policy::Keeper => self.has_role(ROLE_KEEPER, caller),
            Policy::Whitelisted => self.has_role(ROLE_WHITELISTED, caller),
        }
    }

    /// Revert unless the caller satisfies `policy`
    pub fn require(&self, policy: Policy) {
        if self.allows(policy) {
            return;
        }
        match policy {
            Policy::Whitelisted => self.env().revert(CdpError::NotWhitelisted),
            _ => self.env().revert(CdpError::Unauthorized),
        }
    }

    // ========== Governance Handover ==========

    /// Nominate a new governance (governance only)
    pub fn set_pending_governance(&mut self, pending_governance: Address) {
        self.require(Policy::Governance);
        if is_zero_address(&pending_governance) {
            self.env().revert(CdpError::ZeroAddress);
        }
        self.pending_governance.set(pending_governance);
        self.env().emit_event(PendingGovernanceUpdated { pending_governance });
    }

    /// Accept the nomination (pending governance only)
    pub fn accept_governance(&mut self) {
        let caller = self.env().caller();
        if self.pending_governance.get() != Some(caller) {
            self.env().revert(CdpError::NotPendingGovernance);
        }

        if let Some(previous) = self.governance.get() {
            self.roles.set(&(ROLE_GOVERNANCE, previous), false);
        }
        self.roles.set(&(ROLE_GOVERNANCE, caller), true);
        self.governance.set(caller);
        self.env().emit_event(GovernanceUpdated { governance: caller });
    }

    // ========== Role Management Functions ==========

    /// Replace the sentinel (governance only)
    pub fn set_sentinel(&mut self, sentinel: Address) {
        self.require(Policy::Governance);
        if is_zero_address(&sentinel) {
            self.env().revert(CdpError::ZeroAddress);
        }
        if let Some(previous) = self.sentinel.get() {
            self.roles.set(&(ROLE_SENTINEL, previous), false);
        }
        self.roles.set(&(ROLE_SENTINEL, sentinel), true);
        self.sentinel.set(sentinel);
        self.env().emit_event(SentinelUpdated { sentinel });
    }

    /// Flag or unflag a keeper (governance only)
    pub fn set_keeper(&mut self, account: Address, enabled: bool) {
        self.set_flag_role(ROLE_KEEPER, account, enabled);
    }

    /// Flag or unflag a whitelisted distributor (governance only)
    pub fn set_whitelisted(&mut self, account: Address, enabled: bool) {
        self.set_flag_role(ROLE_WHITELISTED, account, enabled);
    }

    // ========== Internal Functions ==========

    fn set_flag_role(&mut self, role: u8, account: Address, enabled: bool) {
        self.require(Policy::Governance);
        if is_zero_address(&account) {
            self.env().revert(CdpError::ZeroAddress);
        }
        self.roles.set(&(role, account), enabled);
        self.env().emit_event(RoleUpdated { role, account, enabled });
    }
}
