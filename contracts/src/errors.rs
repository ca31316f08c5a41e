//! Protocol error definitions.
//!
//! Codes are grouped by category: the hundreds digit selects the
//! [`ErrorKind`], the remainder identifies the failing precondition.

use odra::prelude::*;

/// Error categories shared by every contract in the protocol.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// Caller lacks the role the operation requires.
    Authorization,
    /// Zero address, duplicate or mismatched adapter, out-of-range parameter.
    Configuration,
    /// Initialization or pause state does not allow the operation.
    State,
    /// Collateralization, ceiling or balance constraints would be broken.
    Solvency,
    /// Forced transmutation of an account that is not overfilled.
    OverflowPrecondition,
    /// Buffer migration would leave stakes unbacked.
    MigrationSafety,
}

/// CDP protocol errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CdpError {
    // Authorization errors (1xx)
    Unauthorized = 100,
    NotPendingGovernance = 101,
    NotWhitelisted = 102,
    Blacklisted = 103,
    RecallNotPermitted = 104,

    // Configuration errors (2xx)
    ZeroAddress = 200,
    InvalidFlushActivator = 201,
    AdapterAlreadyRegistered = 202,
    AdapterTokenMismatch = 203,
    HarvestFeeAboveMaximum = 204,
    CollateralizationLimitBelowMinimum = 205,
    CollateralizationLimitAboveMaximum = 206,
    DecimalsMismatch = 207,
    InvalidTransmutationPeriod = 208,
    PlantableMarginAboveMaximum = 209,
    RedemptionBufferNotSet = 210,
    RewardsNotSet = 211,

    // State errors (3xx)
    NotInitialized = 300,
    AlreadyInitialized = 301,
    EmergencyExitActive = 302,
    EmergencyExitIrreversible = 303,
    Paused = 304,
    NotPaused = 305,
    InvalidVaultId = 306,
    ZeroAmount = 307,
    NothingToTransmute = 308,
    NothingToClaim = 309,

    // Solvency errors (4xx)
    CollateralizationBreached = 400,
    CeilingBreached = 401,
    ExceedsWithdrawable = 402,
    ArithmeticUnderflow = 403,
    InsufficientTokenBalance = 404,
    InsufficientAllowance = 405,
    UnstakeExceedsDeposit = 406,
    TokenTransferFailed = 407,

    // Overflow precondition errors (5xx)
    TargetNotOverfilled = 500,

    // Migration safety errors (6xx)
    InsufficientFundsForStakes = 600,
}

impl CdpError {
    pub const fn message(&self) -> &'static str {
        match self {
            // Authorization
            CdpError::Unauthorized => "Unauthorized: caller lacks required role",
            CdpError::NotPendingGovernance => "Unauthorized: caller is not pending governance",
            CdpError::NotWhitelisted => "Unauthorized: caller is not whitelisted",
            CdpError::Blacklisted => "Unauthorized: caller is blacklisted",
            CdpError::RecallNotPermitted => {
                "Unauthorized: recall from active vault requires governance or emergency exit"
            }

            // Configuration
            CdpError::ZeroAddress => "Address cannot be zero",
            CdpError::InvalidFlushActivator => "Flush activator must be greater than zero",
            CdpError::AdapterAlreadyRegistered => "Adapter already registered",
            CdpError::AdapterTokenMismatch => "Adapter token does not match collateral",
            CdpError::HarvestFeeAboveMaximum => "Harvest fee above maximum",
            CdpError::CollateralizationLimitBelowMinimum => "Collateralization limit below minimum",
            CdpError::CollateralizationLimitAboveMaximum => "Collateralization limit above maximum",
            CdpError::DecimalsMismatch => "Collateral has more decimals than debt asset",
            CdpError::InvalidTransmutationPeriod => "Transmutation period must be greater than zero",
            CdpError::PlantableMarginAboveMaximum => "Plantable margin above maximum",
            CdpError::RedemptionBufferNotSet => "Redemption buffer not set",
            CdpError::RewardsNotSet => "Rewards address not set",

            // State
            CdpError::NotInitialized => "Not initialized",
            CdpError::AlreadyInitialized => "Already initialized",
            CdpError::EmergencyExitActive => "Operation blocked: emergency exit active",
            CdpError::EmergencyExitIrreversible => "Emergency exit cannot be cleared",
            CdpError::Paused => "Operation blocked: paused",
            CdpError::NotPaused => "Operation requires pause",
            CdpError::InvalidVaultId => "Vault id out of range",
            CdpError::ZeroAmount => "Amount must be greater than zero",
            CdpError::NothingToTransmute => "No pending amount in bucket",
            CdpError::NothingToClaim => "No realised amount to claim",

            // Solvency
            CdpError::CollateralizationBreached => "Unhealthy collateralization ratio",
            CdpError::CeilingBreached => "Minter ceiling breached",
            CdpError::ExceedsWithdrawable => "Exceeds withdrawable amount",
            CdpError::ArithmeticUnderflow => "Arithmetic underflow",
            CdpError::InsufficientTokenBalance => "Insufficient token balance",
            CdpError::InsufficientAllowance => "Insufficient allowance",
            CdpError::UnstakeExceedsDeposit => "Unstake amount exceeds deposit",
            CdpError::TokenTransferFailed => "Token transfer failed",

            // Overflow precondition
            CdpError::TargetNotOverfilled => "Target account is not overfilled",

            // Migration safety
            CdpError::InsufficientFundsForStakes => "Not enough funds to service stakes",
        }
    }

    /// Category of this error.
    pub const fn kind(&self) -> ErrorKind {
        match (*self as u16) / 100 {
            1 => ErrorKind::Authorization,
            2 => ErrorKind::Configuration,
            3 => ErrorKind::State,
            4 => ErrorKind::Solvency,
            5 => ErrorKind::OverflowPrecondition,
            _ => ErrorKind::MigrationSafety,
        }
    }
}

impl core::fmt::Display for CdpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<CdpError> for OdraError {
    fn from(error: CdpError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error as u16)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error as u16, error.message())
        }
    }
}
