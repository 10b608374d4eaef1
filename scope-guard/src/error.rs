//! Guard error types
//!
//! Every rejection carries one of the enumerated reasons so callers can
//! branch on it. No error is retried inside the guard.

use thiserror::Error;

use crate::permission::StoreError;
use crate::snapshot::SnapshotError;

/// Reason a proposed transaction was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum AuthorizationError {
    /// Call-data is non-empty but too short to hold a selector
    #[error("Function signature too short")]
    FunctionSignatureTooShort,

    /// Target has no clearance
    #[error("Target address is not allowed")]
    TargetAddressNotAllowed,

    /// Value transfer is not permitted to the target
    #[error("Cannot send value to this target")]
    SendNotAllowed,

    /// Delegate-call is not permitted to the target
    #[error("Delegate call not allowed to this address")]
    DelegateCallNotAllowed,

    /// Target is scoped and the selector is not allowed
    #[error("Target function is not allowed")]
    FunctionNotAllowed,
}

impl AuthorizationError {
    /// Stable machine-readable name of the reason
    pub fn name(&self) -> &'static str {
        match self {
            Self::FunctionSignatureTooShort => "FunctionSignatureTooShort",
            Self::TargetAddressNotAllowed => "TargetAddressNotAllowed",
            Self::SendNotAllowed => "SendNotAllowed",
            Self::DelegateCallNotAllowed => "DelegateCallNotAllowed",
            Self::FunctionNotAllowed => "FunctionNotAllowed",
        }
    }
}

/// Errors from owner-gated operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error("Caller is not the owner")]
    NotOwner,
}

/// Errors from one-time initialization and owner assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("Guard is already initialized")]
    AlreadyInitialized,

    #[error("Owner cannot be the zero address")]
    InvalidOwner,
}

/// Errors from handing ownership to a new address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Init(#[from] InitError),
}

/// Top-level error type for guard operations
#[derive(Debug, Error)]
pub enum GuardError {
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl From<TransferError> for GuardError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Admin(e) => Self::Admin(e),
            TransferError::Init(e) => Self::Init(e),
        }
    }
}

impl GuardError {
    /// The rejection reason, if this error is a transaction rejection
    pub fn reason(&self) -> Option<AuthorizationError> {
        match self {
            Self::Authorization(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Check if this error rejected a proposed transaction
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Authorization(_))
    }

    /// Check if this error denied an administrative action
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::Admin(AdminError::NotOwner))
    }
}
