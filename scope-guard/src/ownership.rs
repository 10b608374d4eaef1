//! One-time initialization and single-owner access control
//!
//! The owner only exists once the guard is initialized, so the state
//! machine carries it in the `Initialized` variant.

use scope_guard_api::Address;

use crate::error::{AdminError, GuardError, InitError, TransferError};

/// Initialization state of a guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Constructed but not yet set up; nobody may administer it
    #[default]
    Uninitialized,
    /// Set up with a non-zero owner
    Initialized { owner: Address },
}

impl Lifecycle {
    /// Current owner, if initialized
    pub fn owner(&self) -> Option<Address> {
        match self {
            Lifecycle::Uninitialized => None,
            Lifecycle::Initialized { owner } => Some(*owner),
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self, Lifecycle::Initialized { .. })
    }

    /// Transition Uninitialized -> Initialized
    pub fn initialize(&mut self, owner: Address) -> Result<(), InitError> {
        if self.is_initialized() {
            return Err(InitError::AlreadyInitialized);
        }
        if owner.is_zero() {
            return Err(InitError::InvalidOwner);
        }
        *self = Lifecycle::Initialized { owner };
        Ok(())
    }

    /// Fail with `NotOwner` unless `caller` is the current owner
    pub fn require_owner(&self, caller: Address) -> Result<(), AdminError> {
        match self.owner() {
            Some(owner) if owner == caller => Ok(()),
            _ => Err(AdminError::NotOwner),
        }
    }

    /// Replace the owner, returning the previous one
    ///
    /// Caller is checked before the new owner.
    pub fn transfer(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<Address, TransferError> {
        self.require_owner(caller)?;
        if new_owner.is_zero() {
            return Err(InitError::InvalidOwner.into());
        }
        *self = Lifecycle::Initialized { owner: new_owner };
        Ok(caller)
    }
}

/// Capability: one-time setup decoupled from construction
pub trait Initializable {
    /// Initialize with `owner`, recording `initiator` as the caller of setup
    fn initialize(&self, initiator: Address, owner: Address) -> Result<(), GuardError>;

    fn is_initialized(&self) -> bool;
}

/// Capability: single-owner access control
pub trait OwnershipControlled {
    /// Current owner, `None` before initialization
    fn owner(&self) -> Option<Address>;

    /// Hand ownership to `new_owner`; only the current owner may call this
    fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<(), GuardError>;
}
