//! The scope guard
//!
//! `ScopeGuard` composes the permission store, the ownership state machine
//! and the authorization engine behind the hook surface a wallet calls.
//!
//! Concurrency: transaction checks only take the store's read lock. Admin
//! mutations and ownership changes hold the lifecycle write lock for their
//! whole duration, so they are serialized with each other and their events
//! are emitted in commit order.

use scope_guard_api::{
    Address, Clearance, ExecutionOptions, Operation, Selector, TargetPermission, B256,
    FALLBACK_SELECTOR, U256,
};
use std::sync::{PoisonError, RwLock};

use crate::audit::{GuardEvent, GuardEventKind};
use crate::engine;
use crate::error::{GuardError, InitError};
use crate::hook::{GuardedTransaction, TransactionGuard};
use crate::ownership::{Initializable, Lifecycle, OwnershipControlled};
use crate::permission::{GuardConfig, PermissionStore, StoreError};
use crate::snapshot::{GuardSnapshot, TargetEntry};

/// Transaction guard scoping which targets, functions and call kinds a
/// wallet may use
pub struct ScopeGuard {
    lifecycle: RwLock<Lifecycle>,
    config: GuardConfig,
}

impl ScopeGuard {
    /// Create an uninitialized guard
    ///
    /// Nobody can administer it until [`Initializable::initialize`] runs.
    pub fn new(config: GuardConfig) -> Self {
        Self {
            lifecycle: RwLock::new(Lifecycle::Uninitialized),
            config,
        }
    }

    /// Create and initialize in one step
    ///
    /// Ends in the same state as `new` followed by `initialize`.
    pub fn with_owner(
        config: GuardConfig,
        initiator: Address,
        owner: Address,
    ) -> Result<Self, GuardError> {
        let guard = Self::new(config);
        guard.initialize(initiator, owner)?;
        Ok(guard)
    }

    /// Rebuild a guard from a snapshot
    ///
    /// Records are written straight into the configured store; no events
    /// are emitted because no policy changes.
    pub fn restore(config: GuardConfig, snapshot: &GuardSnapshot) -> Result<Self, GuardError> {
        snapshot.check_version()?;

        let lifecycle = match snapshot.owner {
            None => Lifecycle::Uninitialized,
            Some(owner) if owner.is_zero() => return Err(InitError::InvalidOwner.into()),
            Some(owner) => Lifecycle::Initialized { owner },
        };

        for entry in &snapshot.targets {
            config.store.put(entry.address, entry.permission.clone())?;
        }

        tracing::info!(
            owner = ?lifecycle.owner(),
            targets = snapshot.targets.len(),
            "Guard restored from snapshot"
        );

        Ok(Self {
            lifecycle: RwLock::new(lifecycle),
            config,
        })
    }

    /// Capture owner and every stored record
    pub fn snapshot(&self) -> Result<GuardSnapshot, GuardError> {
        let lifecycle = self.lifecycle.read().unwrap_or_else(PoisonError::into_inner);
        let targets = self
            .config
            .store
            .list()?
            .into_iter()
            .map(|(address, permission)| TargetEntry {
                address,
                permission,
            })
            .collect();

        Ok(GuardSnapshot {
            owner: lifecycle.owner(),
            targets,
            ..GuardSnapshot::new()
        })
    }

    /// Configuration this guard was built from
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    fn emit(&self, kind: GuardEventKind) {
        if let Err(e) = self.config.events.record(GuardEvent::new(kind)) {
            tracing::warn!(error = %e, "Failed to record guard event");
        }
    }

    /// Run an owner-only store mutation and emit its event
    fn administer(
        &self,
        caller: Address,
        mutate: impl FnOnce(&dyn PermissionStore) -> Result<GuardEventKind, StoreError>,
    ) -> Result<(), GuardError> {
        let lifecycle = self.lifecycle.write().unwrap_or_else(PoisonError::into_inner);
        lifecycle.require_owner(caller)?;

        let kind = mutate(self.config.store.as_ref())?;
        tracing::info!(caller = %caller, event = ?kind, "Guard policy updated");
        self.emit(kind);
        Ok(())
    }

    fn set_clearance(
        &self,
        caller: Address,
        target: Address,
        clearance: Clearance,
    ) -> Result<(), GuardError> {
        self.administer(caller, |store| {
            store.set_clearance(target, clearance)?;
            Ok(GuardEventKind::SetTargetClearance { target, clearance })
        })
    }

    fn set_function(
        &self,
        caller: Address,
        target: Address,
        selector: Selector,
        allowed: bool,
    ) -> Result<(), GuardError> {
        self.administer(caller, |store| {
            store.set_function_allowed(target, selector, allowed)?;
            Ok(GuardEventKind::SetFunctionAllowed {
                target,
                selector,
                allowed,
            })
        })
    }

    // ------------------------------------------------------------------
    // Admin API
    // ------------------------------------------------------------------

    /// Allow any function on `target`
    pub fn allow_target(&self, caller: Address, target: Address) -> Result<(), GuardError> {
        self.set_clearance(caller, target, Clearance::Target)
    }

    /// Reject every call to `target`
    pub fn revoke_target(&self, caller: Address, target: Address) -> Result<(), GuardError> {
        self.set_clearance(caller, target, Clearance::None)
    }

    /// Restrict `target` to explicitly allowed selectors
    pub fn scope_target(&self, caller: Address, target: Address) -> Result<(), GuardError> {
        self.set_clearance(caller, target, Clearance::Function)
    }

    pub fn set_execution_options(
        &self,
        caller: Address,
        target: Address,
        options: ExecutionOptions,
    ) -> Result<(), GuardError> {
        self.administer(caller, |store| {
            store.set_execution_options(target, options)?;
            Ok(GuardEventKind::SetExecutionOptions { target, options })
        })
    }

    pub fn scope_allow_function(
        &self,
        caller: Address,
        target: Address,
        selector: Selector,
    ) -> Result<(), GuardError> {
        self.set_function(caller, target, selector, true)
    }

    pub fn scope_revoke_function(
        &self,
        caller: Address,
        target: Address,
        selector: Selector,
    ) -> Result<(), GuardError> {
        self.set_function(caller, target, selector, false)
    }

    /// Allow empty call-data and the fallback function on a scoped target
    pub fn scope_allow_fallback(&self, caller: Address, target: Address) -> Result<(), GuardError> {
        self.set_function(caller, target, FALLBACK_SELECTOR, true)
    }

    pub fn scope_revoke_fallback(
        &self,
        caller: Address,
        target: Address,
    ) -> Result<(), GuardError> {
        self.set_function(caller, target, FALLBACK_SELECTOR, false)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Stored record for `target` (default record when never configured)
    pub fn target(&self, target: &Address) -> Result<TargetPermission, GuardError> {
        Ok(self.config.store.get(target)?)
    }

    /// Every record ever written, ordered by address
    pub fn targets(&self) -> Result<Vec<(Address, TargetPermission)>, GuardError> {
        Ok(self.config.store.list()?)
    }

    /// Whether `target` is allowed without function scoping
    pub fn is_allowed_target(&self, target: &Address) -> Result<bool, GuardError> {
        Ok(self.config.store.clearance(target)? == Clearance::Target)
    }

    /// Whether `target` is restricted to allowed selectors
    pub fn is_scoped(&self, target: &Address) -> Result<bool, GuardError> {
        Ok(self.config.store.clearance(target)? == Clearance::Function)
    }

    pub fn is_allowed_function(
        &self,
        target: &Address,
        selector: &Selector,
    ) -> Result<bool, GuardError> {
        Ok(self.config.store.is_function_allowed(target, selector)?)
    }

    pub fn is_allowed_to_delegate_call(&self, target: &Address) -> Result<bool, GuardError> {
        Ok(self
            .config
            .store
            .execution_options(target)?
            .allows_delegate_call())
    }

    pub fn is_fallback_allowed(&self, target: &Address) -> Result<bool, GuardError> {
        self.is_allowed_function(target, &FALLBACK_SELECTOR)
    }

    pub fn is_value_allowed(&self, target: &Address) -> Result<bool, GuardError> {
        Ok(self.config.store.execution_options(target)?.allows_send())
    }

    // ------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------

    /// Decide whether a call to `target` may proceed
    pub fn check(
        &self,
        target: Address,
        value: U256,
        data: &[u8],
        operation: Operation,
    ) -> Result<(), GuardError> {
        let record = self.config.store.get(&target)?;

        match engine::authorize(&record, value, data, operation) {
            Ok(()) => {
                tracing::debug!(to = %target, %value, %operation, "Transaction allowed");
                Ok(())
            }
            Err(reason) => {
                tracing::debug!(
                    to = %target,
                    %value,
                    %operation,
                    reason = reason.name(),
                    "Transaction rejected"
                );
                Err(reason.into())
            }
        }
    }
}

impl Initializable for ScopeGuard {
    fn initialize(&self, initiator: Address, owner: Address) -> Result<(), GuardError> {
        let mut lifecycle = self.lifecycle.write().unwrap_or_else(PoisonError::into_inner);
        lifecycle.initialize(owner)?;

        tracing::info!(initiator = %initiator, owner = %owner, "Guard initialized");
        self.emit(GuardEventKind::GuardSetup { initiator, owner });
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.lifecycle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_initialized()
    }
}

impl OwnershipControlled for ScopeGuard {
    fn owner(&self) -> Option<Address> {
        self.lifecycle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .owner()
    }

    fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<(), GuardError> {
        let mut lifecycle = self.lifecycle.write().unwrap_or_else(PoisonError::into_inner);
        let previous_owner = lifecycle.transfer(caller, new_owner)?;

        tracing::info!(previous = %previous_owner, new = %new_owner, "Ownership transferred");
        self.emit(GuardEventKind::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }
}

impl TransactionGuard for ScopeGuard {
    fn check_transaction(&self, tx: &GuardedTransaction) -> Result<(), GuardError> {
        self.check(tx.to, tx.value, &tx.data, tx.operation)
    }

    fn check_after_execution(&self, tx_hash: B256, success: bool) {
        tracing::trace!(%tx_hash, success, "Post-execution hook");
    }
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("owner", &self.owner())
            .field("config", &self.config)
            .finish()
    }
}
