//! Permission storage keyed by target address
//!
//! Provides trait-based storage so deployments can back the permission
//! table with whatever persistence they need. Stores perform no validation;
//! the guard decides who may write.

use scope_guard_api::{Address, Clearance, ExecutionOptions, Selector, TargetPermission};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Error type for permission store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Permission store lock poisoned")]
    Poisoned,

    #[error("Store is read-only")]
    ReadOnly,

    #[error("Permission store backend failed: {0}")]
    Backend(String),
}

/// Trait for permission storage
///
/// Reading an address that was never written yields the default record.
/// Records are never deleted, only reset to inert values.
pub trait PermissionStore: Send + Sync {
    /// Get the record for a target (default record when absent)
    fn get(&self, target: &Address) -> Result<TargetPermission, StoreError>;

    /// Replace the whole record for a target
    fn put(&self, target: Address, record: TargetPermission) -> Result<(), StoreError>;

    /// Set clearance, creating the record if needed
    fn set_clearance(&self, target: Address, clearance: Clearance) -> Result<(), StoreError>;

    /// Set execution options, creating the record if needed
    fn set_execution_options(
        &self,
        target: Address,
        options: ExecutionOptions,
    ) -> Result<(), StoreError>;

    /// Set or clear membership of a selector, creating the record if needed
    fn set_function_allowed(
        &self,
        target: Address,
        selector: Selector,
        allowed: bool,
    ) -> Result<(), StoreError>;

    /// List every record ever written, ordered by address
    fn list(&self) -> Result<Vec<(Address, TargetPermission)>, StoreError>;

    /// Get clearance for a target
    fn clearance(&self, target: &Address) -> Result<Clearance, StoreError> {
        Ok(self.get(target)?.clearance)
    }

    /// Get execution options for a target
    fn execution_options(&self, target: &Address) -> Result<ExecutionOptions, StoreError> {
        Ok(self.get(target)?.execution_options)
    }

    /// Test selector membership for a target
    fn is_function_allowed(
        &self,
        target: &Address,
        selector: &Selector,
    ) -> Result<bool, StoreError> {
        Ok(self.get(target)?.is_function_allowed(selector))
    }
}

impl<S: PermissionStore + ?Sized> PermissionStore for Arc<S> {
    fn get(&self, target: &Address) -> Result<TargetPermission, StoreError> {
        (**self).get(target)
    }

    fn put(&self, target: Address, record: TargetPermission) -> Result<(), StoreError> {
        (**self).put(target, record)
    }

    fn set_clearance(&self, target: Address, clearance: Clearance) -> Result<(), StoreError> {
        (**self).set_clearance(target, clearance)
    }

    fn set_execution_options(
        &self,
        target: Address,
        options: ExecutionOptions,
    ) -> Result<(), StoreError> {
        (**self).set_execution_options(target, options)
    }

    fn set_function_allowed(
        &self,
        target: Address,
        selector: Selector,
        allowed: bool,
    ) -> Result<(), StoreError> {
        (**self).set_function_allowed(target, selector, allowed)
    }

    fn list(&self) -> Result<Vec<(Address, TargetPermission)>, StoreError> {
        (**self).list()
    }
}

// ============================================================================
// In-Memory Permission Store
// ============================================================================

/// In-memory permission store
///
/// Reads share the lock; every write replaces one field of one record under
/// the exclusive lock, so readers never see a half-applied change.
pub struct MemoryTargetStore {
    records: RwLock<HashMap<Address, TargetPermission>>,
}

impl MemoryTargetStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records ever written
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if no record was ever written
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update(
        &self,
        target: Address,
        apply: impl FnOnce(&mut TargetPermission),
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        apply(records.entry(target).or_default());
        Ok(())
    }
}

impl Default for MemoryTargetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionStore for MemoryTargetStore {
    fn get(&self, target: &Address) -> Result<TargetPermission, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(target).cloned().unwrap_or_default())
    }

    fn put(&self, target: Address, record: TargetPermission) -> Result<(), StoreError> {
        self.update(target, |r| *r = record)
    }

    fn set_clearance(&self, target: Address, clearance: Clearance) -> Result<(), StoreError> {
        self.update(target, |r| r.clearance = clearance)
    }

    fn set_execution_options(
        &self,
        target: Address,
        options: ExecutionOptions,
    ) -> Result<(), StoreError> {
        self.update(target, |r| r.execution_options = options)
    }

    fn set_function_allowed(
        &self,
        target: Address,
        selector: Selector,
        allowed: bool,
    ) -> Result<(), StoreError> {
        self.update(target, |r| {
            if allowed {
                r.allowed_functions.insert(selector);
            } else {
                r.allowed_functions.remove(&selector);
            }
        })
    }

    fn list(&self) -> Result<Vec<(Address, TargetPermission)>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        let mut entries: Vec<_> = records.iter().map(|(k, v)| (*k, v.clone())).collect();
        entries.sort_by_key(|(address, _)| *address);
        Ok(entries)
    }
}

impl std::fmt::Debug for MemoryTargetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTargetStore")
            .field("count", &self.len())
            .finish()
    }
}

// ============================================================================
// Read-Only Permission Store
// ============================================================================

/// Read-only wrapper for any permission store
///
/// Useful for check-only deployments where the policy is loaded once and
/// must not change at runtime.
pub struct ReadOnlyTargetStore<S: PermissionStore> {
    inner: S,
}

impl<S: PermissionStore> ReadOnlyTargetStore<S> {
    /// Create a read-only wrapper
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Unwrap the inner store
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: PermissionStore> PermissionStore for ReadOnlyTargetStore<S> {
    fn get(&self, target: &Address) -> Result<TargetPermission, StoreError> {
        self.inner.get(target)
    }

    fn put(&self, _target: Address, _record: TargetPermission) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly)
    }

    fn set_clearance(&self, _target: Address, _clearance: Clearance) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly)
    }

    fn set_execution_options(
        &self,
        _target: Address,
        _options: ExecutionOptions,
    ) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly)
    }

    fn set_function_allowed(
        &self,
        _target: Address,
        _selector: Selector,
        _allowed: bool,
    ) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly)
    }

    fn list(&self) -> Result<Vec<(Address, TargetPermission)>, StoreError> {
        self.inner.list()
    }
}

impl<S: PermissionStore + std::fmt::Debug> std::fmt::Debug for ReadOnlyTargetStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadOnlyTargetStore")
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELECTOR: Selector = Selector::new([0xaa, 0xbb, 0xcc, 0xdd]);

    #[test]
    fn test_absent_record_is_default() {
        let store = MemoryTargetStore::new();
        let target = Address::repeat_byte(0x11);

        let record = store.get(&target).unwrap();
        assert!(record.is_inert());
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_fields() {
        let store = MemoryTargetStore::new();
        let target = Address::repeat_byte(0x11);

        store.set_clearance(target, Clearance::Function).unwrap();
        store
            .set_execution_options(target, ExecutionOptions::Send)
            .unwrap();
        store.set_function_allowed(target, SELECTOR, true).unwrap();

        assert_eq!(store.clearance(&target).unwrap(), Clearance::Function);
        assert_eq!(
            store.execution_options(&target).unwrap(),
            ExecutionOptions::Send
        );
        assert!(store.is_function_allowed(&target, &SELECTOR).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_selectors_survive_clearance_changes() {
        let store = MemoryTargetStore::new();
        let target = Address::repeat_byte(0x22);

        store.set_function_allowed(target, SELECTOR, true).unwrap();
        store.set_clearance(target, Clearance::Target).unwrap();
        store.set_clearance(target, Clearance::None).unwrap();
        store.set_clearance(target, Clearance::Function).unwrap();

        assert!(store.is_function_allowed(&target, &SELECTOR).unwrap());
    }

    #[test]
    fn test_revoked_record_is_kept() {
        let store = MemoryTargetStore::new();
        let target = Address::repeat_byte(0x33);

        store.set_clearance(target, Clearance::Target).unwrap();
        store.set_clearance(target, Clearance::None).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].1.is_inert());
    }

    #[test]
    fn test_list_is_ordered() {
        let store = MemoryTargetStore::new();
        store
            .set_clearance(Address::repeat_byte(0x99), Clearance::Target)
            .unwrap();
        store
            .set_clearance(Address::repeat_byte(0x01), Clearance::Target)
            .unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed[0].0, Address::repeat_byte(0x01));
        assert_eq!(listed[1].0, Address::repeat_byte(0x99));
    }

    #[test]
    fn test_read_only_store() {
        let inner = MemoryTargetStore::new();
        let target = Address::repeat_byte(0x44);
        inner.set_clearance(target, Clearance::Target).unwrap();

        let store = ReadOnlyTargetStore::new(inner);

        // Can read
        assert_eq!(store.clearance(&target).unwrap(), Clearance::Target);

        // Cannot write
        assert!(matches!(
            store.set_clearance(target, Clearance::None),
            Err(StoreError::ReadOnly)
        ));
        assert!(matches!(
            store.set_function_allowed(target, SELECTOR, true),
            Err(StoreError::ReadOnly)
        ));
        assert_eq!(store.into_inner().clearance(&target).unwrap(), Clearance::Target);
    }
}
