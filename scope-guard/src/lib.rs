//! scope-guard: transaction guard for multisig wallets
//!
//! A wallet consults the guard before executing any transaction. The guard
//! rejects calls to targets the owner has not approved, value transfers and
//! delegate-calls the target is not cleared for, and functions outside a
//! scoped target's allowed selectors.
//!
//! ```rust
//! use scope_guard::{GuardPresets, ScopeGuard, TransactionGuard, GuardedTransaction};
//! use scope_guard::{Address, Selector};
//!
//! let owner = Address::repeat_byte(0x01);
//! let token = Address::repeat_byte(0x11);
//! let transfer = Selector::new([0xa9, 0x05, 0x9c, 0xbb]);
//!
//! let guard = ScopeGuard::with_owner(GuardPresets::in_memory(), owner, owner).unwrap();
//! guard.scope_target(owner, token).unwrap();
//! guard.scope_allow_function(owner, token, transfer).unwrap();
//!
//! let tx = GuardedTransaction::call(token, transfer.to_vec());
//! assert!(guard.check_transaction(&tx).is_ok());
//! ```

pub mod audit;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod guard;
pub mod hook;
pub mod ownership;
pub mod permission;
pub mod snapshot;

pub use audit::{EventSink, GuardEvent, GuardEventKind, MemoryEventSink};
pub use dispatch::{DispatchError, GuardFunction};
pub use error::{AdminError, AuthorizationError, GuardError, InitError, TransferError};
pub use guard::ScopeGuard;
pub use hook::{GuardedTransaction, TransactionGuard, ERC165_INTERFACE_ID, GUARD_INTERFACE_ID};
pub use ownership::{Initializable, Lifecycle, OwnershipControlled};
pub use permission::{GuardConfig, GuardPresets, MemoryTargetStore, PermissionStore};
pub use scope_guard_api::{
    selector_from_signature, Address, Bytes, Clearance, ExecutionOptions, Operation, Selector,
    TargetPermission, B256, FALLBACK_SELECTOR, U256,
};
pub use snapshot::{GuardSnapshot, SnapshotError};
