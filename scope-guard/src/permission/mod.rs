//! Permission storage and guard configuration
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       GuardConfig                        │
//! │  ┌──────────────────────────┐ ┌────────────────────────┐ │
//! │  │    PermissionStore       │ │       EventSink        │ │
//! │  │                          │ │                        │ │
//! │  │ - MemoryTargetStore      │ │ - File (JSONL)         │ │
//! │  │ - ReadOnlyTargetStore    │ │ - Memory               │ │
//! │  │ - custom backends        │ │ - Null                 │ │
//! │  │                          │ │ - Composite            │ │
//! │  └──────────────────────────┘ └────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scope_guard::permission::{GuardConfig, GuardPresets, MemoryTargetStore};
//! use scope_guard::audit::FileEventSink;
//!
//! // Defaults: memory store, events discarded
//! let config = GuardPresets::in_memory();
//!
//! // Custom components
//! let config = GuardConfig::builder()
//!     .store(MemoryTargetStore::new())
//!     .events(FileEventSink::new("guard-events.jsonl")?)
//!     .build();
//! ```
//!
//! Stores hold one record per target address. Reading an address nobody
//! configured returns the default record (no clearance, no options, no
//! selectors), and records are never deleted.

pub mod presets;
pub mod store;

pub use presets::{GuardConfig, GuardConfigBuilder, GuardPresets, PresetError};
pub use store::{MemoryTargetStore, PermissionStore, ReadOnlyTargetStore, StoreError};
