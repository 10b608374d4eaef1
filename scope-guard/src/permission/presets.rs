//! Guard configuration bundles
//!
//! Provides a builder and ready-to-use configurations that deployments can
//! use directly or as starting points for customization.

use std::path::Path;
use std::sync::Arc;

use super::store::{MemoryTargetStore, PermissionStore};
use crate::audit::{EventSink, FileEventSink, MemoryEventSink, NullEventSink};

/// Storage and audit components a guard is built from
#[derive(Clone)]
pub struct GuardConfig {
    /// Permission storage
    pub store: Arc<dyn PermissionStore>,
    /// Destination for domain events
    pub events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for GuardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardConfig")
            .field("events_healthy", &self.events.is_healthy())
            .finish_non_exhaustive()
    }
}

impl GuardConfig {
    /// Create a configuration with custom components
    pub fn new(store: impl PermissionStore + 'static, events: impl EventSink + 'static) -> Self {
        Self {
            store: Arc::new(store),
            events: Arc::new(events),
        }
    }

    /// Start a builder
    pub fn builder() -> GuardConfigBuilder {
        GuardConfigBuilder::new()
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::new(MemoryTargetStore::new(), NullEventSink)
    }
}

/// Builder for guard configurations
#[derive(Default)]
pub struct GuardConfigBuilder {
    store: Option<Arc<dyn PermissionStore>>,
    events: Option<Arc<dyn EventSink>>,
}

impl GuardConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the permission store
    pub fn store(mut self, store: impl PermissionStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set the event sink
    pub fn events(mut self, events: impl EventSink + 'static) -> Self {
        self.events = Some(Arc::new(events));
        self
    }

    /// Build the configuration; unset components fall back to memory/null
    pub fn build(self) -> GuardConfig {
        GuardConfig {
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryTargetStore::new())),
            events: self.events.unwrap_or_else(|| Arc::new(NullEventSink)),
        }
    }
}

/// Error type for preset initialization
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("Failed to initialize audit log: {0}")]
    AuditInit(String),
}

// ============================================================================
// Preset Configurations
// ============================================================================

/// Preset configurations for common deployments
pub struct GuardPresets;

impl GuardPresets {
    /// In-memory store, events discarded
    pub fn in_memory() -> GuardConfig {
        GuardConfig::default()
    }

    /// In-memory store with an append-only JSONL audit log
    pub fn audited(audit_log: impl AsRef<Path>) -> Result<GuardConfig, PresetError> {
        let sink =
            FileEventSink::new(audit_log).map_err(|e| PresetError::AuditInit(e.to_string()))?;
        Ok(GuardConfig::new(MemoryTargetStore::new(), sink))
    }

    /// In-memory store and sink; the returned handle exposes recorded events
    pub fn testing() -> (GuardConfig, Arc<MemoryEventSink>) {
        let sink = Arc::new(MemoryEventSink::new());
        let config = GuardConfig::builder().events(sink.clone()).build();
        (config, sink)
    }
}
