//! Domain events emitted by the guard
//!
//! Every committed mutation produces one event. Events go to a pluggable
//! sink so deployments can keep an audit trail wherever they like.

use scope_guard_api::{Address, Clearance, ExecutionOptions, Selector};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;

/// Timestamp type (RFC 3339 string)
pub type Timestamp = String;

/// Event recorded after a successful guard mutation
#[derive(Debug, Clone, Serialize)]
pub struct GuardEvent {
    /// When the mutation was committed
    pub timestamp: Timestamp,
    /// What changed
    pub kind: GuardEventKind,
}

impl GuardEvent {
    /// Create a new event stamped with the current time
    pub fn new(kind: GuardEventKind) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            kind,
        }
    }

    /// Target address affected by the event, if any
    pub fn target(&self) -> Option<Address> {
        match &self.kind {
            GuardEventKind::SetTargetClearance { target, .. }
            | GuardEventKind::SetExecutionOptions { target, .. }
            | GuardEventKind::SetFunctionAllowed { target, .. } => Some(*target),
            GuardEventKind::GuardSetup { .. } | GuardEventKind::OwnershipTransferred { .. } => {
                None
            }
        }
    }
}

/// What a guard event records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GuardEventKind {
    /// Guard was initialized
    GuardSetup { initiator: Address, owner: Address },
    /// Owner was replaced
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    /// Clearance of a target was set
    SetTargetClearance {
        target: Address,
        clearance: Clearance,
    },
    /// Execution options of a target were set
    SetExecutionOptions {
        target: Address,
        options: ExecutionOptions,
    },
    /// A selector was allowed or revoked on a target
    SetFunctionAllowed {
        target: Address,
        selector: Selector,
        allowed: bool,
    },
}

/// Error type for event sinks
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Failed to write audit log: {0}")]
    WriteError(#[from] std::io::Error),

    #[error("Failed to serialize guard event: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Event sink lock poisoned")]
    Poisoned,
}

/// Trait for guard event sinks
///
/// # Example
///
/// ```rust
/// use scope_guard::audit::{AuditError, EventSink, GuardEvent};
///
/// struct StdoutSink;
///
/// impl EventSink for StdoutSink {
///     fn record(&self, event: GuardEvent) -> Result<(), AuditError> {
///         println!("{:?}", event.kind);
///         Ok(())
///     }
///
///     fn flush(&self) -> Result<(), AuditError> {
///         Ok(())
///     }
/// }
/// ```
pub trait EventSink: Send + Sync {
    /// Record an event
    fn record(&self, event: GuardEvent) -> Result<(), AuditError>;

    /// Flush any buffered events
    fn flush(&self) -> Result<(), AuditError>;

    /// Check if the sink is healthy/available
    fn is_healthy(&self) -> bool {
        true
    }
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn record(&self, event: GuardEvent) -> Result<(), AuditError> {
        (**self).record(event)
    }

    fn flush(&self) -> Result<(), AuditError> {
        (**self).flush()
    }

    fn is_healthy(&self) -> bool {
        (**self).is_healthy()
    }
}

// ============================================================================
// Default Implementations
// ============================================================================

/// File-based event sink (JSONL format)
pub struct FileEventSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileEventSink {
    /// Open (or create) an append-only event log
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for FileEventSink {
    fn record(&self, event: GuardEvent) -> Result<(), AuditError> {
        let json = serde_json::to_string(&event)?;
        let mut writer = self.writer.lock().map_err(|_| AuditError::Poisoned)?;
        writeln!(writer, "{}", json)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), AuditError> {
        let mut writer = self.writer.lock().map_err(|_| AuditError::Poisoned)?;
        writer.flush()?;
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.path.parent().map(|p| p.exists()).unwrap_or(true)
    }
}

impl fmt::Debug for FileEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEventSink")
            .field("path", &self.path)
            .finish()
    }
}

/// In-memory event sink, bounded with FIFO eviction
///
/// A capacity of zero keeps nothing.
pub struct MemoryEventSink {
    events: RwLock<VecDeque<GuardEvent>>,
    max_events: usize,
}

impl MemoryEventSink {
    /// Create a new memory sink with default capacity (1000 events)
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    /// Create a new memory sink with specified capacity
    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(max_events.min(1000))),
            max_events,
        }
    }

    /// Get all recorded events, oldest first
    pub fn events(&self) -> Vec<GuardEvent> {
        self.events
            .read()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Get recorded event kinds, oldest first
    pub fn kinds(&self) -> Vec<GuardEventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }

    /// Get event count
    pub fn count(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Clear all events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }

    /// Find events affecting a target
    pub fn find_by_target(&self, target: &Address) -> Vec<GuardEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.target().as_ref() == Some(target))
            .collect()
    }
}

impl Default for MemoryEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, event: GuardEvent) -> Result<(), AuditError> {
        if self.max_events == 0 {
            return Ok(());
        }
        let mut events = self.events.write().map_err(|_| AuditError::Poisoned)?;
        while events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
        Ok(())
    }

    fn flush(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

impl fmt::Debug for MemoryEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryEventSink")
            .field("count", &self.count())
            .field("max_events", &self.max_events)
            .finish()
    }
}

/// Null event sink (discards all events)
#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn record(&self, _event: GuardEvent) -> Result<(), AuditError> {
        Ok(())
    }

    fn flush(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Composite event sink that writes to multiple sinks
#[derive(Default)]
pub struct CompositeEventSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl EventSink for CompositeEventSink {
    fn record(&self, event: GuardEvent) -> Result<(), AuditError> {
        for sink in &self.sinks {
            sink.record(event.clone())?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), AuditError> {
        for sink in &self.sinks {
            sink.flush()?;
        }
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.sinks.iter().all(|s| s.is_healthy())
    }
}

impl fmt::Debug for CompositeEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeEventSink")
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clearance_event(byte: u8) -> GuardEvent {
        GuardEvent::new(GuardEventKind::SetTargetClearance {
            target: Address::repeat_byte(byte),
            clearance: Clearance::Target,
        })
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemoryEventSink::new();
        sink.record(clearance_event(0x11)).unwrap();

        assert_eq!(sink.count(), 1);
        let found = sink.find_by_target(&Address::repeat_byte(0x11));
        assert_eq!(found.len(), 1);
        assert!(sink.find_by_target(&Address::repeat_byte(0x22)).is_empty());

        sink.clear();
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_memory_sink_eviction() {
        let sink = MemoryEventSink::with_capacity(2);

        for byte in 1..=3 {
            sink.record(clearance_event(byte)).unwrap();
        }

        assert_eq!(sink.count(), 2);
        let events = sink.events();
        assert_eq!(events[0].target(), Some(Address::repeat_byte(2)));
        assert_eq!(events[1].target(), Some(Address::repeat_byte(3)));
    }

    #[test]
    fn test_zero_capacity_sink_keeps_nothing() {
        let sink = MemoryEventSink::with_capacity(0);
        sink.record(clearance_event(1)).unwrap();
        sink.record(clearance_event(2)).unwrap();
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_composite_sink_fans_out() {
        let first = Arc::new(MemoryEventSink::new());
        let second = Arc::new(MemoryEventSink::new());
        let composite = CompositeEventSink::new()
            .with_sink(first.clone())
            .with_sink(second.clone())
            .with_sink(NullEventSink);

        composite.record(clearance_event(0x11)).unwrap();
        composite.flush().unwrap();

        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 1);
        assert!(composite.is_healthy());
    }

    #[test]
    fn test_event_serialization() {
        let event = GuardEvent::new(GuardEventKind::SetFunctionAllowed {
            target: Address::repeat_byte(0x11),
            selector: Selector::new([0xaa, 0xbb, 0xcc, 0xdd]),
            allowed: true,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("set_function_allowed"));
        assert!(json.contains("0xaabbccdd"));
        assert!(json.contains("\"allowed\":true"));
    }

    #[test]
    fn test_setup_event_has_no_target() {
        let event = GuardEvent::new(GuardEventKind::GuardSetup {
            initiator: Address::repeat_byte(0x01),
            owner: Address::repeat_byte(0x02),
        });
        assert_eq!(event.target(), None);
    }

    #[test]
    fn test_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("guard.jsonl");

        let sink = FileEventSink::new(&path).unwrap();
        sink.record(clearance_event(0x11)).unwrap();
        sink.record(clearance_event(0x22)).unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("set_target_clearance"));
        assert!(sink.is_healthy());
    }
}
