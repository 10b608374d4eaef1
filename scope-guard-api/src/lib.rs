//! scope-guard-api: Shared types for the scope-guard transaction guard
//!
//! This crate defines the permission data model consulted by the guard
//! before a wallet executes a transaction. Records serialize with serde so
//! they can be persisted in policy snapshots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use alloy_primitives::{keccak256, Address, Bytes, Selector, B256, U256};

/// Snapshot format version for compatibility checking
pub const SNAPSHOT_VERSION: u32 = 1;

/// Length of a function selector in bytes
pub const SELECTOR_LEN: usize = 4;

/// Reserved selector standing for the fallback function and empty call-data
pub const FALLBACK_SELECTOR: Selector = Selector::ZERO;

/// Compute the 4-byte selector of a function signature
///
/// ```
/// use scope_guard_api::{selector_from_signature, Selector};
///
/// let transfer = selector_from_signature("transfer(address,uint256)");
/// assert_eq!(transfer, Selector::new([0xa9, 0x05, 0x9c, 0xbb]));
/// ```
pub fn selector_from_signature(signature: &str) -> Selector {
    Selector::from_slice(&keccak256(signature.as_bytes())[..SELECTOR_LEN])
}

/// Error returned when parsing an enum from its textual or numeric form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown {kind}: '{value}'")]
    UnknownName { kind: &'static str, value: String },

    #[error("Unknown {kind} discriminant: {value}")]
    UnknownDiscriminant { kind: &'static str, value: u8 },
}

/// Coarse permission level for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clearance {
    /// Calls to the target are rejected outright
    #[default]
    None,
    /// Any function on the target may be called
    Target,
    /// Only explicitly allowed selectors may be called
    Function,
}

impl fmt::Display for Clearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clearance::None => write!(f, "none"),
            Clearance::Target => write!(f, "target"),
            Clearance::Function => write!(f, "function"),
        }
    }
}

/// Whether value transfer and/or delegate-call are permitted to a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOptions {
    #[default]
    None,
    Send,
    DelegateCall,
    Both,
}

impl ExecutionOptions {
    /// Whether calls may carry a non-zero value
    pub fn allows_send(self) -> bool {
        matches!(self, ExecutionOptions::Send | ExecutionOptions::Both)
    }

    /// Whether delegate-calls are permitted
    pub fn allows_delegate_call(self) -> bool {
        matches!(self, ExecutionOptions::DelegateCall | ExecutionOptions::Both)
    }
}

impl From<ExecutionOptions> for u8 {
    fn from(options: ExecutionOptions) -> Self {
        match options {
            ExecutionOptions::None => 0,
            ExecutionOptions::Send => 1,
            ExecutionOptions::DelegateCall => 2,
            ExecutionOptions::Both => 3,
        }
    }
}

impl TryFrom<u8> for ExecutionOptions {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ExecutionOptions::None),
            1 => Ok(ExecutionOptions::Send),
            2 => Ok(ExecutionOptions::DelegateCall),
            3 => Ok(ExecutionOptions::Both),
            _ => Err(ParseError::UnknownDiscriminant {
                kind: "execution options",
                value,
            }),
        }
    }
}

impl FromStr for ExecutionOptions {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "none" => Ok(ExecutionOptions::None),
            "send" => Ok(ExecutionOptions::Send),
            "delegate_call" | "delegatecall" => Ok(ExecutionOptions::DelegateCall),
            "both" => Ok(ExecutionOptions::Both),
            _ => Err(ParseError::UnknownName {
                kind: "execution options",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExecutionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionOptions::None => write!(f, "none"),
            ExecutionOptions::Send => write!(f, "send"),
            ExecutionOptions::DelegateCall => write!(f, "delegate_call"),
            ExecutionOptions::Both => write!(f, "both"),
        }
    }
}

/// Kind of call the wallet intends to make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    #[default]
    Call,
    DelegateCall,
}

impl From<Operation> for u8 {
    fn from(operation: Operation) -> Self {
        match operation {
            Operation::Call => 0,
            Operation::DelegateCall => 1,
        }
    }
}

impl TryFrom<u8> for Operation {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Operation::Call),
            1 => Ok(Operation::DelegateCall),
            _ => Err(ParseError::UnknownDiscriminant {
                kind: "operation",
                value,
            }),
        }
    }
}

impl FromStr for Operation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "call" => Ok(Operation::Call),
            "delegate_call" | "delegatecall" => Ok(Operation::DelegateCall),
            _ => Err(ParseError::UnknownName {
                kind: "operation",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Call => write!(f, "call"),
            Operation::DelegateCall => write!(f, "delegate_call"),
        }
    }
}

/// Permission record for a single destination address
///
/// The default value is the record every unconfigured address has.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPermission {
    /// Coarse permission level
    #[serde(default)]
    pub clearance: Clearance,

    /// Value and delegate-call rules
    #[serde(default)]
    pub execution_options: ExecutionOptions,

    /// Selectors callable when the target is scoped
    #[serde(default)]
    pub allowed_functions: BTreeSet<Selector>,
}

impl TargetPermission {
    /// Create a record with the given clearance and no options
    pub fn new(clearance: Clearance) -> Self {
        Self {
            clearance,
            ..Self::default()
        }
    }

    /// Set execution options
    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.execution_options = options;
        self
    }

    /// Allow a selector
    pub fn with_function(mut self, selector: Selector) -> Self {
        self.allowed_functions.insert(selector);
        self
    }

    /// Check whether a selector is in the allowed set
    pub fn is_function_allowed(&self, selector: &Selector) -> bool {
        self.allowed_functions.contains(selector)
    }

    /// Check whether this record is indistinguishable from an unconfigured one
    pub fn is_inert(&self) -> bool {
        *self == Self::default()
    }
}
