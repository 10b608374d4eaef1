//! # scope-guard CLI
//!
//! Administer a guard policy stored as a snapshot file and dry-run
//! transactions against it.
//!
//! ```text
//! scope-guard init 0xOwner
//! scope-guard --caller 0xOwner scope-target 0xToken
//! scope-guard --caller 0xOwner allow-function 0xToken --signature "transfer(address,uint256)"
//! scope-guard check 0xToken --data 0xa9059cbb...
//! ```
//!
//! `check` exits with status 1 when the guard would reject the transaction.

pub mod cli;
pub mod commands;
pub mod tracing_support;

pub use cli::{Cli, Command};
pub use commands::{run, Outcome};
pub use tracing_support::{init_subscriber, TracingConfig, TracingFormat};
