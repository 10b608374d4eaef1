//! Command-line arguments

use clap::{Args, Parser, Subcommand};
use scope_guard::{Address, Bytes, ExecutionOptions, Operation, Selector, U256};
use std::path::PathBuf;

use crate::tracing_support::TracingFormat;

/// Administer and query a scope-guard policy file
#[derive(Parser, Debug)]
#[command(name = "scope-guard", version, about)]
pub struct Cli {
    /// Policy snapshot to operate on
    ///
    /// Defaults to `<config dir>/scope-guard/policy.json`.
    #[arg(long, global = true, env = "SCOPE_GUARD_POLICY")]
    pub policy: Option<PathBuf>,

    /// Address performing the operation
    #[arg(long, global = true, env = "SCOPE_GUARD_CALLER")]
    pub caller: Option<Address>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true, default_value = "compact")]
    pub log_format: TracingFormat,

    /// Append guard events to this JSON Lines file
    #[arg(long, global = true)]
    pub audit_log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Set the initial owner (once per policy)
    Init {
        owner: Address,
    },

    /// Hand ownership to another address
    TransferOwnership {
        new_owner: Address,
    },

    /// Allow any function on a target
    AllowTarget(TargetArg),

    /// Reject every call to a target
    RevokeTarget(TargetArg),

    /// Restrict a target to allowed functions
    ScopeTarget(TargetArg),

    /// Set value/delegate-call options (none, send, delegate-call, both)
    SetOptions {
        target: Address,
        options: ExecutionOptions,
    },

    /// Allow a function on a scoped target
    AllowFunction(FunctionArgs),

    /// Revoke a function on a scoped target
    RevokeFunction(FunctionArgs),

    /// Allow empty call-data and the fallback function
    AllowFallback(TargetArg),

    /// Revoke empty call-data and the fallback function
    RevokeFallback(TargetArg),

    /// Check whether a transaction would be allowed
    Check {
        target: Address,

        /// Wei sent with the call
        #[arg(long, default_value = "0")]
        value: U256,

        /// Hex-encoded call-data
        #[arg(long, default_value = "0x")]
        data: Bytes,

        /// call or delegate-call
        #[arg(long, default_value = "call")]
        operation: Operation,
    },

    /// Print owner, targets and policy fingerprint
    Show,
}

#[derive(Args, Debug)]
pub struct TargetArg {
    pub target: Address,
}

#[derive(Args, Debug)]
pub struct FunctionArgs {
    pub target: Address,

    /// Four-byte selector, e.g. 0xa9059cbb
    #[arg(required_unless_present = "signature", conflicts_with = "signature")]
    pub selector: Option<Selector>,

    /// Function signature, e.g. "transfer(address,uint256)"
    #[arg(long)]
    pub signature: Option<String>,
}

impl FunctionArgs {
    pub fn resolve(&self) -> Selector {
        match (&self.selector, &self.signature) {
            (Some(selector), _) => *selector,
            (None, Some(signature)) => scope_guard::selector_from_signature(signature),
            (None, None) => unreachable!("clap requires a selector or --signature"),
        }
    }
}
