//! Command execution against a policy snapshot

use anyhow::{bail, Context, Result};
use scope_guard::{
    Address, AuthorizationError, EventSink, GuardPresets, GuardSnapshot, Initializable,
    OwnershipControlled, ScopeGuard, FALLBACK_SELECTOR,
};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, Command};

/// Result of a command that completed without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Allowed,
    Rejected(AuthorizationError),
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Completed | Outcome::Allowed => 0,
            Outcome::Rejected(_) => 1,
        }
    }
}

/// `<config dir>/scope-guard/policy.json`
pub fn default_policy_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine the user config directory")?;
    Ok(dir.join("scope-guard").join("policy.json"))
}

fn require_caller(cli: &Cli) -> Result<Address> {
    match cli.caller {
        Some(caller) => Ok(caller),
        None => bail!("--caller is required for this command"),
    }
}

fn load_guard(cli: &Cli, path: &Path) -> Result<ScopeGuard> {
    let snapshot = GuardSnapshot::load_or_default(path)
        .with_context(|| format!("Failed to load policy {}", path.display()))?;

    let config = match &cli.audit_log {
        Some(audit_log) => GuardPresets::audited(audit_log)?,
        None => GuardPresets::in_memory(),
    };

    Ok(ScopeGuard::restore(config, &snapshot)?)
}

fn save_guard(guard: &ScopeGuard, path: &Path) -> Result<()> {
    guard
        .snapshot()?
        .save(path)
        .with_context(|| format!("Failed to save policy {}", path.display()))?;
    tracing::info!(path = %path.display(), "Policy saved");

    if let Err(e) = guard.config().events.flush() {
        tracing::warn!(error = %e, "Failed to flush guard events");
    }
    Ok(())
}

/// Run `cli.command`, writing human-readable output to `out`
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<Outcome> {
    let path = match &cli.policy {
        Some(path) => path.clone(),
        None => default_policy_path()?,
    };
    let guard = load_guard(cli, &path)?;

    match &cli.command {
        Command::Check {
            target,
            value,
            data,
            operation,
        } => {
            return match guard.check(*target, *value, data, *operation) {
                Ok(()) => {
                    writeln!(out, "allowed")?;
                    Ok(Outcome::Allowed)
                }
                Err(e) => match e.reason() {
                    Some(reason) => {
                        writeln!(out, "rejected: {}", reason)?;
                        Ok(Outcome::Rejected(reason))
                    }
                    None => Err(e.into()),
                },
            };
        }
        Command::Show => {
            show(&guard, out)?;
            return Ok(Outcome::Completed);
        }
        Command::Init { owner } => {
            guard.initialize(cli.caller.unwrap_or(*owner), *owner)?;
        }
        Command::TransferOwnership { new_owner } => {
            guard.transfer_ownership(require_caller(cli)?, *new_owner)?;
        }
        Command::AllowTarget(args) => guard.allow_target(require_caller(cli)?, args.target)?,
        Command::RevokeTarget(args) => guard.revoke_target(require_caller(cli)?, args.target)?,
        Command::ScopeTarget(args) => guard.scope_target(require_caller(cli)?, args.target)?,
        Command::SetOptions { target, options } => {
            guard.set_execution_options(require_caller(cli)?, *target, *options)?;
        }
        Command::AllowFunction(args) => {
            guard.scope_allow_function(require_caller(cli)?, args.target, args.resolve())?;
        }
        Command::RevokeFunction(args) => {
            guard.scope_revoke_function(require_caller(cli)?, args.target, args.resolve())?;
        }
        Command::AllowFallback(args) => {
            guard.scope_allow_fallback(require_caller(cli)?, args.target)?;
        }
        Command::RevokeFallback(args) => {
            guard.scope_revoke_fallback(require_caller(cli)?, args.target)?;
        }
    }

    save_guard(&guard, &path)?;
    writeln!(out, "ok")?;
    Ok(Outcome::Completed)
}

fn show(guard: &ScopeGuard, out: &mut impl Write) -> Result<()> {
    let snapshot = guard.snapshot()?;

    match snapshot.owner {
        Some(owner) => writeln!(out, "owner:       {}", owner)?,
        None => writeln!(out, "owner:       (uninitialized)")?,
    }
    writeln!(out, "fingerprint: {}", snapshot.fingerprint())?;

    for entry in snapshot.targets.iter().filter(|e| !e.permission.is_inert()) {
        let functions: Vec<String> = entry
            .permission
            .allowed_functions
            .iter()
            .map(|selector| {
                if *selector == FALLBACK_SELECTOR {
                    "fallback".to_string()
                } else {
                    selector.to_string()
                }
            })
            .collect();

        writeln!(
            out,
            "{}  clearance={} options={} functions=[{}]",
            entry.address,
            entry.permission.clearance,
            entry.permission.execution_options,
            functions.join(", ")
        )?;
    }
    Ok(())
}
