//! ABI call dispatch
//!
//! Routes ABI-encoded calldata addressed to the guard onto [`ScopeGuard`]
//! operations and ABI-encodes the results. Calldata with an unknown
//! selector, or too short to carry one, falls through to the fallback: it
//! succeeds with empty output and changes nothing, so a host that changes
//! its calling convention cannot brick itself on the guard.

use scope_guard_api::{
    selector_from_signature, Address, Bytes, ExecutionOptions, Operation, Selector, B256,
    SELECTOR_LEN, U256,
};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

use crate::error::GuardError;
use crate::guard::ScopeGuard;
use crate::hook::{GuardedTransaction, TransactionGuard};
use crate::ownership::{Initializable, OwnershipControlled};

const WORD: usize = 32;

/// Error type for dispatched calls
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("Malformed arguments for {function}: {reason}")]
    MalformedArguments {
        function: &'static str,
        reason: String,
    },
}

/// Every externally callable guard function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardFunction {
    SetUp,
    Owner,
    TransferOwnership,
    AllowTarget,
    RevokeTarget,
    ScopeTarget,
    SetExecutionOptions,
    ScopeAllowFunction,
    ScopeRevokeFunction,
    ScopeAllowFallback,
    ScopeRevokeFallback,
    IsAllowedTarget,
    IsScoped,
    IsAllowedFunction,
    IsAllowedToDelegateCall,
    IsFallbackAllowed,
    IsValueAllowed,
    CheckTransaction,
    CheckAfterExecution,
    SupportsInterface,
}

impl GuardFunction {
    pub const ALL: [GuardFunction; 20] = [
        GuardFunction::SetUp,
        GuardFunction::Owner,
        GuardFunction::TransferOwnership,
        GuardFunction::AllowTarget,
        GuardFunction::RevokeTarget,
        GuardFunction::ScopeTarget,
        GuardFunction::SetExecutionOptions,
        GuardFunction::ScopeAllowFunction,
        GuardFunction::ScopeRevokeFunction,
        GuardFunction::ScopeAllowFallback,
        GuardFunction::ScopeRevokeFallback,
        GuardFunction::IsAllowedTarget,
        GuardFunction::IsScoped,
        GuardFunction::IsAllowedFunction,
        GuardFunction::IsAllowedToDelegateCall,
        GuardFunction::IsFallbackAllowed,
        GuardFunction::IsValueAllowed,
        GuardFunction::CheckTransaction,
        GuardFunction::CheckAfterExecution,
        GuardFunction::SupportsInterface,
    ];

    /// Canonical Solidity signature
    pub fn signature(self) -> &'static str {
        match self {
            Self::SetUp => "setUp(bytes)",
            Self::Owner => "owner()",
            Self::TransferOwnership => "transferOwnership(address)",
            Self::AllowTarget => "allowTarget(address)",
            Self::RevokeTarget => "revokeTarget(address)",
            Self::ScopeTarget => "scopeTarget(address)",
            Self::SetExecutionOptions => "setExecutionOptions(address,uint8)",
            Self::ScopeAllowFunction => "scopeAllowFunction(address,bytes4)",
            Self::ScopeRevokeFunction => "scopeRevokeFunction(address,bytes4)",
            Self::ScopeAllowFallback => "scopeAllowFallback(address)",
            Self::ScopeRevokeFallback => "scopeRevokeFallback(address)",
            Self::IsAllowedTarget => "isAllowedTarget(address)",
            Self::IsScoped => "isScoped(address)",
            Self::IsAllowedFunction => "isAllowedFunction(address,bytes4)",
            Self::IsAllowedToDelegateCall => "isAllowedToDelegateCall(address)",
            Self::IsFallbackAllowed => "isFallbackAllowed(address)",
            Self::IsValueAllowed => "isValueAllowed(address)",
            Self::CheckTransaction => {
                "checkTransaction(address,uint256,bytes,uint8,uint256,uint256,uint256,address,address,bytes,address)"
            }
            Self::CheckAfterExecution => "checkAfterExecution(bytes32,bool)",
            Self::SupportsInterface => "supportsInterface(bytes4)",
        }
    }

    pub fn selector(self) -> Selector {
        selector_from_signature(self.signature())
    }

    /// Look up a function by selector
    pub fn from_selector(selector: &Selector) -> Option<Self> {
        static TABLE: OnceLock<HashMap<Selector, GuardFunction>> = OnceLock::new();
        TABLE
            .get_or_init(|| Self::ALL.iter().map(|f| (f.selector(), *f)).collect())
            .get(selector)
            .copied()
    }

    fn name(self) -> &'static str {
        let signature = self.signature();
        signature.split('(').next().unwrap_or(signature)
    }
}

// ============================================================================
// Argument decoding
// ============================================================================

/// Reader over the ABI-encoded arguments following a selector
struct Args<'a> {
    function: GuardFunction,
    data: &'a [u8],
}

impl<'a> Args<'a> {
    fn malformed(&self, reason: impl Into<String>) -> DispatchError {
        DispatchError::MalformedArguments {
            function: self.function.name(),
            reason: reason.into(),
        }
    }

    fn word(&self, index: usize) -> Result<&'a [u8], DispatchError> {
        let start = index * WORD;
        self.data
            .get(start..start + WORD)
            .ok_or_else(|| self.malformed(format!("missing argument {}", index)))
    }

    fn word_at_offset(&self, offset: usize) -> Result<&'a [u8], DispatchError> {
        offset
            .checked_add(WORD)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| self.malformed("offset out of bounds"))
    }

    fn padded(&self, word: &[u8], keep: usize) -> Result<(), DispatchError> {
        if word[..WORD - keep].iter().any(|b| *b != 0) {
            return Err(self.malformed("dirty padding"));
        }
        Ok(())
    }

    fn address(&self, index: usize) -> Result<Address, DispatchError> {
        let word = self.word(index)?;
        self.padded(word, 20)?;
        Ok(Address::from_slice(&word[12..]))
    }

    fn uint256(&self, index: usize) -> Result<U256, DispatchError> {
        Ok(U256::from_be_slice(self.word(index)?))
    }

    fn uint8(&self, index: usize) -> Result<u8, DispatchError> {
        let word = self.word(index)?;
        self.padded(word, 1)?;
        Ok(word[WORD - 1])
    }

    fn boolean(&self, index: usize) -> Result<bool, DispatchError> {
        match self.uint8(index)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(self.malformed(format!("invalid bool {}", other))),
        }
    }

    fn bytes4(&self, index: usize) -> Result<Selector, DispatchError> {
        let word = self.word(index)?;
        if word[SELECTOR_LEN..].iter().any(|b| *b != 0) {
            return Err(self.malformed("dirty padding"));
        }
        Ok(Selector::from_slice(&word[..SELECTOR_LEN]))
    }

    fn bytes32(&self, index: usize) -> Result<B256, DispatchError> {
        Ok(B256::from_slice(self.word(index)?))
    }

    fn small_uint(&self, word: &[u8]) -> Result<usize, DispatchError> {
        self.padded(word, 8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&word[WORD - 8..]);
        usize::try_from(u64::from_be_bytes(raw)).map_err(|_| self.malformed("length overflow"))
    }

    /// Dynamic `bytes` argument whose head is at `index`
    fn bytes(&self, index: usize) -> Result<Bytes, DispatchError> {
        let offset = self.small_uint(self.word(index)?)?;
        let len = self.small_uint(self.word_at_offset(offset)?)?;
        let start = offset + WORD;
        start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .map(Bytes::copy_from_slice)
            .ok_or_else(|| self.malformed("bytes out of bounds"))
    }
}

// ============================================================================
// Result encoding
// ============================================================================

fn encode_bool(value: bool) -> Bytes {
    let mut word = [0u8; WORD];
    word[WORD - 1] = u8::from(value);
    Bytes::copy_from_slice(&word)
}

fn encode_address(address: Address) -> Bytes {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address.as_slice());
    Bytes::copy_from_slice(&word)
}

impl ScopeGuard {
    /// Execute an ABI-encoded call made by `caller`
    pub fn dispatch(&self, caller: Address, calldata: &[u8]) -> Result<Bytes, DispatchError> {
        let function = calldata
            .get(..SELECTOR_LEN)
            .map(Selector::from_slice)
            .and_then(|selector| GuardFunction::from_selector(&selector));

        let Some(function) = function else {
            tracing::trace!(len = calldata.len(), "Fallback call ignored");
            return Ok(Bytes::new());
        };

        let args = Args {
            function,
            data: &calldata[SELECTOR_LEN..],
        };

        let output = match function {
            GuardFunction::SetUp => {
                let params = args.bytes(0)?;
                let owner = Args {
                    function,
                    data: &params,
                }
                .address(0)?;
                self.initialize(caller, owner)?;
                Bytes::new()
            }
            GuardFunction::Owner => encode_address(self.owner().unwrap_or(Address::ZERO)),
            GuardFunction::TransferOwnership => {
                self.transfer_ownership(caller, args.address(0)?)?;
                Bytes::new()
            }
            GuardFunction::AllowTarget => {
                self.allow_target(caller, args.address(0)?)?;
                Bytes::new()
            }
            GuardFunction::RevokeTarget => {
                self.revoke_target(caller, args.address(0)?)?;
                Bytes::new()
            }
            GuardFunction::ScopeTarget => {
                self.scope_target(caller, args.address(0)?)?;
                Bytes::new()
            }
            GuardFunction::SetExecutionOptions => {
                let target = args.address(0)?;
                let options = ExecutionOptions::try_from(args.uint8(1)?)
                    .map_err(|e| args.malformed(e.to_string()))?;
                self.set_execution_options(caller, target, options)?;
                Bytes::new()
            }
            GuardFunction::ScopeAllowFunction => {
                self.scope_allow_function(caller, args.address(0)?, args.bytes4(1)?)?;
                Bytes::new()
            }
            GuardFunction::ScopeRevokeFunction => {
                self.scope_revoke_function(caller, args.address(0)?, args.bytes4(1)?)?;
                Bytes::new()
            }
            GuardFunction::ScopeAllowFallback => {
                self.scope_allow_fallback(caller, args.address(0)?)?;
                Bytes::new()
            }
            GuardFunction::ScopeRevokeFallback => {
                self.scope_revoke_fallback(caller, args.address(0)?)?;
                Bytes::new()
            }
            GuardFunction::IsAllowedTarget => {
                encode_bool(self.is_allowed_target(&args.address(0)?)?)
            }
            GuardFunction::IsScoped => encode_bool(self.is_scoped(&args.address(0)?)?),
            GuardFunction::IsAllowedFunction => {
                encode_bool(self.is_allowed_function(&args.address(0)?, &args.bytes4(1)?)?)
            }
            GuardFunction::IsAllowedToDelegateCall => {
                encode_bool(self.is_allowed_to_delegate_call(&args.address(0)?)?)
            }
            GuardFunction::IsFallbackAllowed => {
                encode_bool(self.is_fallback_allowed(&args.address(0)?)?)
            }
            GuardFunction::IsValueAllowed => encode_bool(self.is_value_allowed(&args.address(0)?)?),
            GuardFunction::CheckTransaction => {
                let operation = Operation::try_from(args.uint8(3)?)
                    .map_err(|e| args.malformed(e.to_string()))?;
                let tx = GuardedTransaction {
                    to: args.address(0)?,
                    value: args.uint256(1)?,
                    data: args.bytes(2)?,
                    operation,
                    safe_tx_gas: args.uint256(4)?,
                    base_gas: args.uint256(5)?,
                    gas_price: args.uint256(6)?,
                    gas_token: args.address(7)?,
                    refund_receiver: args.address(8)?,
                    signatures: args.bytes(9)?,
                    msg_sender: args.address(10)?,
                };
                self.check_transaction(&tx)?;
                Bytes::new()
            }
            GuardFunction::CheckAfterExecution => {
                self.check_after_execution(args.bytes32(0)?, args.boolean(1)?);
                Bytes::new()
            }
            GuardFunction::SupportsInterface => {
                encode_bool(self.supports_interface(args.bytes4(0)?))
            }
        };

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for function in GuardFunction::ALL {
            assert!(seen.insert(function.selector()), "{:?}", function);
            assert_eq!(GuardFunction::from_selector(&function.selector()), Some(function));
        }
    }

    #[test]
    fn test_known_selectors() {
        assert_eq!(
            GuardFunction::SupportsInterface.selector(),
            Selector::new([0x01, 0xff, 0xc9, 0xa7])
        );
        assert_eq!(
            GuardFunction::TransferOwnership.selector(),
            Selector::new([0xf2, 0xfd, 0xe3, 0x8b])
        );
        assert_eq!(
            GuardFunction::Owner.selector(),
            Selector::new([0x8d, 0xa5, 0xcb, 0x5b])
        );
    }

    #[test]
    fn test_function_names() {
        assert_eq!(GuardFunction::AllowTarget.name(), "allowTarget");
        assert_eq!(GuardFunction::Owner.name(), "owner");
    }

    #[test]
    fn test_bytes_argument_bounds() {
        // offset 0x20, length 0x40 but only 4 bytes of payload
        let mut data = vec![0u8; 64];
        data[31] = 0x20;
        data[63] = 0x40;
        data.extend_from_slice(&[1, 2, 3, 4]);

        let args = Args {
            function: GuardFunction::SetUp,
            data: &data,
        };
        assert!(matches!(
            args.bytes(0),
            Err(DispatchError::MalformedArguments { function: "setUp", .. })
        ));
    }

    #[test]
    fn test_dirty_address_padding_rejected() {
        let mut data = vec![0u8; 32];
        data[0] = 0xff;
        let args = Args {
            function: GuardFunction::AllowTarget,
            data: &data,
        };
        assert!(args.address(0).is_err());
    }
}
