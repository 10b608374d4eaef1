//! Hook surface consumed by the wallet
//!
//! The wallet calls `check_transaction` before it applies a transaction and
//! must treat any error as "do not execute". `check_after_execution` exists
//! only to satisfy the hook contract; its outcome never matters.

use scope_guard_api::{Address, Bytes, Operation, Selector, B256, U256};

use crate::error::GuardError;

/// ERC-165 `supportsInterface(bytes4)` interface id
pub const ERC165_INTERFACE_ID: Selector = Selector::new([0x01, 0xff, 0xc9, 0xa7]);

/// Safe transaction guard interface id
pub const GUARD_INTERFACE_ID: Selector = Selector::new([0xe6, 0xd7, 0xa8, 0x3a]);

/// Transaction the wallet is about to execute
///
/// Mirrors the arguments a Safe passes to its guard. Only `to`, `value`,
/// `data` and `operation` influence the decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardedTransaction {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: Operation,
    pub safe_tx_gas: U256,
    pub base_gas: U256,
    pub gas_price: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
    pub signatures: Bytes,
    pub msg_sender: Address,
}

impl GuardedTransaction {
    /// Plain call with no value
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            ..Self::default()
        }
    }

    /// Delegate-call with no value
    pub fn delegate_call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            operation: Operation::DelegateCall,
            ..Self::default()
        }
    }

    /// Attach a value to the call
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Record who submitted the transaction to the wallet
    pub fn with_sender(mut self, sender: Address) -> Self {
        self.msg_sender = sender;
        self
    }
}

/// Capability: pre- and post-execution transaction hooks
pub trait TransactionGuard {
    /// Decide whether the wallet may execute `tx`
    fn check_transaction(&self, tx: &GuardedTransaction) -> Result<(), GuardError>;

    /// Post-execution hook; never rejects
    fn check_after_execution(&self, tx_hash: B256, success: bool) {
        let _ = (tx_hash, success);
    }

    /// ERC-165 interface detection
    fn supports_interface(&self, interface_id: Selector) -> bool {
        interface_id == ERC165_INTERFACE_ID || interface_id == GUARD_INTERFACE_ID
    }
}
