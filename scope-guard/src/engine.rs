//! Authorization decision algorithm
//!
//! Checks run in a fixed order and the first failing check decides the
//! reported reason:
//!
//! 1. non-empty call-data shorter than a selector
//! 2. target without clearance
//! 3. non-zero value without send permission
//! 4. delegate-call without delegate-call permission
//! 5. unscoped target: allow
//! 6. scoped target: allow only listed selectors

use scope_guard_api::{
    Clearance, Operation, Selector, TargetPermission, FALLBACK_SELECTOR, SELECTOR_LEN, U256,
};

use crate::error::AuthorizationError;

/// Extract the selector a call invokes
///
/// Empty call-data maps to the fallback selector. Returns `None` when the
/// data is too short to hold a selector.
pub fn selector_of(data: &[u8]) -> Option<Selector> {
    match data.len() {
        0 => Some(FALLBACK_SELECTOR),
        len if len < SELECTOR_LEN => None,
        _ => Some(Selector::from_slice(&data[..SELECTOR_LEN])),
    }
}

/// Decide whether a call against `record` may proceed
pub fn authorize(
    record: &TargetPermission,
    value: U256,
    data: &[u8],
    operation: Operation,
) -> Result<(), AuthorizationError> {
    let selector = selector_of(data).ok_or(AuthorizationError::FunctionSignatureTooShort)?;

    if record.clearance == Clearance::None {
        return Err(AuthorizationError::TargetAddressNotAllowed);
    }

    if !value.is_zero() && !record.execution_options.allows_send() {
        return Err(AuthorizationError::SendNotAllowed);
    }

    if operation == Operation::DelegateCall && !record.execution_options.allows_delegate_call() {
        return Err(AuthorizationError::DelegateCallNotAllowed);
    }

    match record.clearance {
        Clearance::Target => Ok(()),
        Clearance::Function if record.is_function_allowed(&selector) => Ok(()),
        Clearance::Function => Err(AuthorizationError::FunctionNotAllowed),
        Clearance::None => unreachable!("targets without clearance are rejected above"),
    }
}
