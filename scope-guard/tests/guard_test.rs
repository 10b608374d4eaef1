//! Integration tests for the guard's admin, ownership and authorization surface

use scope_guard::{
    Address, AuthorizationError, Clearance, ExecutionOptions, GuardConfig, GuardError,
    GuardEventKind, GuardPresets, GuardedTransaction, Initializable, MemoryEventSink, Operation,
    OwnershipControlled, ScopeGuard, Selector, TransactionGuard, B256, FALLBACK_SELECTOR, U256,
};
use std::sync::Arc;

const OWNER: Address = Address::repeat_byte(0x01);
const STRANGER: Address = Address::repeat_byte(0x02);
const T: Address = Address::repeat_byte(0x7a);
const SELECTOR: Selector = Selector::new([0xaa, 0xbb, 0xcc, 0xdd]);

fn setup() -> (ScopeGuard, Arc<MemoryEventSink>) {
    let (config, sink) = GuardPresets::testing();
    let guard = ScopeGuard::new(config);
    guard.initialize(OWNER, OWNER).expect("initialize");
    (guard, sink)
}

fn reason(result: Result<(), GuardError>) -> Option<AuthorizationError> {
    result.err().and_then(|e| e.reason())
}

#[test]
fn test_unconfigured_target_rejected() {
    let (guard, _) = setup();
    assert_eq!(
        reason(guard.check(T, U256::ZERO, &[], Operation::Call)),
        Some(AuthorizationError::TargetAddressNotAllowed)
    );
}

#[test]
fn test_allowed_target_accepts_any_function() {
    let (guard, _) = setup();
    guard.allow_target(OWNER, T).unwrap();
    assert!(guard
        .check(T, U256::ZERO, &[0x12, 0x34, 0x56, 0x78], Operation::Call)
        .is_ok());
}

#[test]
fn test_allowed_target_without_send_rejects_value() {
    let (guard, _) = setup();
    guard.allow_target(OWNER, T).unwrap();
    assert_eq!(
        reason(guard.check(T, U256::from(1), &[], Operation::Call)),
        Some(AuthorizationError::SendNotAllowed)
    );
}

#[test]
fn test_scoped_target_checks_selector() {
    let (guard, _) = setup();
    guard.scope_target(OWNER, T).unwrap();
    guard.scope_allow_function(OWNER, T, SELECTOR).unwrap();

    let mut call = SELECTOR.to_vec();
    call.extend_from_slice(&[0u8; 64]);
    assert!(guard.check(T, U256::ZERO, &call, Operation::Call).is_ok());

    assert_eq!(
        reason(guard.check(T, U256::ZERO, &[0x11, 0x22, 0x33, 0x44], Operation::Call)),
        Some(AuthorizationError::FunctionNotAllowed)
    );
}

#[test]
fn test_scoped_target_fallback() {
    let (guard, _) = setup();
    guard.scope_target(OWNER, T).unwrap();
    assert_eq!(
        reason(guard.check(T, U256::ZERO, &[], Operation::Call)),
        Some(AuthorizationError::FunctionNotAllowed)
    );

    guard.scope_allow_fallback(OWNER, T).unwrap();
    assert!(guard.check(T, U256::ZERO, &[], Operation::Call).is_ok());
}

#[test]
fn test_short_data_rejected_under_any_configuration() {
    let (guard, _) = setup();
    let short = [0x12, 0x34];

    assert_eq!(
        reason(guard.check(T, U256::ZERO, &short, Operation::Call)),
        Some(AuthorizationError::FunctionSignatureTooShort)
    );

    guard.allow_target(OWNER, T).unwrap();
    guard
        .set_execution_options(OWNER, T, ExecutionOptions::Both)
        .unwrap();
    assert_eq!(
        reason(guard.check(T, U256::ZERO, &short, Operation::Call)),
        Some(AuthorizationError::FunctionSignatureTooShort)
    );

    guard.scope_target(OWNER, T).unwrap();
    guard.scope_allow_fallback(OWNER, T).unwrap();
    assert_eq!(
        reason(guard.check(T, U256::ZERO, &[0x12, 0x34, 0x56], Operation::Call)),
        Some(AuthorizationError::FunctionSignatureTooShort)
    );
}

#[test]
fn test_revoked_target_rejects_despite_options_and_selectors() {
    let (guard, _) = setup();
    guard.scope_target(OWNER, T).unwrap();
    guard
        .set_execution_options(OWNER, T, ExecutionOptions::Both)
        .unwrap();
    guard.scope_allow_function(OWNER, T, SELECTOR).unwrap();
    guard.revoke_target(OWNER, T).unwrap();

    for operation in [Operation::Call, Operation::DelegateCall] {
        assert_eq!(
            reason(guard.check(T, U256::from(3), &SELECTOR[..], operation)),
            Some(AuthorizationError::TargetAddressNotAllowed)
        );
    }
}

#[test]
fn test_selectors_persist_across_clearance_changes() {
    let (guard, _) = setup();
    guard.scope_target(OWNER, T).unwrap();
    guard.scope_allow_function(OWNER, T, SELECTOR).unwrap();

    guard.allow_target(OWNER, T).unwrap();
    guard.revoke_target(OWNER, T).unwrap();
    guard.scope_target(OWNER, T).unwrap();

    assert!(guard.is_allowed_function(&T, &SELECTOR).unwrap());
    assert!(guard.check(T, U256::ZERO, &SELECTOR[..], Operation::Call).is_ok());
}

#[test]
fn test_function_toggle_round_trip() {
    let (guard, _) = setup();
    guard.scope_target(OWNER, T).unwrap();
    let before = guard.target(&T).unwrap();

    guard.scope_allow_function(OWNER, T, SELECTOR).unwrap();
    guard.scope_revoke_function(OWNER, T, SELECTOR).unwrap();

    assert_eq!(guard.target(&T).unwrap(), before);
    assert!(!guard.is_allowed_function(&T, &SELECTOR).unwrap());
}

#[test]
fn test_delegate_call_option() {
    let (guard, _) = setup();
    guard.allow_target(OWNER, T).unwrap();

    let tx = GuardedTransaction::delegate_call(T, vec![0x12, 0x34, 0x56, 0x78]);
    let err = guard.check_transaction(&tx).unwrap_err();
    assert_eq!(err.reason(), Some(AuthorizationError::DelegateCallNotAllowed));

    guard
        .set_execution_options(OWNER, T, ExecutionOptions::DelegateCall)
        .unwrap();
    assert!(guard.is_allowed_to_delegate_call(&T).unwrap());
    assert!(!guard.is_value_allowed(&T).unwrap());
    assert!(guard.check_transaction(&tx).is_ok());

    let with_value = tx.with_value(U256::from(1));
    assert_eq!(
        guard.check_transaction(&with_value).unwrap_err().reason(),
        Some(AuthorizationError::SendNotAllowed)
    );
}

#[test]
fn test_sender_does_not_change_decision() {
    let (guard, _) = setup();
    guard.scope_target(OWNER, T).unwrap();
    guard.scope_allow_function(OWNER, T, SELECTOR).unwrap();

    for sender in [OWNER, STRANGER, Address::ZERO] {
        let allowed = GuardedTransaction::call(T, SELECTOR.to_vec()).with_sender(sender);
        assert!(guard.check_transaction(&allowed).is_ok());

        let denied =
            GuardedTransaction::call(T, vec![0x11, 0x22, 0x33, 0x44]).with_sender(sender);
        assert_eq!(
            guard.check_transaction(&denied).unwrap_err().reason(),
            Some(AuthorizationError::FunctionNotAllowed)
        );
    }
}

#[test]
fn test_only_owner_may_administer() {
    let (guard, sink) = setup();
    let events_before = sink.count();

    let attempts: Vec<Result<(), GuardError>> = vec![
        guard.allow_target(STRANGER, T),
        guard.revoke_target(STRANGER, T),
        guard.scope_target(STRANGER, T),
        guard.set_execution_options(STRANGER, T, ExecutionOptions::Both),
        guard.scope_allow_function(STRANGER, T, SELECTOR),
        guard.scope_revoke_function(STRANGER, T, SELECTOR),
        guard.scope_allow_fallback(STRANGER, T),
        guard.scope_revoke_fallback(STRANGER, T),
        guard.transfer_ownership(STRANGER, STRANGER),
    ];

    for attempt in attempts {
        assert!(attempt.unwrap_err().is_access_denied());
    }
    assert!(guard.target(&T).unwrap().is_inert());
    assert_eq!(sink.count(), events_before);
}

#[test]
fn test_ownership_transfer() {
    let (guard, sink) = setup();
    guard.transfer_ownership(OWNER, STRANGER).unwrap();

    assert_eq!(guard.owner(), Some(STRANGER));
    assert!(guard.allow_target(OWNER, T).unwrap_err().is_access_denied());
    guard.allow_target(STRANGER, T).unwrap();
    assert!(guard.is_allowed_target(&T).unwrap());

    assert!(sink.kinds().contains(&GuardEventKind::OwnershipTransferred {
        previous_owner: OWNER,
        new_owner: STRANGER,
    }));
}

#[test]
fn test_transfer_to_zero_rejected() {
    let (guard, _) = setup();
    let err = guard.transfer_ownership(OWNER, Address::ZERO).unwrap_err();
    assert!(matches!(err, GuardError::Init(_)));
    assert_eq!(guard.owner(), Some(OWNER));
}

#[test]
fn test_events_emitted_for_every_mutation() {
    let (guard, sink) = setup();

    guard.allow_target(OWNER, T).unwrap();
    guard.allow_target(OWNER, T).unwrap();
    guard
        .set_execution_options(OWNER, T, ExecutionOptions::Send)
        .unwrap();
    guard.scope_allow_fallback(OWNER, T).unwrap();

    assert_eq!(
        sink.kinds(),
        vec![
            GuardEventKind::GuardSetup {
                initiator: OWNER,
                owner: OWNER,
            },
            GuardEventKind::SetTargetClearance {
                target: T,
                clearance: Clearance::Target,
            },
            GuardEventKind::SetTargetClearance {
                target: T,
                clearance: Clearance::Target,
            },
            GuardEventKind::SetExecutionOptions {
                target: T,
                options: ExecutionOptions::Send,
            },
            GuardEventKind::SetFunctionAllowed {
                target: T,
                selector: FALLBACK_SELECTOR,
                allowed: true,
            },
        ]
    );
    assert_eq!(sink.find_by_target(&T).len(), 4);
}

#[test]
fn test_checks_emit_no_events() {
    let (guard, sink) = setup();
    let count = sink.count();

    let _ = guard.check(T, U256::ZERO, &[], Operation::Call);
    guard.check_after_execution(B256::ZERO, false);

    assert_eq!(sink.count(), count);
}

#[test]
fn test_zero_capacity_event_sink_does_not_fail_mutations() {
    let sink = Arc::new(MemoryEventSink::with_capacity(0));
    let config = GuardConfig::builder().events(Arc::clone(&sink)).build();
    let guard = ScopeGuard::new(config);

    guard.initialize(OWNER, OWNER).unwrap();
    guard.allow_target(OWNER, T).unwrap();
    guard.transfer_ownership(OWNER, STRANGER).unwrap();

    assert_eq!(guard.owner(), Some(STRANGER));
    assert!(guard.is_allowed_target(&T).unwrap());
    assert_eq!(sink.count(), 0);
}

#[test]
fn test_post_execution_hook_never_rejects() {
    let (guard, _) = setup();
    // Returns unit; nothing to reject with
    guard.check_after_execution(B256::repeat_byte(0xff), true);
    guard.check_after_execution(B256::ZERO, false);
}

#[test]
fn test_concurrent_checks_and_mutations() {
    let (guard, _) = setup();
    guard.scope_target(OWNER, T).unwrap();
    guard
        .set_execution_options(OWNER, T, ExecutionOptions::Both)
        .unwrap();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..200 {
                guard.scope_allow_function(OWNER, T, SELECTOR).unwrap();
                guard.scope_revoke_function(OWNER, T, SELECTOR).unwrap();
            }
        });

        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..200 {
                    let result = guard.check(T, U256::ZERO, &SELECTOR[..], Operation::Call);
                    match result {
                        Ok(()) => {}
                        Err(e) => {
                            assert_eq!(e.reason(), Some(AuthorizationError::FunctionNotAllowed))
                        }
                    }
                }
            });
        }
    });

    assert!(!guard.is_allowed_function(&T, &SELECTOR).unwrap());
}
