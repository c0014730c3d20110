use resilience_core::{ContextPool, ExecutionContext};

#[test]
fn pooled_contexts_do_not_leak_operation_keys_across_calls() {
    let pool = ContextPool::new();

    {
        let mut ctx = pool.acquire();
        ctx.set_operation_key("call-a");
    }

    let ctx = pool.acquire();
    assert_eq!(ctx.operation_key(), None);
}

#[test]
fn with_operation_key_builder_sets_the_key() {
    let ctx = ExecutionContext::new().with_operation_key("orders.get");
    assert_eq!(ctx.operation_key(), Some("orders.get"));
}

#[test]
fn cancellation_of_a_grandchild_does_not_affect_siblings() {
    let root = ExecutionContext::new();
    let hedge_attempt_1 = root.child();
    let hedge_attempt_2 = root.child();

    hedge_attempt_1.cancel();

    assert!(hedge_attempt_1.is_canceled());
    assert!(!hedge_attempt_2.is_canceled());
    assert!(!root.is_canceled());
}
