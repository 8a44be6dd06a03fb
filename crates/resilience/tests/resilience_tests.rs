// crates/resilience/tests/resilience_tests.rs
//! Integration tests for resilience patterns

use hearlearn_resilience::{with_timeout, ResilienceError, SingleFlight, Timeout};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_single_flight_admits_one_concurrent_run() {
    let gate = SingleFlight::new("ingestion");
    let active = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));
    let admitted = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let gate = gate.clone();
        let active = Arc::clone(&active);
        let max_seen = Arc::clone(&max_seen);
        let admitted = Arc::clone(&admitted);

        handles.push(tokio::spawn(async move {
            if let Ok(_permit) = gate.try_enter() {
                admitted.fetch_add(1, Ordering::SeqCst);
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }
        }));
    }

    for handle in handles {
        handle.await.expect("task panicked");
    }

    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    assert!(admitted.load(Ordering::SeqCst) >= 1);
    assert!(!gate.is_busy());
}

#[tokio::test]
async fn test_timeout_inside_gate_releases_slot() {
    let gate = SingleFlight::new("ingestion");
    let timeout = Timeout::new(Duration::from_millis(10));

    {
        let _permit = gate.try_enter().expect("gate should be idle");
        let result = timeout
            .execute(tokio::time::sleep(Duration::from_millis(200)))
            .await;
        assert!(matches!(result, Err(ResilienceError::Timeout(_))));
    }

    assert!(gate.try_enter().is_ok());
}

#[tokio::test]
async fn test_with_timeout_propagates_inner_result() {
    let result: Result<Result<u32, String>, _> =
        with_timeout(Duration::from_secs(1), async { Err("inner".to_string()) }).await;

    match result {
        Ok(Err(message)) => assert_eq!(message, "inner"),
        other => panic!("unexpected result: {:?}", other),
    }
}
