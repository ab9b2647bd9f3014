//! Factory failures, timeouts and the error throttle

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use container_pool::{Pool, WorkerErrorKind};

use crate::helpers::{settings, wait_until, FailingFactory, HangingFactory, WAIT};

#[test]
fn test_small_pool_rejected() {
    for size in [0, 1] {
        let err = Pool::new(FailingFactory::new(), size).err().unwrap();
        assert!(err.is_invalid_config());
    }
}

#[test]
fn test_failing_factory_reports_errors() {
    let factory = FailingFactory::new();
    let calls = Arc::clone(&factory.calls);
    let pool = Pool::new(factory, 5).unwrap();

    std::thread::sleep(Duration::from_secs(1));
    assert_eq!(pool.size(), 0);
    assert!(!pool.errors().is_empty());
    assert!(pool.worker_count() <= 5);

    // Stop the monitor and join every worker before counting.
    pool.cleanup(WAIT).unwrap();
    assert_eq!(pool.worker_count(), 0);

    // Exactly one queued error per failed attempt.
    let errors = pool.errors().drain();
    let attempts = calls.load(Ordering::SeqCst);
    assert!(attempts > 0);
    assert_eq!(errors.len(), attempts);
    assert!(errors.iter().all(|e| e.kind == WorkerErrorKind::Create));
    assert!(errors[0].message.contains("image not found"));
}

#[test]
fn test_throttle_stops_new_workers() {
    let factory = FailingFactory::new();
    let calls = Arc::clone(&factory.calls);
    let pool = Pool::start(factory, settings(4).with_max_errors_per_hour(3)).unwrap();

    assert!(wait_until(WAIT, || pool.is_throttled()));
    assert!(wait_until(WAIT, || pool.worker_count() == 0));
    let attempts = calls.load(Ordering::SeqCst);

    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(calls.load(Ordering::SeqCst), attempts);
    assert!(pool.recent_error_count() >= 3);
    assert!(pool.status().throttled);
}

#[test]
fn test_throttle_releases_as_errors_age_out() {
    let factory = FailingFactory::new();
    let calls = Arc::clone(&factory.calls);
    let pool = Pool::start(
        factory,
        settings(2)
            .with_worker_max(1)
            .with_max_errors_per_hour(2)
            .with_error_window(Duration::from_millis(300)),
    )
    .unwrap();

    assert!(wait_until(WAIT, || pool.is_throttled()));
    let attempts = calls.load(Ordering::SeqCst);

    assert!(wait_until(WAIT, || calls.load(Ordering::SeqCst) > attempts));
}

#[test]
fn test_hanging_worker_times_out() {
    let (factory, release) = HangingFactory::new();
    let counters = Arc::clone(&factory.counters);
    let pool = Pool::start(
        factory,
        settings(2)
            .with_worker_max(1)
            .with_creation_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    assert!(wait_until(WAIT, || pool
        .errors()
        .recent(usize::MAX)
        .iter()
        .any(|e| e.is_timeout())));

    // The timed-out worker is no longer tracked; at most its replacement is.
    assert!(pool.worker_count() <= 1);
    assert_eq!(pool.size(), 0);

    // Abandoned workers finish eventually; their containers are destroyed,
    // not delivered.
    release.open();
    assert!(wait_until(WAIT, || counters.created() >= 1));
    assert!(wait_until(WAIT, || counters.destroyed() >= 1));
}
