//! Filling, refilling and handing out containers

use std::time::{Duration, Instant};

use container_pool::{Container, Pool, PoolSettings};

use crate::helpers::{settings, wait_until, FastFactory, WAIT};

#[test]
fn test_fast_factory_fills_pool() {
    let pool = Pool::new(FastFactory::new(Duration::from_millis(10)), 5).unwrap();

    // Default 100ms period: five ticks to spawn five workers.
    std::thread::sleep(Duration::from_secs(1));
    assert_eq!(pool.size(), 5);
    assert!(wait_until(WAIT, || pool.worker_count() == 0));
    assert_eq!(pool.capacity(), 5);
    assert!(pool.errors().is_empty());
}

#[test]
fn test_size_never_exceeds_capacity() {
    let factory = FastFactory::new(Duration::ZERO);
    let counters = std::sync::Arc::clone(&factory.counters);
    let pool = Pool::start(factory, settings(3).with_worker_max(5)).unwrap();

    let deadline = Instant::now() + Duration::from_millis(500);
    while Instant::now() < deadline {
        assert!(pool.size() <= pool.capacity());
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(pool.size(), 3);
    assert_eq!(counters.created(), 3);
}

#[test]
fn test_get_refills() {
    let pool = Pool::start(FastFactory::new(Duration::from_millis(5)), settings(4)).unwrap();
    assert!(wait_until(WAIT, || pool.size() == 4));

    let taken: Vec<_> = (0..3)
        .map(|_| pool.get(Some(Duration::ZERO)).expect("container ready"))
        .collect();
    assert_eq!(taken.len(), 3);

    assert!(wait_until(WAIT, || pool.size() == 4));
}

#[test]
fn test_get_delivers_started_containers_in_order() {
    let factory = FastFactory::new(Duration::ZERO);
    let counters = std::sync::Arc::clone(&factory.counters);
    let pool = Pool::start(factory, settings(2).with_worker_max(1)).unwrap();
    assert!(wait_until(WAIT, || pool.size() == 2));

    let first = pool.get(Some(Duration::ZERO)).unwrap();
    assert_eq!(first.name(), "test-0");
    assert_eq!(counters.started(), 2);
}

#[test]
fn test_blocking_get_waits_for_creation() {
    let pool = Pool::start(
        FastFactory::new(Duration::from_millis(200)),
        PoolSettings::new(2)
            .with_worker_max(1)
            .with_monitor_period(Duration::from_millis(10)),
    )
    .unwrap();

    let start = Instant::now();
    assert!(pool.get(None).is_some());
    assert!(start.elapsed() >= Duration::from_millis(150));
}

#[test]
fn test_get_zero_timeout_on_empty_pool() {
    let pool = Pool::start(FastFactory::new(Duration::from_secs(2)), settings(2)).unwrap();

    let start = Instant::now();
    assert!(pool.get(Some(Duration::ZERO)).is_none());
    assert!(start.elapsed() < Duration::from_millis(50));

    let start = Instant::now();
    assert!(pool.get(Some(Duration::from_millis(100))).is_none());
    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[test]
fn test_status_snapshot() {
    let pool = Pool::start(FastFactory::new(Duration::ZERO), settings(2)).unwrap();
    assert!(wait_until(WAIT, || pool.size() == 2));

    let status = pool.status();
    assert!(status.running);
    assert_eq!(status.size, 2);
    assert_eq!(status.capacity, 2);
    assert!(!status.throttled);

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["capacity"], 2);
    assert!(json.get("last_error").is_none());
}
