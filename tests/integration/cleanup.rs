//! Shutdown behaviour

use std::sync::Arc;
use std::time::{Duration, Instant};

use container_pool::Pool;

use crate::helpers::{settings, wait_until, FastFactory, HangingFactory, WAIT};

#[test]
fn test_cleanup_destroys_queued_containers() {
    let factory = FastFactory::new(Duration::ZERO);
    let counters = Arc::clone(&factory.counters);
    let pool = Pool::start(factory, settings(4)).unwrap();
    assert!(wait_until(WAIT, || pool.size() == 4));

    let destroyed = pool.cleanup(Duration::ZERO).unwrap();
    assert_eq!(destroyed, 4);
    assert_eq!(pool.size(), 0);
    assert!(!pool.is_running());
    assert_eq!(counters.destroyed(), 4);

    // Second call is a no-op.
    assert_eq!(pool.cleanup(Duration::ZERO).unwrap(), 0);
}

#[test]
fn test_cleanup_stops_replenishment() {
    let factory = FastFactory::new(Duration::ZERO);
    let counters = Arc::clone(&factory.counters);
    let pool = Pool::start(factory, settings(3)).unwrap();
    assert!(wait_until(WAIT, || pool.size() == 3));

    pool.cleanup(Duration::from_secs(1)).unwrap();
    let created = counters.created();

    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(counters.created(), created);
    assert_eq!(pool.size(), 0);
    assert!(pool.get(Some(Duration::ZERO)).is_none());
}

#[test]
fn test_cleanup_timeout_reports_live_workers() {
    let (factory, release) = HangingFactory::new();
    let pool = Pool::start(factory, settings(2)).unwrap();
    assert!(wait_until(WAIT, || pool.worker_count() >= 1));

    let start = Instant::now();
    let err = pool.cleanup(Duration::from_millis(100)).unwrap_err();
    assert!(err.is_worker_timeout());
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(pool.size(), 0);

    release.open();
}

#[test]
fn test_drop_cleans_up() {
    let factory = FastFactory::new(Duration::ZERO);
    let counters = Arc::clone(&factory.counters);
    {
        let pool = Pool::start(factory, settings(2)).unwrap();
        assert!(wait_until(WAIT, || pool.size() == 2));
    }
    assert_eq!(counters.destroyed(), 2);
}
