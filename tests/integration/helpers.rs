//! Test factories and utilities

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use container_pool::{BoxError, Container, ContainerFactory, PoolSettings};

/// Upper bound for any condition a test waits on.
pub const WAIT: Duration = Duration::from_secs(10);

/// Shared lifecycle counters.
#[derive(Default)]
pub struct Counters {
    pub created: AtomicUsize,
    pub started: AtomicUsize,
    pub destroyed: AtomicUsize,
}

#[allow(dead_code)]
impl Counters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

/// Container that only reports to its counters.
pub struct TestContainer {
    id: usize,
    counters: Arc<Counters>,
}

impl Container for TestContainer {
    fn start(&mut self, _wait_for_network: bool) -> Result<(), BoxError> {
        self.counters.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy(self) -> Result<(), BoxError> {
        self.counters.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> String {
        format!("test-{}", self.id)
    }
}

/// Succeeds after a fixed latency.
pub struct FastFactory {
    latency: Duration,
    pub counters: Arc<Counters>,
}

impl FastFactory {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            counters: Arc::new(Counters::default()),
        }
    }
}

impl ContainerFactory for FastFactory {
    type Container = TestContainer;

    fn create_container(&self) -> Result<TestContainer, BoxError> {
        thread::sleep(self.latency);
        let id = self.counters.created.fetch_add(1, Ordering::SeqCst);
        Ok(TestContainer {
            id,
            counters: Arc::clone(&self.counters),
        })
    }
}

/// Fails every call.
pub struct FailingFactory {
    pub calls: Arc<AtomicUsize>,
}

impl FailingFactory {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl ContainerFactory for FailingFactory {
    type Container = TestContainer;

    fn create_container(&self) -> Result<TestContainer, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err("image not found".into())
    }
}

/// Blocks every call until released, then succeeds.
pub struct HangingFactory {
    release: Arc<(Mutex<bool>, Condvar)>,
    pub counters: Arc<Counters>,
}

/// Lets a [`HangingFactory`]'s blocked calls return.
#[derive(Clone)]
pub struct Release(Arc<(Mutex<bool>, Condvar)>);

impl Release {
    pub fn open(&self) {
        let (lock, cvar) = &*self.0;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }
}

impl HangingFactory {
    pub fn new() -> (Self, Release) {
        let release = Arc::new((Mutex::new(false), Condvar::new()));
        let factory = Self {
            release: Arc::clone(&release),
            counters: Arc::new(Counters::default()),
        };
        (factory, Release(release))
    }
}

impl ContainerFactory for HangingFactory {
    type Container = TestContainer;

    fn create_container(&self) -> Result<TestContainer, BoxError> {
        let (lock, cvar) = &*self.release;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = cvar.wait(open).unwrap();
        }
        drop(open);

        let id = self.counters.created.fetch_add(1, Ordering::SeqCst);
        Ok(TestContainer {
            id,
            counters: Arc::clone(&self.counters),
        })
    }
}

/// Settings with a short monitor period.
pub fn settings(size: usize) -> PoolSettings {
    PoolSettings::new(size).with_monitor_period(Duration::from_millis(10))
}

/// Poll `cond` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}
