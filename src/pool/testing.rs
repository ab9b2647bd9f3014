//! Fake factories for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::factory::{BoxError, Container, ContainerFactory};

/// Shared counters observed by tests.
#[derive(Debug, Default)]
pub struct Counters {
    pub created: AtomicUsize,
    pub started: AtomicUsize,
    pub destroyed: AtomicUsize,
}

impl Counters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct FakeContainer {
    pub id: usize,
    fail_start: bool,
    counters: Arc<Counters>,
}

impl Container for FakeContainer {
    fn start(&mut self, _wait_for_network: bool) -> Result<(), BoxError> {
        if self.fail_start {
            return Err("start failed".into());
        }
        self.counters.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy(self) -> Result<(), BoxError> {
        self.counters.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> String {
        format!("fake-{}", self.id)
    }
}

/// Manually opened gate that blocked factory calls wait on.
#[derive(Debug, Default)]
pub struct Gate {
    open: Mutex<bool>,
    cond: Condvar,
}

impl Gate {
    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cond.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cond.wait(open).unwrap();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    FailCreate,
    FailStart,
    Panic,
}

#[derive(Debug)]
pub struct FakeFactory {
    pub counters: Arc<Counters>,
    pub gate: Option<Arc<Gate>>,
    latency: Duration,
    behavior: Behavior,
}

impl FakeFactory {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            gate: None,
            latency: Duration::ZERO,
            behavior,
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Behavior::Succeed)
    }

    pub fn failing() -> Self {
        Self::new(Behavior::FailCreate)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn gated(mut self) -> (Self, Arc<Gate>) {
        let gate = Arc::new(Gate::default());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }
}

impl ContainerFactory for FakeFactory {
    type Container = FakeContainer;

    fn create_container(&self) -> Result<FakeContainer, BoxError> {
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        match self.behavior {
            Behavior::FailCreate => Err("create failed".into()),
            Behavior::Panic => panic!("factory exploded"),
            Behavior::Succeed | Behavior::FailStart => {
                let id = self.counters.created.fetch_add(1, Ordering::SeqCst);
                Ok(FakeContainer {
                    id,
                    fail_start: self.behavior == Behavior::FailStart,
                    counters: Arc::clone(&self.counters),
                })
            }
        }
    }
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
