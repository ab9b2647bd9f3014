//! Bounded blocking FIFO for ready containers.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// A thread-safe FIFO holding at most `capacity` items.
///
/// Producers block in [`push`](Self::push) while the queue is full; consumers
/// choose between [`try_pop`](Self::try_pop), [`pop_timeout`](Self::pop_timeout)
/// and [`pop`](Self::pop).
#[derive(Debug)]
pub struct ContainerQueue<C> {
    items: Mutex<VecDeque<C>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<C> ContainerQueue<C> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Append an item, waiting for space if the queue is full.
    pub fn push(&self, item: C) {
        let mut items = self.lock();
        while items.len() >= self.capacity {
            items = self
                .not_full
                .wait(items)
                .unwrap_or_else(|e| e.into_inner());
        }
        items.push_back(item);
        drop(items);
        self.not_empty.notify_one();
    }

    /// Remove the oldest item without blocking.
    pub fn try_pop(&self) -> Option<C> {
        let item = self.lock().pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Remove the oldest item, waiting up to `timeout` for one to arrive.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<C> {
        let deadline = Instant::now() + timeout;
        let mut items = self.lock();
        loop {
            if let Some(item) = items.pop_front() {
                drop(items);
                self.not_full.notify_one();
                return Some(item);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            items = self
                .not_empty
                .wait_timeout(items, remaining)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }

    /// Remove the oldest item, waiting as long as it takes.
    pub fn pop(&self) -> C {
        let mut items = self.lock();
        loop {
            if let Some(item) = items.pop_front() {
                drop(items);
                self.not_full.notify_one();
                return item;
            }
            items = self
                .not_empty
                .wait(items)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Remove every queued item, oldest first.
    pub fn drain(&self) -> Vec<C> {
        let drained: Vec<C> = self.lock().drain(..).collect();
        if !drained.is_empty() {
            self.not_full.notify_all();
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.lock().len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<C>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}
