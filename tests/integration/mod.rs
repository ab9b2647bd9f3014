//! Integration tests for container_pool
//!
//! Every test drives a real `Pool` (monitor and worker threads included)
//! against in-process factories, so no container runtime is needed.
//!
//! Run with: cargo test --test integration

mod helpers;

mod cleanup;
mod failures;
mod internal_server;
mod replenish;
