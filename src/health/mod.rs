//! Health probes over a [`PoolStatus`](crate::pool::PoolStatus) snapshot.
//!
//! | Probe     | Endpoint          | Checks                                         | On failure  |
//! |-----------|-------------------|------------------------------------------------|-------------|
//! | liveness  | `/health/live`    | `monitor_running`                              | `unhealthy` |
//! | readiness | `/health/ready`   | `monitor_running`, `containers_ready`, `error_throttle` (warn only) | `not_ready` |
//! | startup   | `/health/startup` | `first_container` (latched)                    | `not_ready` |
//!
//! A healthy answer is served with 200 and carries pool details; anything
//! else is served with 503.

mod checker;
mod status;

pub use checker::HealthChecker;
pub use status::{CheckResult, HealthDetails, HealthStatus, Outcome, ProbeType, Verdict};
