//! Internal HTTP surface of the daemon.
//!
//! Only the operational endpoints live here; the pool itself is a library
//! type and does not depend on this module.
//!
//! | Path | Response |
//! |------|----------|
//! | `/health` | JSON summary |
//! | `/health/live`, `/health/ready`, `/health/startup` | probe JSON, 200 or 503 |
//! | `/metrics` | Prometheus text |
//! | `/status` | pool snapshot |
//! | `/config` | effective configuration |
//! | `POST /lease?timeout=5s` | `{"name": ...}` of a container taken from the pool |

mod internal;

pub use internal::{
    handle_internal_request, run_internal_server, serve, InternalState, PoolHandle,
};
