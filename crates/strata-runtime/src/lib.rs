//! Mesh worker pool: message types, the per-worker state machine and routing.
#![forbid(unsafe_code)]

mod messages;
mod pool;
mod worker;

pub use messages::{FromWorker, ToWorker};
pub use pool::{PoolConfig, WorkerPool, route_section};
pub use worker::WorkerUnit;
