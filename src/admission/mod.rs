//! Request admission logic and per-client state management.

mod bucket;
mod gate;
mod registry;
mod sweeper;

pub use bucket::{BucketPolicy, TokenBucket};
pub use gate::{AdmissionGate, Decision};
pub use registry::{ClientRecord, ClientRegistry};
pub use sweeper::{Sweeper, DEFAULT_IDLE_TIMEOUT, DEFAULT_SWEEP_INTERVAL};
