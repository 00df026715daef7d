//! Per-subscriber streaming engine.
//!
//! Every open stream runs three cooperating activities under one child
//! cancellation scope: the receiver (the socket handler itself), a timer task
//! owning the push schedule, and a sender task owning the per-subscriber
//! delta baseline and the socket write half. The receiver validates every
//! request against the configured pulling intervals and the store's key set
//! as snapshotted at session start.

pub mod error;
pub mod server;
pub mod session;
pub mod types;

pub(crate) mod sender;
pub(crate) mod timer;
