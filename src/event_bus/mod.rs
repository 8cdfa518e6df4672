//! Progress event channel for materialization runs.
//!
//! Events emitted by assets during `create` and by the runner around job
//! lifecycle transitions are fire-and-forget observability signals: they feed
//! UI progress bars and logs, and dropping them never affects the outcome of
//! a job.

mod bus;
mod event;
mod sink;

pub use bus::EventBus;
pub use event::{DiagnosticEvent, Event, JobEvent};
pub use sink::{ChannelSink, EventSink, MemorySink, StdOutSink};
