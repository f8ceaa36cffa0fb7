//! Runtime core for Scribe.
//!
//! This crate sequences the editor once it is bootstrapped:
//! - `InputPoller` - reads terminal events on a dedicated thread
//! - `Sources` - readiness multiplexer over every event source
//! - `Router` - renders, waits and dispatches one event per iteration
//! - `shutdown` - buffer finalization and terminal teardown per exit path
//! - `Runtime` - main entry point combining the pieces above
//!
//! # Key Concepts
//!
//! ## One event in flight
//!
//! The poller hands events over through a queue of capacity one. It blocks
//! until the router has taken the previous event, which is the only
//! backpressure in the system.
//!
//! ## Fairness
//!
//! Sources are polled in a fixed order starting after the one dispatched
//! last. No source can starve another, and a burst of redraw requests costs
//! exactly one extra render.
//!
//! ## Mutation lock
//!
//! Every dispatch that touches the session holds the `MutationLock`. The
//! crash boundary keeps a clone so it can back up buffers after a panic.

pub mod config;
pub mod error;
pub mod event;
pub mod frontend;
pub mod lock;
pub mod poller;
pub mod router;
pub mod runtime;
pub mod shutdown;
pub mod signals;
pub mod sources;

pub use config::RuntimeConfig;
pub use error::{panic_message, FaultSender, Result, RuntimeError, ThreadFault};
pub use event::{Event, EventError, SignalKind};
pub use frontend::Frontend;
pub use lock::{MutationLock, ScreenLock};
pub use poller::{EventSource, InputPoller};
pub use router::Router;
pub use runtime::Runtime;
pub use shutdown::{Shutdown, ShutdownReason};
pub use sources::{channels, Ready, Receivers, Senders, SourceKind, Sources};
