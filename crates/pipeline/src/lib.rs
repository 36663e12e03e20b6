//! githook dispatch pipeline.
//!
//! - [`DispatchCoordinator`]: decode, resolve, acknowledge, then run the job
//!   and fan its result out to the sinks in the background.
//! - [`RequestHandler`]: the bytes-in/bytes-out contract the transports use.
//! - [`DispatchLog`]: injected destination for the human-readable dispatch
//!   log.

pub mod coordinator;
pub mod handler;
pub mod log;

pub use coordinator::{acknowledgment, DispatchCoordinator, DispatchError, DispatchOutcome, Dispatched};
pub use handler::RequestHandler;
pub use log::{DispatchLog, LogLevel, MemoryLog, TracingLog};
