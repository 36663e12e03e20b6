//! githook result sinks.
//!
//! - [`LogSink`]: the capability every destination implements.
//! - [`delivery`]: object store and email sinks.
//! - [`SinkProvider`] / [`ConfiguredSinks`]: build the sinks for a dispatch
//!   from its configuration.
//! - [`report`]: plain-text rendering shared by the sinks.

pub mod delivery;
pub mod provider;
pub mod report;
pub mod sink;

pub use delivery::email::{EmailError, EmailSink};
pub use delivery::object_store::ObjectStoreSink;
pub use provider::{ConfiguredSinks, SinkProvider};
pub use sink::{JobReport, LogSink, SinkError, SinkKind};
