//! githook core domain.
//!
//! Pure building blocks of the dispatch pipeline with no network I/O:
//!
//! - [`webhook`]: decode the repository name from a webhook delivery.
//! - [`config`]: job registry and sink settings, reloaded per dispatch.
//! - [`resolver`]: map a repository to a [`resolver::CommandSpec`].
//! - [`scripting`]: run a command and capture an
//!   [`scripting::ExecutionResult`].
//! - [`error`]: the error taxonomy shared by every crate.

pub mod config;
pub mod error;
pub mod resolver;
pub mod scripting;
pub mod webhook;
