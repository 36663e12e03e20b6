//! githook transports: the HTTP listener, the relay connector and the
//! process configuration that picks between them.

pub mod config;
pub mod relay;
pub mod router;
pub mod routes;
pub mod shutdown;
pub mod state;
