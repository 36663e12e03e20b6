//! Concrete result sinks.
//!
//! - [`object_store`] archives reports in S3-compatible storage.
//! - [`email`] notifies recipients over SMTP.

pub mod email;
pub mod object_store;
