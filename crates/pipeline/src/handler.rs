//! The contract between transports and the dispatch core.

use std::sync::Arc;

/// One request in, one response out.
///
/// Both the HTTP listener and the relay connector call this with the raw
/// request body and send back whatever it returns. Implementations must
/// return quickly: long-running work belongs on a background task.
pub trait RequestHandler: Send + Sync {
    fn handle(&self, request: &[u8]) -> Vec<u8>;
}

impl<T: RequestHandler + ?Sized> RequestHandler for Arc<T> {
    fn handle(&self, request: &[u8]) -> Vec<u8> {
        (**self).handle(request)
    }
}
