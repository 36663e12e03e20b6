//! Post-transport cleanup shared by both listeners.

use std::time::Duration;

use githook_pipeline::DispatchCoordinator;

/// Wait up to `grace` for jobs the coordinator is still running.
///
/// Called however the transport ended, so that a lost relay or a failed
/// server still lets running jobs reach their sinks. Returns `false` when the
/// grace period elapsed first.
pub async fn drain(coordinator: &DispatchCoordinator, grace: Duration) -> bool {
    let in_flight = coordinator.in_flight();
    tracing::info!(in_flight, "Stopped accepting requests, waiting for running jobs");

    if coordinator.shutdown(grace).await {
        tracing::info!("Graceful shutdown complete");
        true
    } else {
        tracing::warn!(
            remaining = coordinator.in_flight(),
            "Shutdown grace period elapsed with jobs still running"
        );
        false
    }
}
