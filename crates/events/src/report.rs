//! Plain-text rendering of job results.

use githook_core::scripting::ExecutionResult;

/// Subject line for a finished job.
pub fn subject_line(result: &ExecutionResult) -> String {
    if result.succeeded() {
        format!("Build passed for: {}", result.job_label)
    } else {
        format!("Build FAILED for: {}", result.job_label)
    }
}

/// Full text summary: status, timing, error, stdout and stderr.
pub fn render_summary(result: &ExecutionResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Job: {}\n", result.job_label));
    out.push_str(&format!("Status: {}\n", result.status));
    out.push_str(&format!("Started: {}\n", result.started_at.to_rfc3339()));
    out.push_str(&format!("Duration: {}ms\n", result.duration.as_millis()));
    if let Some(error) = &result.error {
        out.push_str(&format!("Error: {error}\n"));
    }
    out.push_str("\n--- stdout ---\n");
    out.push_str(&result.stdout_lossy());
    out.push_str("\n--- stderr ---\n");
    out.push_str(&result.stderr_lossy());
    out.push('\n');
    out
}

/// Email body: link to the archived log (when there is one) then the summary.
pub fn render_email_body(result: &ExecutionResult, artifact_url: Option<&str>) -> String {
    match artifact_url.filter(|url| !url.is_empty()) {
        Some(url) => format!("Full log: {url}\n\n{}", render_summary(result)),
        None => render_summary(result),
    }
}
