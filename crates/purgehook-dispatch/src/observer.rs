//! Delivery checkpoints for debugging.
//!
//! The delivery engine calls an observer right before each attempt and
//! whenever an attempt fails. Observers only look; they cannot influence
//! whether or how the request is retried.

use tracing::info;

use crate::transport::RenderedRequest;

pub trait DispatchObserver: Send + Sync {
    fn before_send(&self, _request: &RenderedRequest, _attempt: u32) {}

    fn on_error_response(&self, _status: u16, _body: &str, _attempt: u32) {}

    fn on_transport_error(&self, _error: &str, _attempt: u32) {}
}

/// Observer that does nothing; used when debug mode is off.
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}

/// Logs the full request plus a `curl` line that reproduces it.
pub struct DebugObserver;

impl DispatchObserver for DebugObserver {
    fn before_send(&self, request: &RenderedRequest, attempt: u32) {
        info!(
            attempt,
            method = %request.method,
            url = %request.url,
            headers = ?request.headers,
            body = %request.body,
            "Webhook request"
        );
        info!(attempt, command = %curl_command(request), "Equivalent curl command");
    }

    fn on_error_response(&self, status: u16, body: &str, attempt: u32) {
        info!(attempt, status, body, "Webhook error response");
    }

    fn on_transport_error(&self, error: &str, attempt: u32) {
        info!(attempt, error, "Webhook transport error");
    }
}

/// Rebuild the request as a shell command.
///
/// The body is omitted for GET and HEAD even though it is still sent.
pub fn curl_command(request: &RenderedRequest) -> String {
    let mut command = format!(
        "curl -X {} {}",
        request.method,
        shell_quote(&request.url)
    );
    for (name, value) in &request.headers {
        command.push_str(" -H ");
        command.push_str(&shell_quote(&format!("{name}: {value}")));
    }
    if !matches!(request.method.as_str(), "GET" | "HEAD") {
        command.push_str(" -d ");
        command.push_str(&shell_quote(&request.body));
    }
    command
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
