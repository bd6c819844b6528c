use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::DeliveryError;
use crate::observer::{DispatchObserver, NoopObserver};
use crate::transport::{RenderedRequest, WebhookTransport};

/// Outcome of a successful delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempts: u32,
    pub status: u16,
}

/// Sends a rendered request with a fixed number of attempts and a fixed
/// pause between them.
pub struct DeliveryEngine {
    transport: Arc<dyn WebhookTransport>,
    observer: Arc<dyn DispatchObserver>,
    attempts: u32,
    retry_delay: Duration,
}

impl DeliveryEngine {
    pub fn new(transport: Arc<dyn WebhookTransport>, attempts: u32, retry_delay: Duration) -> Self {
        Self {
            transport,
            observer: Arc::new(NoopObserver),
            attempts: attempts.max(1),
            retry_delay,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub async fn deliver(&self, request: &RenderedRequest) -> Result<DeliveryReport, DeliveryError> {
        let mut attempt = 1;

        loop {
            self.observer.before_send(request, attempt);

            let failure = match self.transport.send(request).await {
                Ok(response) if response.is_success() => {
                    debug!(attempt, status = response.status, "Webhook accepted");
                    return Ok(DeliveryReport {
                        attempts: attempt,
                        status: response.status,
                    });
                }
                Ok(response) => {
                    self.observer
                        .on_error_response(response.status, &response.body, attempt);
                    DeliveryError::Status {
                        status: response.status,
                        body: response.body,
                        attempts: attempt,
                    }
                }
                Err(e) => {
                    self.observer.on_transport_error(&e.0, attempt);
                    DeliveryError::Transport {
                        message: e.0,
                        attempts: attempt,
                    }
                }
            };

            if attempt >= self.attempts {
                return Err(failure);
            }

            warn!(
                attempt,
                max_attempts = self.attempts,
                retry_in_ms = self.retry_delay.as_millis() as u64,
                error = %failure,
                "Webhook attempt failed, retrying"
            );
            tokio::time::sleep(self.retry_delay).await;
            attempt += 1;
        }
    }
}
