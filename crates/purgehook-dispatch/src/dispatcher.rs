use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::config::DispatchConfig;
use crate::debounce::DebounceGate;
use crate::delivery::{DeliveryEngine, DeliveryReport};
use crate::error::DispatchError;
use crate::intent::{InvalidationIntent, interpret};
use crate::observer::{DebugObserver, DispatchObserver, NoopObserver};
use crate::templates::TemplateRenderer;
use crate::transport::{HttpTransport, RenderedRequest, WebhookTransport};

/// Turns cache-invalidation signals into webhook calls.
///
/// Cloning is cheap and every clone shares the same pending timer.
#[derive(Clone)]
pub struct InvalidationDispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    config: DispatchConfig,
    renderer: TemplateRenderer,
    engine: DeliveryEngine,
    gate: DebounceGate,
}

impl InvalidationDispatcher {
    /// Build a dispatcher that delivers over HTTP.
    pub fn new(config: DispatchConfig) -> Result<Self, DispatchError> {
        let transport = match config.request_timeout_ms {
            Some(ms) => HttpTransport::with_timeout(std::time::Duration::from_millis(ms))
                .map_err(|e| DispatchError::InvalidConfig(e.to_string()))?,
            None => HttpTransport::new(),
        };
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(
        config: DispatchConfig,
        transport: Arc<dyn WebhookTransport>,
    ) -> Result<Self, DispatchError> {
        let observer: Arc<dyn DispatchObserver> = if config.debug {
            Arc::new(DebugObserver)
        } else {
            Arc::new(NoopObserver)
        };
        Self::with_parts(config, transport, observer)
    }

    pub fn with_parts(
        config: DispatchConfig,
        transport: Arc<dyn WebhookTransport>,
        observer: Arc<dyn DispatchObserver>,
    ) -> Result<Self, DispatchError> {
        config.validate()?;

        let renderer = TemplateRenderer::from_config(&config);
        let engine = DeliveryEngine::new(transport, config.attempts(), config.retry_delay())
            .with_observer(observer);
        let gate = DebounceGate::new(config.debounce_window());

        info!(
            webhook_url = %config.webhook_url,
            method = %config.method(),
            attempts = config.attempts(),
            retry_delay_ms = config.retry_delay_ms,
            debounce_ms = config.debounce_ms,
            debug = config.debug,
            "Invalidation dispatcher configured"
        );

        Ok(Self {
            inner: Arc::new(DispatcherInner {
                config,
                renderer,
                engine,
                gate,
            }),
        })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.inner.config
    }

    /// Queue a dispatch for `pattern`, replacing any not-yet-fired one.
    ///
    /// Returns immediately. The outcome is only reported through logs.
    pub fn schedule(&self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        info!(
            pattern = %pattern,
            debounce_ms = self.inner.config.debounce_ms,
            "Invalidation scheduled"
        );

        let dispatcher = self.clone();
        self.inner.gate.schedule(pattern, move |pattern| async move {
            if let Err(e) = dispatcher.dispatch(&pattern).await {
                error!(pattern = %pattern, error = %e, "Invalidation webhook failed");
            }
        });
    }

    pub fn has_pending(&self) -> bool {
        self.inner.gate.has_pending()
    }

    pub fn cancel_pending(&self) -> bool {
        self.inner.gate.cancel()
    }

    pub fn interpret(&self, pattern: &str) -> InvalidationIntent {
        interpret(pattern, self.inner.config.base_url())
    }

    /// Interpret and template `pattern` without sending anything.
    pub fn render(&self, pattern: &str) -> RenderedRequest {
        let intent = self.interpret(pattern);
        self.render_intent(&intent)
    }

    fn render_intent(&self, intent: &InvalidationIntent) -> RenderedRequest {
        let config = &self.inner.config;
        self.inner
            .renderer
            .render(&config.method(), &config.webhook_url, intent)
    }

    /// Run the post-debounce pipeline for `pattern` right away.
    pub async fn dispatch(&self, pattern: &str) -> Result<DeliveryReport, DispatchError> {
        let started = Instant::now();
        let intent = self.interpret(pattern);
        let request = self.render_intent(&intent);

        let result = self.inner.engine.deliver(&request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(report) => info!(
                pattern = %intent.pattern,
                purge_all = intent.purge_all,
                urls = intent.urls.len(),
                attempts = report.attempts,
                status = report.status,
                elapsed_ms,
                "Invalidation webhook delivered"
            ),
            Err(e) => warn!(
                pattern = %intent.pattern,
                attempts = e.attempts(),
                elapsed_ms,
                "Invalidation webhook gave up"
            ),
        }

        result.map_err(DispatchError::from)
    }
}
