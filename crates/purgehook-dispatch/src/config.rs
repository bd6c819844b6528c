use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Quiescence window applied by the debounce gate.
pub const DEFAULT_DEBOUNCE_MS: u64 = 10_000;

pub const DEFAULT_BODY_TEMPLATE: &str =
    r#"{"urls": ${urls}, "timestamp": "${timestamp}", "purgeAll": ${purgeAll}}"#;

/// Webhook dispatch configuration.
///
/// Read once at construction and shared by every dispatch cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Endpoint notified on invalidation
    pub webhook_url: String,

    #[serde(default = "default_method")]
    pub method: String,

    /// Substituted for `${secret}` in header templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Header name -> template, sent in this order
    #[serde(default)]
    pub headers: IndexMap<String, String>,

    #[serde(default = "default_body_template")]
    pub body_template: String,

    /// Total attempts per dispatch (values below 1 behave as 1)
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Fixed delay between attempts
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default)]
    pub debug: bool,

    /// Public base URL of the site, prefixed to every invalidated path
    pub public_url: String,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Per-attempt timeout enforced by the HTTP client; unset means none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_body_template() -> String {
    DEFAULT_BODY_TEMPLATE.to_string()
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl DispatchConfig {
    pub fn new(webhook_url: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            method: default_method(),
            secret: None,
            headers: IndexMap::new(),
            body_template: default_body_template(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            debug: false,
            public_url: public_url.into(),
            debounce_ms: default_debounce_ms(),
            request_timeout_ms: None,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.headers.insert(name.into(), template.into());
        self
    }

    pub fn with_body_template(mut self, template: impl Into<String>) -> Self {
        self.body_template = template.into();
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_retries(mut self, count: u32, delay_ms: u64) -> Self {
        self.retry_count = count;
        self.retry_delay_ms = delay_ms;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.webhook_url.trim().is_empty() {
            return Err(DispatchError::InvalidConfig(
                "webhook_url must not be empty".into(),
            ));
        }
        url::Url::parse(&self.webhook_url).map_err(|e| {
            DispatchError::InvalidConfig(format!("webhook_url is not a valid URL: {e}"))
        })?;
        reqwest::Method::from_bytes(self.method.to_ascii_uppercase().as_bytes()).map_err(|_| {
            DispatchError::InvalidConfig(format!("method `{}` is not a valid HTTP method", self.method))
        })?;
        Ok(())
    }

    /// Attempts per dispatch, never less than one.
    pub fn attempts(&self) -> u32 {
        self.retry_count.max(1)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Upper-cased HTTP method.
    pub fn method(&self) -> String {
        self.method.to_ascii_uppercase()
    }

    /// Public URL exactly as configured; paths are appended to it verbatim.
    pub fn base_url(&self) -> &str {
        &self.public_url
    }
}
