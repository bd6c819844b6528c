use indexmap::IndexMap;
use serde_json::Value;

use crate::config::DispatchConfig;
use crate::intent::InvalidationIntent;
use crate::transport::RenderedRequest;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Variables recognized inside `${...}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Urls,
    PurgeAll,
    Timestamp,
    Pattern,
    Secret,
}

impl Placeholder {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "urls" => Some(Self::Urls),
            "purgeAll" => Some(Self::PurgeAll),
            "timestamp" => Some(Self::Timestamp),
            "pattern" => Some(Self::Pattern),
            "secret" => Some(Self::Secret),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Urls => "urls",
            Self::PurgeAll => "purgeAll",
            Self::Timestamp => "timestamp",
            Self::Pattern => "pattern",
            Self::Secret => "secret",
        }
    }
}

/// Renders the webhook body and headers from the dispatch configuration.
///
/// Substitution is a single left-to-right scan. Replacement text is never
/// rescanned, and `${...}` sequences that are not a known placeholder (or
/// that the current pass does not handle) are copied through untouched.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    body: String,
    headers: IndexMap<String, String>,
    secret: Option<String>,
}

impl TemplateRenderer {
    pub fn new(
        body: impl Into<String>,
        headers: IndexMap<String, String>,
        secret: Option<String>,
    ) -> Self {
        Self {
            body: body.into(),
            headers,
            secret,
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(
            config.body_template.clone(),
            config.headers.clone(),
            config.secret.clone(),
        )
    }

    /// Body with `${urls}`, `${purgeAll}`, `${timestamp}` and `${pattern}` filled in.
    pub fn render_body(&self, intent: &InvalidationIntent) -> String {
        render_string(&self.body, |placeholder| match placeholder {
            Placeholder::Urls => Some(Value::from(intent.urls.clone()).to_string()),
            Placeholder::PurgeAll => Some(intent.purge_all.to_string()),
            Placeholder::Timestamp => Some(intent.timestamp.clone()),
            Placeholder::Pattern => Some(Value::from(intent.pattern.as_str()).to_string()),
            Placeholder::Secret => None,
        })
    }

    /// Default JSON content type followed by the configured headers with
    /// `${secret}` filled in. A configured header replaces the default one
    /// when the names match case-insensitively.
    pub fn render_headers(&self) -> Vec<(String, String)> {
        let secret = self.secret.as_deref().unwrap_or_default();
        let overrides_content_type = self
            .headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE));

        let mut rendered = Vec::with_capacity(self.headers.len() + 1);
        if !overrides_content_type {
            rendered.push((CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string()));
        }
        for (name, template) in &self.headers {
            let value = render_string(template, |placeholder| match placeholder {
                Placeholder::Secret => Some(secret.to_string()),
                _ => None,
            });
            rendered.push((name.clone(), value));
        }
        rendered
    }

    pub fn render(
        &self,
        method: &str,
        url: &str,
        intent: &InvalidationIntent,
    ) -> RenderedRequest {
        RenderedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: self.render_headers(),
            body: self.render_body(intent),
        }
    }
}

fn render_string(template: &str, resolve: impl Fn(Placeholder) -> Option<String>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };

        let name = &after_open[..end];
        match Placeholder::from_name(name).and_then(&resolve) {
            Some(value) => {
                result.push_str(&value);
                rest = &after_open[end + 1..];
            }
            None => {
                // Keep the `${` and resume inside the span, it may hold a real placeholder
                result.push_str("${");
                rest = after_open;
            }
        }
    }

    result.push_str(rest);
    result
}
