//! Cache-invalidation webhook dispatch.
//!
//! A signal such as `"/$/"` or `"/about, /tag/news"` goes through a debounce
//! gate, is interpreted into an [`InvalidationIntent`], rendered from the
//! configured body and header templates and delivered with a bounded number
//! of attempts.

pub mod config;
pub mod debounce;
pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod intent;
pub mod observer;
pub mod templates;
pub mod transport;

pub use config::{DEFAULT_BODY_TEMPLATE, DEFAULT_DEBOUNCE_MS, DispatchConfig};
pub use debounce::DebounceGate;
pub use delivery::{DeliveryEngine, DeliveryReport};
pub use dispatcher::InvalidationDispatcher;
pub use error::{DeliveryError, DispatchError, TransportError};
pub use intent::{InvalidationIntent, PURGE_ALL_SENTINELS, interpret, iso_timestamp};
pub use observer::{DebugObserver, DispatchObserver, NoopObserver, curl_command};
pub use templates::{Placeholder, TemplateRenderer};
pub use transport::{HttpTransport, RenderedRequest, TransportResponse, WebhookTransport};
