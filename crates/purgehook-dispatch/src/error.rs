use thiserror::Error;

/// Failure of the final delivery attempt.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Webhook responded {status} after {attempts} attempt(s): {body}")]
    Status {
        status: u16,
        body: String,
        attempts: u32,
    },

    #[error("Webhook request failed after {attempts} attempt(s): {message}")]
    Transport { message: String, attempts: u32 },
}

impl DeliveryError {
    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Status { attempts, .. } | Self::Transport { attempts, .. } => *attempts,
        }
    }

    /// HTTP status of the last attempt, if the endpoint answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Error raised by a [`WebhookTransport`](crate::transport::WebhookTransport)
/// when no HTTP response was obtained.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}
