use thiserror::Error;

/// Library result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when using the Evolution API client.
#[derive(Error, Debug)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("request failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: LastFailure },

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("webhook: {0}")]
    Webhook(#[from] WebhookError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("client closed")]
    Closed,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Configuration errors. Raised at construction time.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("http client: {0}")]
    HttpClient(String),
}

/// Network-level failures reported by a [Transport](crate::Transport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("timeout")]
    Timeout,

    #[error("connect: {0}")]
    Connect(String),

    #[error("request: {0}")]
    Request(String),

    #[error("invalid request: {0}")]
    Invalid(String),
}

impl TransportError {
    /// Whether a retry may succeed (everything except a malformed request).
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_builder() {
            Self::Invalid(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// The failure observed on the last attempt of an exhausted retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastFailure {
    /// Transient HTTP status (429 or 5xx).
    Status { status: u16, body: String },
    Transport(TransportError),
}

impl std::fmt::Display for LastFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, .. } => write!(f, "status {}", status),
            Self::Transport(e) => write!(f, "{}", e),
        }
    }
}

/// Inbound webhook errors. Payload problems are never errors; see
/// [WebhookEvent::Raw](crate::events::WebhookEvent::Raw).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing signature")]
    MissingSignature,

    #[error("invalid signature")]
    InvalidSignature,
}
