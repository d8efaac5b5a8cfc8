use std::time::Duration;

/// Classification of a failed attempt, inspected by the retry loop.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FailureKind {
    /// Rejected input. Never retried.
    Validation,
    /// Attempt deadline exceeded.
    Timeout,
    /// Service asked the client to back off.
    RateLimited,
    /// Any other error payload returned by the service.
    Service,
    /// Non-success HTTP or page status.
    Status,
    /// Connection or protocol failure below the service.
    Transport,
    /// Response could not be interpreted.
    Decode,
    /// Invalid configuration.
    Config,
    /// Translator was shut down.
    Shutdown,
    /// Background task was aborted or panicked.
    Cancelled,
    /// Blocking call issued from an async context.
    Runtime,
}

impl FailureKind {
    /// Whether a failure of this kind may be followed by another attempt.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Timeout | Self::RateLimited | Self::Transport)
    }
}

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum TranslatorError {
    /// Input rejected before any dispatch.
    #[error("invalid request: {0}")]
    Validation(String),
    /// Attempt did not complete within the configured timeout.
    #[error("timed out after {} ms", .0.as_millis())]
    Timeout(Duration),
    /// Service reported a rate-limit condition.
    #[error("rate limited by service{}", format_service_error(.code, .message))]
    RateLimited {
        /// Service error code, when provided.
        code: Option<i64>,
        /// Service error message, when provided.
        message: Option<String>,
    },
    /// Error payload returned by the translation service.
    #[error("service error{}", format_service_error(.code, .message))]
    Service {
        /// Service error code, when provided.
        code: Option<i64>,
        /// Service error message, when provided.
        message: Option<String>,
    },
    /// Non-success HTTP status code with raw response body.
    #[error("received status code {status}: {body}")]
    Status { status: u16, body: String },
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Http(reqwest::Error),
    /// Failure reported by a browser driver.
    #[error("browser error: {0}")]
    Browser(String),
    /// Response decoding or protocol-shape validation error.
    #[error("decode error: {0}")]
    Decode(String),
    /// Configuration value rejected.
    #[error("configuration error: {0}")]
    Config(String),
    /// The translator no longer accepts or runs work.
    #[error("translator has been shut down")]
    Shutdown,
    /// A spawned translation task ended without producing a result.
    #[error("translation task cancelled: {0}")]
    Cancelled(String),
    /// Runtime misuse, such as blocking inside an async context.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl TranslatorError {
    /// Returns the failure classification used for retry decisions.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::Service { .. } => FailureKind::Service,
            Self::Status { .. } => FailureKind::Status,
            Self::Http(err) if err.is_timeout() => FailureKind::Timeout,
            Self::Http(err) if err.is_decode() => FailureKind::Decode,
            Self::Http(err) if err.is_builder() => FailureKind::Config,
            Self::Http(_) | Self::Browser(_) => FailureKind::Transport,
            Self::Decode(_) => FailureKind::Decode,
            Self::Config(_) => FailureKind::Config,
            Self::Shutdown => FailureKind::Shutdown,
            Self::Cancelled(_) => FailureKind::Cancelled,
            Self::Runtime(_) => FailureKind::Runtime,
        }
    }

    /// Shorthand for `self.kind().is_retryable()`.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

fn format_service_error(code: &Option<i64>, message: &Option<String>) -> String {
    match (code, message) {
        (Some(code), Some(message)) => format!(" {code}: {message}"),
        (Some(code), None) => format!(" {code}"),
        (None, Some(message)) => format!(": {message}"),
        (None, None) => String::new(),
    }
}
