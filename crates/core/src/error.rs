/// Result alias that carries the custom [`ScrubError`] type.
pub type Result<T> = std::result::Result<T, ScrubError>;

/// Common error type for the core crate.
///
/// Runtime invariant violations (zero-width containers, out-of-range times)
/// are clamped rather than reported; these variants cover rejected input.
#[derive(Debug, thiserror::Error)]
pub enum ScrubError {
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// A configuration value failed validation.
    #[error("invalid timeline config: {0}")]
    InvalidConfig(String),
    /// An action referenced an event id that is not loaded.
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Session or config JSON could not be parsed.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl ScrubError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<&str> for ScrubError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ScrubError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
