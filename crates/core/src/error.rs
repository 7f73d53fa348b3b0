/// Result alias that carries the custom [`CubeVizError`] type.
pub type Result<T> = std::result::Result<T, CubeVizError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum CubeVizError {
    /// A facelet string was not exactly 54 recognised symbols.
    #[error("invalid facelet string: {0}")]
    InvalidFacelets(String),
    /// A camera frame buffer did not match its declared dimensions.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    /// A face cell index outside `0..9`.
    #[error("cell index {0} is outside the 3x3 face")]
    InvalidCell(usize),
    /// A scan action was requested in a state that does not allow it.
    #[error("`{action}` is not allowed while the scanner is {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
    /// An external collaborator (decode or solve service) failed.
    #[error("{service} service failed: {reason}")]
    Service {
        service: &'static str,
        reason: String,
    },
    /// Configuration could not be parsed.
    #[error("{0}")]
    Config(#[from] serde_json::Error),
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl CubeVizError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn service(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Service {
            service,
            reason: reason.into(),
        }
    }
}

impl From<&str> for CubeVizError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for CubeVizError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
