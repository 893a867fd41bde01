use thiserror::Error;

/// Failures the network gateway can report. Every request resolves to exactly
/// one of these; there are no retries, so a variant describes the single
/// attempt that was made.
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    /// The request could not be built (malformed URL, body encoding failure).
    /// Nothing was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The server answered with a status outside 2xx. `message` carries the
    /// server's own `{"message": ...}` payload when one was present, e.g. an
    /// invalid-OTP rejection.
    #[error("HTTP error: {status}")]
    Http { status: u16, message: Option<String> },

    /// The 2xx body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decoding(String),

    /// Connectivity-level failure (DNS, connect, timeout).
    #[error("Network unavailable: {0}")]
    Transport(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl NetworkError {
    /// The single user-facing string a flow surfaces for this failure.
    /// Server-provided messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            NetworkError::Http {
                message: Some(message),
                ..
            } => message.clone(),
            NetworkError::Http { status, .. } => {
                format!("The server returned an error ({status}). Please try again.")
            }
            NetworkError::Decoding(_) => {
                "Received an unexpected response from the server.".to_string()
            }
            NetworkError::Transport(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            NetworkError::InvalidRequest(_) => "Could not build the request.".to_string(),
            NetworkError::Unknown(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConnectError {
    /// Bad input caught before any network call. Never leaves the device.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<ConnectError> for String {
    fn from(err: ConnectError) -> Self {
        err.to_string()
    }
}
