use crate::protocol::Arity;
use thiserror::Error;

/// Result type for Yeelight operations
pub type Result<T> = std::result::Result<T, YeelightError>;

/// Errors that can occur when talking to Yeelight bulbs
#[derive(Error, Debug)]
pub enum YeelightError {
    /// Could not open a connection to the bulb
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        /// Address the connection was attempted to
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing the request to the bulb failed
    #[error("Failed to send request: {0}")]
    Write(#[source] std::io::Error),

    /// Reading the reply from the bulb failed
    #[error("Failed to read reply: {0}")]
    Read(#[source] std::io::Error),

    /// Connection was closed before a reply line arrived
    #[error("Connection closed")]
    ConnectionClosed,

    /// Request timed out waiting for response
    #[error("Request timeout")]
    Timeout,

    /// Bulb replied with an error payload
    #[error("Device error {code}: {message}")]
    Device {
        /// Error code reported by the bulb
        code: i64,
        /// Error message reported by the bulb
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reply was valid JSON but did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Color string could not be parsed
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Request carried the wrong number of parameters for its method
    #[error("{method} takes {expected} parameter(s), got {actual}")]
    InvalidParams {
        /// Wire name of the method
        method: &'static str,
        /// Parameter count the method takes
        expected: Arity,
        /// Parameter count the request carried
        actual: usize,
    },

    /// Argument outside of the range the bulb accepts
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Light record has no address to send commands to
    #[error("Light has no address")]
    NoAddress,
}

impl YeelightError {
    /// True when the bulb could not be reached or stopped responding
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            YeelightError::Connect { .. }
                | YeelightError::Write(_)
                | YeelightError::Read(_)
                | YeelightError::ConnectionClosed
                | YeelightError::Timeout
        )
    }

    /// True when the bulb answered with something we could not decode
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            YeelightError::Json(_) | YeelightError::InvalidResponse(_)
        )
    }
}
