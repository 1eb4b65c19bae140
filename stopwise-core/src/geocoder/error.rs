use thiserror::Error;

/// Errors from [`crate::geocoder::Geocoder::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    /// The lookup did not complete in time.
    #[error("geocoding {target} timed out after {timeout_ms}ms")]
    Timeout {
        /// Endpoint or address text that timed out.
        target: String,
        /// Configured time limit in milliseconds.
        timeout_ms: u64,
    },
    /// The provider answered with a non-success HTTP status.
    #[error("geocoding request to {url} failed with HTTP {status}: {message}")]
    HttpError {
        /// Endpoint that was queried, without credentials.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error detail from the HTTP client.
        message: String,
    },
    /// The provider could not be reached.
    #[error("geocoding request to {url} failed: {message}")]
    NetworkError {
        /// Endpoint that was queried, without credentials.
        url: String,
        /// Error detail from the HTTP client.
        message: String,
    },
    /// The provider reported a failure status in its payload.
    #[error("geocoding provider returned {status}: {message}")]
    ProviderStatus {
        /// Status string reported by the provider.
        status: String,
        /// Optional explanation from the provider.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse geocoding response: {message}")]
    ParseError {
        /// Decoder error detail.
        message: String,
    },
}
