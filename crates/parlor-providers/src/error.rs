//! Error types for provider fetches.

/// Errors a single provider fetch can produce.
///
/// These never escape the pipelines in [`crate::WordPicker`] and
/// [`crate::CharacterPool`]; they are logged and replaced by a fallback.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The shared HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The upstream API answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// The response body did not have the expected shape.
    #[error("response from {url} could not be parsed: {reason}")]
    Parse { url: String, reason: String },
}
