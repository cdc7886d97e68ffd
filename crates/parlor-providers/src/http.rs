use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::ProviderError;

/// Per-request timeout for every upstream API.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the HTTP client shared by all built-in providers.
///
/// # Errors
///
/// Returns [`ProviderError::HttpClientBuild`] if the TLS backend cannot
/// be initialised.
pub fn client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::HttpClientBuild(e.to_string()))
}

/// GETs `url` and deserializes the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
) -> Result<T, ProviderError> {
    let response = http.get(url).send().await.map_err(|e| ProviderError::Request {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let text = response.text().await.map_err(|e| ProviderError::Request {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| ProviderError::Parse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
