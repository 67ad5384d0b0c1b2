use std::time::Duration;
use thiserror::Error;

/// Failure of a remote provider call (detection, translation or image search).
///
/// None of these reach the chat user. Callers log them and degrade: a failed
/// detection drops the reply, a failed translation drops one language, a
/// failed search drops the image.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("provider returned no result: {0}")]
    Empty(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    pub fn empty(what: impl Into<String>) -> Self {
        Self::Empty(what.into())
    }

    /// Turn a non-2xx response into an `Api` error, passing 2xx through.
    pub async fn check(response: reqwest::Response) -> Result<reqwest::Response, Self> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
        Err(Self::Api {
            status: status.as_u16(),
            body,
        })
    }
}
