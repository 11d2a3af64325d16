use thiserror::Error;

/// Why a single object fetch attempt was discarded. Attempts are retried
/// with a fresh random id; none of these abort the retry loop.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// Network or body-decode failure from the HTTP client.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Non-success response status for the requested object id.
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    /// The record decoded fine but carries no primary image URL at all.
    #[error("record has no primary image url")]
    NoImage,
}
