use thiserror::Error;

use crate::http::HttpError;

/// A fetch against the provider failed.
///
/// Callers only learn *that* it failed; the reason is kept for logging and is
/// not meant to be matched on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not load the stock: {reason}")]
pub struct FetchError {
    reason: String,
}

impl FetchError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<HttpError> for FetchError {
    fn from(err: HttpError) -> Self {
        Self::new(err.message())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("unexpected response body: {err}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no company at index {index} (catalog has {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("nothing is selected")]
    NoSelection,
}
