use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;

/// Status and raw body of a completed GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, body)
    }

    // the provider only ever answers 200 on success; 204 etc. count as failure
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Transport-level failure: no response was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Transport the fetcher talks to. Implemented with reqwest in production and
/// with canned responses in tests.
pub trait HttpClient: Send + Sync {
    fn get<'a>(&'a self, url: &'a str) -> HttpFuture<'a>;
}

#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("stonks/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::new(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpClient for ReqwestHttpClient {
    fn get<'a>(&'a self, url: &'a str) -> HttpFuture<'a> {
        Box::pin(async move {
            let response = self.client.get(url).send().await.map_err(|e| {
                // reqwest errors carry the full url (token included); drop it
                let e = e.without_url();
                if e.is_timeout() {
                    HttpError::new(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::new(format!("connection failed: {e}"))
                } else {
                    HttpError::new(format!("request failed: {e}"))
                }
            })?;

            // status has to be read before the body consumes the response
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| HttpError::new(format!("failed to read response body: {}", e.without_url())))?;

            Ok(HttpResponse { status, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_200_counts_as_ok() {
        assert!(HttpResponse::ok("{}").is_ok());
        assert!(!HttpResponse::new(204, "").is_ok());
        assert!(!HttpResponse::new(404, "not found").is_ok());
    }

    #[test]
    fn http_error_displays_message() {
        let err = HttpError::new("connection failed: refused");
        assert_eq!(err.to_string(), "connection failed: refused");
        assert_eq!(err.message(), "connection failed: refused");
    }
}
