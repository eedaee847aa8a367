use std::sync::Arc;

use bytes::Bytes;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::FetchError;
use crate::http::{HttpClient, HttpError, ReqwestHttpClient};
use crate::schema::{Logo, Quote};

/// Issues the quote and logo requests for a ticker against the provider API.
///
/// Cheap to clone: the transport is shared.
#[derive(Clone)]
pub struct QuoteFetcher {
    client: Arc<dyn HttpClient>,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for QuoteFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteFetcher")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl QuoteFetcher {
    pub fn new(
        client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, HttpError> {
        let timeout = std::time::Duration::from_millis(config.api.timeout_ms);
        let client = ReqwestHttpClient::new(timeout)?;
        Ok(Self::new(
            Arc::new(client),
            config.api.base_url.clone(),
            config.api.token.clone(),
        ))
    }

    // {base}/stock/{ticker}/{endpoint}?token={token}
    fn endpoint(&self, ticker: &str, endpoint: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::new(format!("invalid base url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::new(format!("base url {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(["stock", ticker, endpoint]);
        url.query_pairs_mut().append_pair("token", &self.token);
        Ok(url)
    }

    // GET that must answer 200; the body is returned untouched
    async fn get_ok(&self, url: &str, what: &str) -> Result<Bytes, FetchError> {
        let response = self.client.get(url).await?;
        if !response.is_ok() {
            return Err(FetchError::new(format!(
                "{what} request answered HTTP {}",
                response.status
            )));
        }
        Ok(response.body)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T, FetchError> {
        let body = self.get_ok(url, what).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn fetch_quote(&self, ticker: &str) -> Result<Quote, FetchError> {
        log::debug!("requesting quote for {ticker}");
        let url = self.endpoint(ticker, "quote")?;
        let result = self.get_json::<Quote>(url.as_str(), "quote").await;
        if let Err(e) = &result {
            log::warn!("quote for {ticker} failed: {}", e.reason());
        }
        result
    }

    async fn logo_bytes(&self, ticker: &str) -> Result<Bytes, FetchError> {
        let url = self.endpoint(ticker, "logo")?;
        let logo: Logo = self.get_json(url.as_str(), "logo url").await?;

        let image_url = Url::parse(&logo.url)
            .map_err(|e| FetchError::new(format!("logo url {:?} is not a url: {e}", logo.url)))?;
        log::debug!("requesting logo image for {ticker} from {image_url}");
        self.get_ok(image_url.as_str(), "logo image").await
    }

    /// Two hops: the logo endpoint returns a URL, which is then fetched for the
    /// image bytes. A failure at either hop is an error.
    pub async fn fetch_logo(&self, ticker: &str) -> Result<Bytes, FetchError> {
        log::debug!("requesting logo url for {ticker}");
        let result = self.logo_bytes(ticker).await;
        if let Err(e) = &result {
            log::warn!("logo for {ticker} failed: {}", e.reason());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpFuture, HttpResponse};
    use std::collections::HashMap;
    use std::sync::Mutex;

    // canned responses keyed by exact url; unknown urls are a transport error
    #[derive(Default)]
    struct FakeClient {
        routes: HashMap<String, HttpResponse>,
        seen: Mutex<Vec<String>>,
    }

    impl FakeClient {
        fn route(mut self, url: &str, response: HttpResponse) -> Self {
            self.routes.insert(url.to_string(), response);
            self
        }
    }

    impl HttpClient for FakeClient {
        fn get<'a>(&'a self, url: &'a str) -> HttpFuture<'a> {
            Box::pin(async move {
                self.seen.lock().unwrap().push(url.to_string());
                self.routes
                    .get(url)
                    .cloned()
                    .ok_or_else(|| HttpError::new(format!("connection refused: {url}")))
            })
        }
    }

    const QUOTE_URL: &str = "https://api.test/stable/stock/AAPL/quote?token=t0k";
    const LOGO_URL: &str = "https://api.test/stable/stock/AAPL/logo?token=t0k";

    fn fetcher(client: FakeClient) -> (QuoteFetcher, Arc<FakeClient>) {
        let client = Arc::new(client);
        let fetcher = QuoteFetcher::new(client.clone(), "https://api.test/stable/", "t0k");
        (fetcher, client)
    }

    #[test]
    fn endpoint_urls_match_provider_layout() {
        let (fetcher, _) = fetcher(FakeClient::default());
        assert_eq!(fetcher.endpoint("AAPL", "quote").unwrap().as_str(), QUOTE_URL);
        assert_eq!(fetcher.endpoint("AAPL", "logo").unwrap().as_str(), LOGO_URL);
    }

    #[test]
    fn ticker_stays_a_single_path_segment() {
        let (fetcher, _) = fetcher(FakeClient::default());
        let url = fetcher.endpoint("BRK/B", "quote").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.test/stable/stock/BRK%2FB/quote?token=t0k"
        );
    }

    #[test]
    fn debug_output_hides_token() {
        let (fetcher, _) = fetcher(FakeClient::default());
        assert!(!format!("{fetcher:?}").contains("t0k"));
    }

    #[tokio::test]
    async fn quote_is_parsed_on_200() {
        let (fetcher, _) = fetcher(FakeClient::default().route(
            QUOTE_URL,
            HttpResponse::ok(r#"{"companyName":"Apple Inc.","symbol":"AAPL","latestPrice":150.0,"change":-1.25}"#),
        ));

        let quote = fetcher.fetch_quote("AAPL").await.unwrap();
        assert_eq!(
            quote,
            Quote {
                company_name: String::from("Apple Inc."),
                symbol: String::from("AAPL"),
                price: 150.0,
                change: -1.25,
            }
        );
    }

    #[tokio::test]
    async fn quote_with_valid_body_but_non_200_fails() {
        let (fetcher, _) = fetcher(FakeClient::default().route(
            QUOTE_URL,
            HttpResponse::new(
                201,
                r#"{"companyName":"Apple Inc.","symbol":"AAPL","latestPrice":150.0,"change":-1.25}"#,
            ),
        ));
        assert!(fetcher.fetch_quote("AAPL").await.is_err());
    }

    #[tokio::test]
    async fn malformed_quote_json_fails() {
        let (fetcher, _) =
            fetcher(FakeClient::default().route(QUOTE_URL, HttpResponse::ok("<html>oops</html>")));
        let err = fetcher.fetch_quote("AAPL").await.unwrap_err();
        assert!(err.reason().contains("unexpected response body"));
    }

    #[tokio::test]
    async fn transport_error_fails_quote() {
        let (fetcher, _) = fetcher(FakeClient::default());
        assert!(fetcher.fetch_quote("AAPL").await.is_err());
    }

    #[tokio::test]
    async fn invalid_logo_url_skips_second_hop() {
        let (fetcher, client) = fetcher(
            FakeClient::default().route(LOGO_URL, HttpResponse::ok(r#"{"url":"not a url"}"#)),
        );

        assert!(fetcher.fetch_logo("AAPL").await.is_err());
        assert_eq!(*client.seen.lock().unwrap(), vec![LOGO_URL.to_string()]);
    }

    #[tokio::test]
    async fn logo_first_hop_failure_fails() {
        let (fetcher, client) =
            fetcher(FakeClient::default().route(LOGO_URL, HttpResponse::new(403, "forbidden")));

        assert!(fetcher.fetch_logo("AAPL").await.is_err());
        assert_eq!(client.seen.lock().unwrap().len(), 1);
    }
}
