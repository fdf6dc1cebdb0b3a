//! HTTP client for the storefront's product and pricing endpoints.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gemstore_core::{PricingConfig, ProductPricing, SelectionState};
use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::PricingError;
use crate::retry::retry_with_backoff;

/// Everything a price lookup needs to know about the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRequest {
    pub product_id: String,
    pub carat_weight: f64,
    pub selection: SelectionState,
}

/// Source of remote price quotes.
///
/// The controller only sees this trait; [`HttpPriceClient`] is the production
/// implementation and tests substitute scripted lookups.
pub trait PriceLookup: Send + Sync + 'static {
    /// Fetches the raw pricing response for `request`.
    fn lookup_price(
        &self,
        request: &PriceRequest,
    ) -> impl Future<Output = Result<Value, PricingError>> + Send;
}

impl<T: PriceLookup> PriceLookup for Arc<T> {
    fn lookup_price(
        &self,
        request: &PriceRequest,
    ) -> impl Future<Output = Result<Value, PricingError>> + Send {
        (**self).lookup_price(request)
    }
}

/// Client for `GET /products/{id}` and `GET /products/{id}/price/{carat}`.
///
/// Non-2xx responses surface as typed errors. Transient failures (429,
/// timeouts, connection errors, 5xx) are retried with exponential back-off
/// up to `max_retries` additional attempts.
pub struct HttpPriceClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HttpPriceClient {
    /// Creates a client rooted at `base_url` with retries disabled.
    ///
    /// # Errors
    ///
    /// - [`PricingError::Http`] if the underlying `reqwest::Client` cannot be
    ///   constructed.
    /// - [`PricingError::InvalidBaseUrl`] if `base_url` is not an absolute
    ///   `http(s)` URL.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, PricingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()?;

        let invalid = |reason: String| PricingError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason,
        };

        // Trailing slash so path segments are appended under the base path
        // instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("expected an absolute http(s) URL".to_owned()));
        }

        Ok(Self {
            client,
            base_url: parsed,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Creates a client from the loaded pricing configuration.
    ///
    /// # Errors
    ///
    /// See [`HttpPriceClient::new`].
    pub fn from_config(config: &PricingConfig) -> Result<Self, PricingError> {
        Ok(
            Self::new(&config.api_base_url, config.request_timeout_secs, &config.user_agent)?
                .with_retries(config.max_retries, config.retry_backoff_base_ms),
        )
    }

    /// Sets the retry policy: `max_retries` additional attempts, the n-th
    /// waiting roughly `backoff_base_ms * 2^(n-1)` milliseconds.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Fetches the product record and extracts its pricing inputs.
    ///
    /// # Errors
    ///
    /// - [`PricingError::NotFound`] for an unknown product.
    /// - [`PricingError::RateLimited`], [`PricingError::UnexpectedStatus`],
    ///   [`PricingError::Http`] once retries are exhausted.
    /// - [`PricingError::Deserialize`] if the body is not JSON.
    pub async fn fetch_product(&self, product_id: &str) -> Result<ProductPricing, PricingError> {
        let url = self.endpoint_url(&["products", product_id]);
        let record = self
            .get_json(url, format!("product {product_id}"))
            .await?;
        Ok(ProductPricing::from_record(product_id, &record))
    }

    /// Fetches the raw pricing response for one product and carat weight.
    ///
    /// # Errors
    ///
    /// Same as [`HttpPriceClient::fetch_product`].
    pub async fn fetch_price(
        &self,
        product_id: &str,
        carat_weight: f64,
    ) -> Result<Value, PricingError> {
        let carat = format_carat(carat_weight);
        let url = self.endpoint_url(&["products", product_id, "price", &carat]);
        self.get_json(url, format!("price of product {product_id} at {carat}ct"))
            .await
    }

    /// Appends percent-encoded path segments to the base URL.
    pub(crate) fn endpoint_url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        // The base was checked to be a valid base URL in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.to_string()
    }

    async fn get_json(&self, url: String, context: String) -> Result<Value, PricingError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let context = context.clone();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(1);
                    return Err(PricingError::RateLimited { retry_after_secs });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(PricingError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(PricingError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<Value>(&body)
                    .map_err(|e| PricingError::Deserialize { context, source: e })
            }
        })
        .await
    }
}

impl PriceLookup for HttpPriceClient {
    async fn lookup_price(&self, request: &PriceRequest) -> Result<Value, PricingError> {
        self.fetch_price(&request.product_id, request.carat_weight)
            .await
    }
}

/// Renders a carat weight as a path segment: `1.0` → `"1"`, `0.75` → `"0.75"`.
pub(crate) fn format_carat(carat_weight: f64) -> String {
    carat_weight.to_string()
}
