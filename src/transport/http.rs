use super::{RawResponse, SearchTransport, TransportError};
use crate::config::SearchConfig;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use base64::Engine as _;
use bytes::Bytes;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use tracing::warn;

/// reqwest-backed transport for `POST {endpoint}/{index}/_search`.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    authorization: HeaderValue,
}

impl HttpTransport {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(config.max_concurrent.max(1))
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            Error::configuration_with_context(
                format!("failed to build HTTP client: {}", e),
                ErrorContext::new().with_component("http_transport"),
            )
        })?;

        Ok(Self {
            client,
            url: config.search_url(),
            authorization: Self::basic_authorization(&config.username, &config.password)?,
        })
    }

    /// `Basic base64(user:password)`, marked sensitive so it never shows up in debug output.
    fn basic_authorization(username: &str, password: &str) -> Result<HeaderValue> {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username, password));
        let mut value = HeaderValue::from_str(&format!("Basic {}", encoded)).map_err(|_| {
            Error::configuration_with_context(
                "credentials produce an invalid Authorization header",
                ErrorContext::new()
                    .with_setting("ES_USER")
                    .with_component("http_transport"),
            )
        })?;
        value.set_sensitive(true);
        Ok(value)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SearchTransport for HttpTransport {
    async fn post_search(
        &self,
        query: &serde_json::Value,
        request_id: &str,
    ) -> std::result::Result<RawResponse, TransportError> {
        let resp = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, self.authorization.clone())
            // Our own correlation id; the backend may ignore it.
            .header("x-request-id", request_id)
            .json(query)
            .send()
            .await?;

        let status = resp.status().as_u16();
        // The status arrived, so this is a response even if the body is cut
        // short. An empty body fails decoding like any other unreadable one.
        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(http_status = status, error = %e, "failed to read response body");
                Bytes::new()
            }
        };
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_authorization_encoding() {
        let value = HttpTransport::basic_authorization("elastic", "changeme").unwrap();
        assert_eq!(value.to_str().unwrap(), "Basic ZWxhc3RpYzpjaGFuZ2VtZQ==");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_url_built_from_config() {
        let config = SearchConfig::new("http://localhost:9200/", "reviews", "u", "p").unwrap();
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.url(), "http://localhost:9200/reviews/_search");
    }
}
