//! Search client configuration.
//!
//! Everything the executor needs is resolved once into a [`SearchConfig`] and
//! handed to the builder; nothing reads the environment after that. Use
//! [`SearchConfig::from_env`] in binaries and [`SearchConfig::from_lookup`] in
//! tests, where a plain map stands in for the environment.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `ES_ENDPOINT` | `endpoint` | required |
//! | `ES_INDEX` | `index` | required |
//! | `ES_USER` | `username` | required |
//! | `ES_PASSWORD` | `password` | required |
//! | `ES_DEBUG` | `debug` | `false` |
//! | `ES_MAX_CONCURRENT` | `max_concurrent` | `2` |
//! | `ES_MAX_RETRIES` | `max_retries` | `5` |
//! | `ES_BASE_DELAY_MS` | `base_delay` | `500` |
//! | `ES_STRICT_STATUS` | `strict_status` | `false` |
//! | `ES_HTTP_TIMEOUT_SECS` | `http_timeout` | none |

use crate::{Error, ErrorContext, Result};
use std::fmt;
use std::time::Duration;
use url::Url;

pub const DEFAULT_MAX_CONCURRENT: usize = 2;
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct SearchConfig {
    /// Search backend base URL, without the index path.
    pub endpoint: Url,
    pub index: String,
    pub username: String,
    pub password: String,
    /// Emit per-attempt debug events.
    pub debug: bool,
    /// Maximum number of in-flight search calls.
    pub max_concurrent: usize,
    /// Retries after the first attempt; a call makes at most `max_retries + 1` attempts.
    pub max_retries: u32,
    /// Backoff base; attempt `i` waits around `base_delay * 2^i`.
    pub base_delay: Duration,
    /// Never return a non-2xx body as a result, always surface a typed error.
    pub strict_status: bool,
    /// Optional per-attempt HTTP timeout. A timeout counts as a transport failure.
    pub http_timeout: Option<Duration>,
}

impl SearchConfig {
    /// Create a config with default limits.
    pub fn new(
        endpoint: &str,
        index: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let index = index.into();
        if index.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "index name must not be empty",
                ErrorContext::new()
                    .with_setting("index")
                    .with_component("config"),
            ));
        }
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            index,
            username: username.into(),
            password: password.into(),
            debug: false,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            strict_status: false,
            http_timeout: None,
        })
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, map, secrets store).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
                Error::configuration_with_context(
                    format!("missing required setting {}", key),
                    ErrorContext::new()
                        .with_setting(key)
                        .with_component("config"),
                )
            })
        };

        let mut config = Self::new(
            &required("ES_ENDPOINT")?,
            required("ES_INDEX")?,
            required("ES_USER")?,
            required("ES_PASSWORD")?,
        )?;

        config.debug = parse_flag(lookup("ES_DEBUG"));
        config.strict_status = parse_flag(lookup("ES_STRICT_STATUS"));
        if let Some(n) = parse_number::<usize>(&lookup, "ES_MAX_CONCURRENT")? {
            config = config.with_max_concurrent(n)?;
        }
        if let Some(n) = parse_number::<u32>(&lookup, "ES_MAX_RETRIES")? {
            config.max_retries = n;
        }
        if let Some(ms) = parse_number::<u64>(&lookup, "ES_BASE_DELAY_MS")? {
            config.base_delay = Duration::from_millis(ms);
        }
        config.http_timeout = parse_number::<u64>(&lookup, "ES_HTTP_TIMEOUT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(config)
    }

    pub fn with_max_concurrent(mut self, n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::configuration_with_context(
                "concurrency capacity must be at least 1",
                ErrorContext::new()
                    .with_setting("max_concurrent")
                    .with_component("config"),
            ));
        }
        self.max_concurrent = n;
        Ok(self)
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_debug(mut self, enable: bool) -> Self {
        self.debug = enable;
        self
    }

    pub fn with_strict_status(mut self, enable: bool) -> Self {
        self.strict_status = enable;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// `{endpoint}/{index}/_search`
    pub fn search_url(&self) -> String {
        format!(
            "{}/{}/_search",
            self.endpoint.as_str().trim_end_matches('/'),
            self.index
        )
    }
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("index", &self.index)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("debug", &self.debug)
            .field("max_concurrent", &self.max_concurrent)
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("strict_status", &self.strict_status)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid search endpoint: {}", e),
            ErrorContext::new()
                .with_setting("ES_ENDPOINT")
                .with_value(raw.to_string())
                .with_component("config"),
        )
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::configuration_with_context(
            "search endpoint must use http or https",
            ErrorContext::new()
                .with_setting("ES_ENDPOINT")
                .with_value(url.scheme().to_string())
                .with_component("config"),
        ));
    }
    Ok(url)
}

fn parse_flag(raw: Option<String>) -> bool {
    matches!(
        raw.as_deref().map(str::trim),
        Some("true") | Some("1") | Some("TRUE") | Some("True")
    )
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            Error::configuration_with_context(
                format!("{} must be a non-negative integer", key),
                ErrorContext::new()
                    .with_setting(key)
                    .with_value(raw)
                    .with_component("config"),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("ES_ENDPOINT", "https://search.example.com"),
        ("ES_INDEX", "reviews"),
        ("ES_USER", "dashboard"),
        ("ES_PASSWORD", "s3cret"),
    ];

    #[test]
    fn test_from_lookup_defaults() {
        let config = SearchConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_delay, Duration::from_millis(500));
        assert!(!config.debug);
        assert!(!config.strict_status);
        assert!(config.http_timeout.is_none());
        assert_eq!(
            config.search_url(),
            "https://search.example.com/reviews/_search"
        );
    }

    #[test]
    fn test_from_lookup_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("ES_DEBUG", "true"),
            ("ES_MAX_CONCURRENT", "4"),
            ("ES_MAX_RETRIES", "2"),
            ("ES_BASE_DELAY_MS", "100"),
            ("ES_STRICT_STATUS", "1"),
            ("ES_HTTP_TIMEOUT_SECS", "15"),
        ]);
        let config = SearchConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert!(config.debug);
        assert!(config.strict_status);
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.base_delay, Duration::from_millis(100));
        assert_eq!(config.http_timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_missing_required_setting() {
        let err = SearchConfig::from_lookup(lookup_from(&REQUIRED[..3])).unwrap_err();
        let ctx = err.context().unwrap();
        assert_eq!(ctx.setting.as_deref(), Some("ES_PASSWORD"));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ES_MAX_RETRIES", "-1"));
        let err = SearchConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ES_MAX_CONCURRENT", "0"));
        assert!(SearchConfig::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(SearchConfig::new("not a url", "reviews", "u", "p").is_err());
        assert!(SearchConfig::new("ftp://host", "reviews", "u", "p").is_err());
        assert!(SearchConfig::new("http://host", " ", "u", "p").is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = SearchConfig::new("http://localhost:9200", "reviews", "u", "hunter2").unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_search_url_keeps_endpoint_path() {
        let config = SearchConfig::new("https://host/es/", "reviews", "u", "p").unwrap();
        assert_eq!(config.search_url(), "https://host/es/reviews/_search");
    }
}
