// Shared transport configuration for building reqwest::Client instances.
//
// The default fetcher and any caller-built clients share timeout,
// user-agent, and default-header settings through this module.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::Error;

const DEFAULT_USER_AGENT: &str = concat!("refetch/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Base URL that relative locators are joined onto.
    pub base_url: Option<Url>,
    /// Headers sent with every request.
    pub default_headers: Vec<(String, String)>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.into(),
            base_url: None,
            default_headers: Vec::new(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Client(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Client(format!("invalid header value for '{name}': {e}")))?;
            headers.insert(name, value);
        }

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Client(format!("failed to build HTTP client: {e}")))
    }

    /// Set the base URL relative locators resolve against.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Resolve a locator into an absolute URL.
    ///
    /// Absolute locators are parsed as-is; relative ones require a base URL.
    pub fn resolve(&self, locator: &str) -> Result<Url, Error> {
        match Url::parse(locator) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => Ok(base.join(locator)?),
                None => Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithoutBase)),
            },
            Err(e) => Err(Error::InvalidUrl(e)),
        }
    }
}
