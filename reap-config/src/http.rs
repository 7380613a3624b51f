//! HTTP client construction for live fetches against providers and crawled
//! sites: timeouts, user agent, TLS, and retrying content fetch helpers
//! with exponential backoff.
//!
//! # Example
//! ```no_run
//! use reap_config::http::{build_http_client, HttpClientParams};
//!
//! let config: serde_yaml::Value = serde_yaml::from_str(r#"
//! http:
//!     timeout: 30
//!     connect_timeout: 10
//! "#).unwrap();
//!
//! let params =
//!     HttpClientParams::from_config(&config["http"], "reap-crawler/1.0").unwrap();
//! let client = build_http_client(params).unwrap();
//! ```

use crate::ConfigError;
use backoff::ExponentialBackoffBuilder;

/// Parameters for building the HTTP client used by live fetches.
#[derive(Debug)]
pub struct HttpClientParams<'a> {
    pub timeout: u64,
    pub connect_timeout: u64,
    pub user_agent: &'a str,
}

impl<'a> HttpClientParams<'a> {
    /// Read client parameters from the `http` section of a YAML config:
    ///
    /// ```yaml
    /// http:
    ///     timeout: 30
    ///     connect_timeout: 10
    /// ```
    ///
    /// Missing timeout fields are configuration errors; they halt the
    /// worker at startup rather than defaulting silently.
    pub fn from_config(
        http_config: &serde_yaml::Value,
        user_agent: &'a str,
    ) -> Result<Self, ConfigError> {
        let timeout = http_config["timeout"]
            .as_u64()
            .ok_or_else(|| ConfigError::MissingField("http.timeout".into()))?;
        let connect_timeout = http_config["connect_timeout"].as_u64().ok_or_else(
            || ConfigError::MissingField("http.connect_timeout".into()),
        )?;

        Ok(Self {
            timeout,
            connect_timeout,
            user_agent,
        })
    }
}

/// Build a `reqwest::Client` with rustls, the configured timeouts, and the
/// given user agent.
pub fn build_http_client(
    params: HttpClientParams,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::ClientBuilder::new()
        .use_rustls_tls()
        .timeout(std::time::Duration::from_secs(params.timeout))
        .connect_timeout(std::time::Duration::from_secs(params.connect_timeout))
        .user_agent(params.user_agent)
        .build()
}

/// GET a URL and return status plus body, retrying transient failures with
/// exponential backoff. Used by provider fetchers and crawl sources; the
/// caller maps the result into its own error taxonomy.
pub async fn fetch_url_content(
    client: &reqwest::Client,
    url: &str,
) -> Result<(reqwest::StatusCode, String), reqwest::Error> {
    let backoff = ExponentialBackoffBuilder::new()
        .with_max_interval(std::time::Duration::from_secs(10))
        .with_max_elapsed_time(Some(std::time::Duration::from_secs(30)))
        .build();

    let fetch_content = || async {
        let response = client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    };

    backoff::future::retry(backoff, fetch_content).await
}
