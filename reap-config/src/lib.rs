//! Configuration plumbing for reap: YAML application config with
//! dot-notation lookup, per-provider API budgets, and (behind the `http`
//! feature) HTTP client construction with retrying fetch helpers.

pub mod config;
#[cfg(feature = "http")]
pub mod http;
pub mod provider;

pub use config::{ConfigError, Configurable};
pub use provider::ProviderConfig;

#[cfg(feature = "http")]
pub use backoff;
