use std::collections::BTreeMap;
use std::fmt;

/// Deterministic identifier for one upstream request.
///
/// Derived from `(provider, endpoint, parameters)`. Parameters are
/// canonicalized by name order before hashing, so two logically identical
/// requests produce the same key no matter how the caller assembled them.
/// The digest is a pure function of its inputs and stays valid across
/// process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    provider: String,
    digest: String,
}

impl CacheKey {
    pub fn new(
        provider: &str,
        endpoint: &str,
        params: &BTreeMap<String, String>,
    ) -> Self {
        let mut canonical = String::from(endpoint);
        for (name, value) in params {
            canonical.push('&');
            canonical.push_str(name);
            canonical.push('=');
            canonical.push_str(value);
        }
        Self {
            provider: provider.to_string(),
            digest: format!("{:x}", md5::compute(canonical.as_bytes())),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Hex digest, safe to use as a filename.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.digest)
    }
}
