//! Environments resolve endpoint paths to absolute URLs

use std::fmt::Debug;

/// Strategy turning an endpoint path into an absolute URL string
///
/// The result is parsed by the router; anything that does not parse as an
/// absolute URL fails the request with [`crate::ErrorKind::MalformedUrl`].
pub trait Environment: Send + Sync + Debug {
    /// Absolute URL for `path`
    fn route_url(&self, path: &str) -> String;
}

/// Environment rooted at a base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    base: String,
}

impl BaseUrl {
    /// Create a new [`BaseUrl`]. A trailing slash is dropped.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL without trailing slash
    pub fn as_str(&self) -> &str {
        &self.base
    }
}

impl Environment for BaseUrl {
    fn route_url(&self, path: &str) -> String {
        if path.is_empty() {
            self.base.clone()
        } else if path.starts_with('/') {
            format!("{}{}", self.base, path)
        } else {
            format!("{}/{}", self.base, path)
        }
    }
}
