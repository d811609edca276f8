//! Transport-ready request

use url::Url;

use crate::endpoint::{Headers, HttpMethod};

/// Request built by the router, ready to be handed to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL
    pub url: Url,
    /// Header fields
    pub headers: Headers,
    /// Body bytes
    pub body: Option<Vec<u8>>,
}

impl PreparedRequest {
    /// Create a request without headers or body
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Header value, matching the name case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set a header, replacing any existing field with the same name in any case
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove_header(&name);
        self.headers.insert(name, value.into());
    }

    /// Remove a header, matching the name case-insensitively
    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    }
}
