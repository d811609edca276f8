//! Endpoint description
//!
//! An [`Endpoint`] is everything the router needs to know about one API call:
//! the path relative to the environment, the method, how parameters are
//! encoded, the parameters themselves and any extra headers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::EncodingError;
use crate::request::PreparedRequest;

/// Endpoint parameters
pub type Parameters = serde_json::Map<String, Value>;

/// Header fields, by name
pub type Headers = BTreeMap<String, String>;

/// HTTP method
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
    /// HEAD
    Head,
    /// PATCH
    Patch,
    /// TRACE
    Trace,
    /// CONNECT
    Connect,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
            Self::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Function used by [`ParameterEncoding::Custom`]
pub type CustomEncoder = Arc<
    dyn Fn(PreparedRequest, Option<&Parameters>) -> Result<PreparedRequest, EncodingError>
        + Send
        + Sync,
>;

/// How endpoint parameters are placed on the request
#[derive(Clone, Default)]
pub enum ParameterEncoding {
    /// Query string for GET, HEAD and DELETE, form body otherwise
    #[default]
    Url,
    /// JSON body
    Json,
    /// Caller supplied encoder
    Custom(CustomEncoder),
}

impl ParameterEncoding {
    /// Wrap a function as a custom encoding
    pub fn custom<F>(encoder: F) -> Self
    where
        F: Fn(PreparedRequest, Option<&Parameters>) -> Result<PreparedRequest, EncodingError>
            + Send
            + Sync
            + 'static,
    {
        Self::Custom(Arc::new(encoder))
    }
}

impl fmt::Debug for ParameterEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url => f.write_str("Url"),
            Self::Json => f.write_str("Json"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Description of one API call
pub trait Endpoint: Send + Sync {
    /// Path handed to the environment to build the absolute URL
    fn path(&self) -> &str;

    /// HTTP method
    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    /// Parameter encoding
    fn parameter_encoding(&self) -> ParameterEncoding {
        ParameterEncoding::Url
    }

    /// Parameters
    fn parameters(&self) -> Option<&Parameters> {
        None
    }

    /// Extra header fields
    fn headers(&self) -> Option<&Headers> {
        None
    }
}

impl<E: Endpoint + ?Sized> Endpoint for Arc<E> {
    fn path(&self) -> &str {
        (**self).path()
    }

    fn method(&self) -> HttpMethod {
        (**self).method()
    }

    fn parameter_encoding(&self) -> ParameterEncoding {
        (**self).parameter_encoding()
    }

    fn parameters(&self) -> Option<&Parameters> {
        (**self).parameters()
    }

    fn headers(&self) -> Option<&Headers> {
        (**self).headers()
    }
}

impl<E: Endpoint + ?Sized> Endpoint for Box<E> {
    fn path(&self) -> &str {
        (**self).path()
    }

    fn method(&self) -> HttpMethod {
        (**self).method()
    }

    fn parameter_encoding(&self) -> ParameterEncoding {
        (**self).parameter_encoding()
    }

    fn parameters(&self) -> Option<&Parameters> {
        (**self).parameters()
    }

    fn headers(&self) -> Option<&Headers> {
        (**self).headers()
    }
}

/// Plain value [`Endpoint`]
#[derive(Debug, Clone, Default)]
pub struct ApiEndpoint {
    path: String,
    method: HttpMethod,
    encoding: ParameterEncoding,
    parameters: Option<Parameters>,
    headers: Option<Headers>,
}

impl ApiEndpoint {
    /// Create a new [`ApiEndpoint`]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            ..Default::default()
        }
    }

    /// GET endpoint
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// POST endpoint
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// PUT endpoint
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// DELETE endpoint
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Set the parameter encoding
    pub fn with_encoding(mut self, encoding: ParameterEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Replace all parameters
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Add a single parameter
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters
            .get_or_insert_with(Parameters::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add a header field
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.into(), value.into());
        self
    }
}

impl Endpoint for ApiEndpoint {
    fn path(&self) -> &str {
        &self.path
    }

    fn method(&self) -> HttpMethod {
        self.method
    }

    fn parameter_encoding(&self) -> ParameterEncoding {
        self.encoding.clone()
    }

    fn parameters(&self) -> Option<&Parameters> {
        self.parameters.as_ref()
    }

    fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }
}
