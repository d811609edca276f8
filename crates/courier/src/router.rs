//! Router
//!
//! Holds the environment and the optional auth signature, and turns endpoints
//! into [`PreparedRequest`]s.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::instrument;
use url::Url;

use crate::endpoint::Endpoint;
use crate::environment::Environment;
use crate::error::{Error, ErrorKind};
use crate::request::PreparedRequest;

/// Header applied to every outgoing request, usually an auth token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Header name
    pub header: String,
    /// Header value
    pub value: String,
}

impl Signature {
    /// Create a new [`Signature`]
    pub fn new(header: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            value: value.into(),
        }
    }

    /// `Authorization: Bearer <token>`
    pub fn bearer(token: impl AsRef<str>) -> Self {
        Self::new("Authorization", format!("Bearer {}", token.as_ref()))
    }
}

/// Immutable environment + signature pair
#[derive(Debug, Clone)]
pub struct Router {
    environment: Arc<dyn Environment>,
    signature: Option<Signature>,
}

impl Router {
    /// Create a new [`Router`]
    pub fn new(environment: Arc<dyn Environment>, signature: Option<Signature>) -> Self {
        Self {
            environment,
            signature,
        }
    }

    /// Environment
    pub fn environment(&self) -> &Arc<dyn Environment> {
        &self.environment
    }

    /// Signature
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Build the request for `endpoint`
    ///
    /// Endpoint headers are applied first, then the signature header, which
    /// wins over an endpoint header of the same name. Parameters are encoded
    /// last.
    #[instrument(skip_all, fields(path = endpoint.path()))]
    pub fn prepare<E>(&self, endpoint: &E) -> Result<PreparedRequest, Error>
    where
        E: Endpoint + ?Sized,
    {
        let route = self.environment.route_url(endpoint.path());
        let url = Url::parse(&route).map_err(|err| {
            tracing::debug!("Environment produced malformed URL `{route}`: {err}");
            ErrorKind::MalformedUrl
        })?;

        let mut request = PreparedRequest::new(endpoint.method(), url);

        if let Some(headers) = endpoint.headers() {
            for (name, value) in headers {
                request.set_header(name.as_str(), value.as_str());
            }
        }

        if let Some(signature) = &self.signature {
            request.set_header(signature.header.as_str(), signature.value.as_str());
        }

        let request = endpoint
            .parameter_encoding()
            .encode(request, endpoint.parameters())?;

        tracing::debug!("Prepared {} {}", request.method, request.url);

        Ok(request)
    }
}

/// Shared, swappable [`Router`]
///
/// Readers take a snapshot; writers replace one half of the pair. A request is
/// always built against a single consistent snapshot.
#[derive(Debug, Clone)]
pub struct SharedRouter {
    inner: Arc<RwLock<Router>>,
}

impl SharedRouter {
    /// Create a new [`SharedRouter`]
    pub fn new(router: Router) -> Self {
        Self {
            inner: Arc::new(RwLock::new(router)),
        }
    }

    /// Current router
    pub fn snapshot(&self) -> Router {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the signature, keeping the environment
    pub fn set_signature(&self, signature: Option<Signature>) {
        let mut router = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        router.signature = signature;
    }

    /// Replace the environment, keeping the signature
    pub fn set_environment(&self, environment: Arc<dyn Environment>) {
        let mut router = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        router.environment = environment;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::endpoint::{ApiEndpoint, HttpMethod, ParameterEncoding};
    use crate::environment::BaseUrl;
    use crate::error::EncodingError;

    #[derive(Debug)]
    struct Broken;

    impl Environment for Broken {
        fn route_url(&self, path: &str) -> String {
            format!("not a url{path}")
        }
    }

    fn router(signature: Option<Signature>) -> Router {
        Router::new(Arc::new(BaseUrl::new("https://api.test")), signature)
    }

    #[test]
    fn test_prepare_get_without_parameters() {
        let request = router(None)
            .prepare(&ApiEndpoint::get("/users/42"))
            .expect("Request builds");

        assert_eq!(request.url.as_str(), "https://api.test/users/42");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.method.as_str(), "GET");
        assert!(request.body.is_none());
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_malformed_url() {
        let router = Router::new(Arc::new(Broken), None);

        for endpoint in [
            ApiEndpoint::get("/users"),
            ApiEndpoint::post("/users")
                .with_encoding(ParameterEncoding::custom(|_, _| {
                    Err(EncodingError::custom("never reached"))
                })),
        ] {
            let err = router.prepare(&endpoint).expect_err("URL is malformed");
            assert_eq!(err.kind(), Some(ErrorKind::MalformedUrl));
        }
    }

    #[test]
    fn test_signature_header_applied() {
        let request = router(Some(Signature::new("X-Auth", "token-1")))
            .prepare(&ApiEndpoint::get("/me"))
            .expect("Request builds");

        assert_eq!(request.header("X-Auth"), Some("token-1"));
    }

    #[test]
    fn test_signature_overrides_endpoint_header() {
        let endpoint = ApiEndpoint::get("/me")
            .with_header("authorization", "Basic abc")
            .with_header("Accept", "application/json");

        let request = router(Some(Signature::bearer("xyz")))
            .prepare(&endpoint)
            .expect("Request builds");

        assert_eq!(request.header("Authorization"), Some("Bearer xyz"));
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert_eq!(request.headers.len(), 2);
    }

    #[test]
    fn test_no_signature_omits_header() {
        let request = router(None)
            .prepare(&ApiEndpoint::get("/me"))
            .expect("Request builds");
        assert!(request.header("Authorization").is_none());
    }

    #[test]
    fn test_encoding_error_propagates() {
        let endpoint = ApiEndpoint::post("/upload").with_encoding(ParameterEncoding::custom(
            |_, _| Err(EncodingError::custom("bad payload")),
        ));

        let err = router(None).prepare(&endpoint).expect_err("Encoder fails");
        assert!(matches!(err, Error::Encoding(EncodingError::Custom(ref m)) if m == "bad payload"));
    }

    #[test]
    fn test_json_parameters() {
        let endpoint = ApiEndpoint::post("/users")
            .with_encoding(ParameterEncoding::Json)
            .with_parameter("name", "ada");

        let request = router(None).prepare(&endpoint).expect("Request builds");
        let body: serde_json::Value =
            serde_json::from_slice(request.body.as_deref().expect("Body is set"))
                .expect("Body is JSON");
        assert_eq!(body, json!({"name": "ada"}));
    }

    #[test]
    fn test_shared_router_swaps() {
        let shared = SharedRouter::new(router(None));

        shared.set_signature(Some(Signature::new("X-Auth", "a")));
        let before = shared.snapshot();

        shared.set_environment(Arc::new(BaseUrl::new("https://staging.api.test")));
        shared.set_signature(None);
        let after = shared.snapshot();

        let request = before
            .prepare(&ApiEndpoint::get("/ping"))
            .expect("Request builds");
        assert_eq!(request.url.as_str(), "https://api.test/ping");
        assert_eq!(request.header("X-Auth"), Some("a"));

        let request = after
            .prepare(&ApiEndpoint::get("/ping"))
            .expect("Request builds");
        assert_eq!(request.url.as_str(), "https://staging.api.test/ping");
        assert!(request.header("X-Auth").is_none());
    }
}
