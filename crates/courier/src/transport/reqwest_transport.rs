//! reqwest-based [`Transport`]

use std::collections::HashSet;
use std::sync::Arc;

use futures::TryStreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tokio_util::io::ReaderStream;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use super::Transport;
use crate::endpoint::HttpMethod;
use crate::error::Error;
use crate::multipart::{self, MultipartParameter};
use crate::progress::ProgressReporter;
use crate::request::PreparedRequest;
use crate::response::RawResponse;

const DEFAULT_APP_NAME: &str = "courier";

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Delete => Self::DELETE,
            HttpMethod::Options => Self::OPTIONS,
            HttpMethod::Head => Self::HEAD,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Trace => Self::TRACE,
            HttpMethod::Connect => Self::CONNECT,
        }
    }
}

/// Client pair sharing one trust policy
///
/// Certificates are only left unchecked for hosts listed in `trusted_hosts`.
#[derive(Debug, Clone)]
struct Session {
    strict: Client,
    trusting: Option<Client>,
    trusted_hosts: Arc<HashSet<String>>,
}

impl Session {
    fn new(trusted_hosts: Arc<HashSet<String>>) -> Result<Self, Error> {
        let strict = Client::builder().build()?;
        let trusting = if trusted_hosts.is_empty() {
            None
        } else {
            Some(
                Client::builder()
                    .danger_accept_invalid_certs(true)
                    .build()?,
            )
        };

        Ok(Self {
            strict,
            trusting,
            trusted_hosts,
        })
    }

    fn client_for(&self, url: &Url) -> &Client {
        match (&self.trusting, url.host_str()) {
            (Some(trusting), Some(host)) if self.trusted_hosts.contains(host) => trusting,
            _ => &self.strict,
        }
    }

    fn request(&self, request: PreparedRequest) -> reqwest::RequestBuilder {
        let client = self.client_for(&request.url);
        let mut builder = client.request(request.method.into(), request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder
    }
}

async fn execute(builder: reqwest::RequestBuilder) -> Result<RawResponse, Error> {
    let response = builder.send().await.map_err(|err| {
        tracing::warn!("Request failed: {err}");
        err
    })?;
    RawResponse::read(response).await
}

/// Default [`Transport`], backed by [`reqwest`]
///
/// Uploads go through their own session, identified by
/// [`Transport::background_session_id`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    session: Session,
    upload_session: Session,
    background_session_id: String,
}

impl ReqwestTransport {
    /// Transport with no trusted hosts and a generated session id
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    /// Create a new [`ReqwestTransportBuilder`]
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, Error> {
        execute(self.session.request(request)).await
    }

    #[instrument(skip_all, fields(url = %request.url, parts = parts.len()))]
    async fn upload(
        &self,
        mut request: PreparedRequest,
        parts: Vec<MultipartParameter>,
        reporter: ProgressReporter,
    ) -> Result<RawResponse, Error> {
        let files = multipart::open_all(&parts).await?;
        let counter = reporter.begin(multipart::total_len(&files));

        let mut form = Form::new();
        for file in files {
            let counter = counter.clone();
            let stream = ReaderStream::new(file.file)
                .inspect_ok(move |chunk| counter.advance(chunk.len() as u64));
            let part = Part::stream_with_length(Body::wrap_stream(stream), file.len)
                .file_name(file.file_name)
                .mime_str("application/octet-stream")?;
            form = form.part(file.parameter_key, part);
        }

        request.body = None;
        request.remove_header(CONTENT_TYPE.as_str());

        tracing::debug!(
            "Uploading through session {}",
            self.background_session_id
        );

        execute(self.upload_session.request(request).multipart(form)).await
    }

    fn background_session_id(&self) -> Option<&str> {
        Some(&self.background_session_id)
    }
}

/// Builder for [`ReqwestTransport`]
#[derive(Debug, Default)]
pub struct ReqwestTransportBuilder {
    trusted_hosts: HashSet<String>,
    background_session_id: Option<String>,
    app_name: Option<String>,
}

impl ReqwestTransportBuilder {
    /// Hosts whose certificates are accepted without evaluation
    pub fn trusted_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_hosts.extend(hosts.into_iter().map(Into::into));
        self
    }

    /// Add one trusted host
    pub fn trust_host(mut self, host: impl Into<String>) -> Self {
        self.trusted_hosts.insert(host.into());
        self
    }

    /// Fixed upload session id
    pub fn background_session_id(mut self, id: impl Into<String>) -> Self {
        self.background_session_id = Some(id.into());
        self
    }

    /// Prefix of the generated upload session id
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Build the transport
    pub fn build(self) -> Result<ReqwestTransport, Error> {
        if !self.trusted_hosts.is_empty() {
            tracing::warn!(
                "Certificate evaluation disabled for {} host(s)",
                self.trusted_hosts.len()
            );
        }

        let trusted_hosts = Arc::new(self.trusted_hosts);
        let background_session_id = self.background_session_id.unwrap_or_else(|| {
            let app_name = self.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME);
            format!("{app_name}-{}", Uuid::new_v4())
        });

        Ok(ReqwestTransport {
            session: Session::new(Arc::clone(&trusted_hosts))?,
            upload_session: Session::new(trusted_hosts)?,
            background_session_id,
        })
    }
}
