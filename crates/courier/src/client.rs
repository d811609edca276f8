//! Client facade
//!
//! Each call runs the same pipeline: build the request on the serial queue,
//! hand it to the transport from the background pool, then normalize (and
//! optionally validate) the response back on the serial queue.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::instrument;

use crate::endpoint::Endpoint;
use crate::environment::Environment;
use crate::error::Error;
use crate::multipart::MultipartParameter;
use crate::progress::{Progress, ProgressReporter};
use crate::queue::{Background, Executor, SerialQueue};
use crate::request::PreparedRequest;
use crate::response::Response;
use crate::router::{Router, SharedRouter, Signature};
use crate::task::Task;
use crate::transport::{ReqwestTransport, Transport};
use crate::validate::validate;

const DEFAULT_QUEUE_LABEL: &str = "courier";

/// HTTP client facade
///
/// Cheap to clone; clones share the router, the transport and the serial
/// queue.
#[derive(Debug, Clone)]
pub struct Client {
    router: SharedRouter,
    transport: Arc<dyn Transport>,
    queue: SerialQueue,
    background: Background,
}

impl Client {
    /// Client for `environment` with default settings
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(environment: impl Environment + 'static) -> Result<Self, Error> {
        Self::builder(environment).build()
    }

    /// Create a new [`ClientBuilder`]
    pub fn builder(environment: impl Environment + 'static) -> ClientBuilder {
        ClientBuilder::new(Arc::new(environment))
    }

    /// Replace the auth signature. `None` stops signing requests.
    pub fn set_auth_signature(&self, signature: Option<Signature>) {
        self.router.set_signature(signature);
    }

    /// Point subsequent requests at `environment`
    pub fn set_environment(&self, environment: impl Environment + 'static) {
        self.router.set_environment(Arc::new(environment));
    }

    /// Router shared by every clone of this client
    pub fn router(&self) -> &SharedRouter {
        &self.router
    }

    /// Serial queue the pipeline stages run on
    pub fn queue(&self) -> &SerialQueue {
        &self.queue
    }

    /// Background executor
    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Upload session identifier of the transport
    pub fn background_session_id(&self) -> Option<&str> {
        self.transport.background_session_id()
    }

    /// Send the request described by `endpoint`
    ///
    /// Any status code is a success here; see
    /// [`Client::perform_and_validate_request`].
    #[instrument(skip_all, fields(path = endpoint.path()))]
    pub fn perform_request<E>(&self, endpoint: E) -> Task<Response>
    where
        E: Endpoint + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let runtime = self.background.runtime().clone();

        self.generate_request(endpoint)
            .and_then(&self.background, move |request| {
                Task::spawn(&runtime, async move { transport.send(request).await })
            })
            .and_then(&self.queue, |raw| Task::ready(Response::from_raw(raw)))
    }

    /// Send the request described by `endpoint` and classify its status
    #[instrument(skip_all, fields(path = endpoint.path()))]
    pub fn perform_and_validate_request<E>(&self, endpoint: E) -> Task<Response>
    where
        E: Endpoint + 'static,
    {
        self.perform_request(endpoint).and_then(&self.queue, |response| {
            Task::ready(validate(response).map_err(Error::from))
        })
    }

    /// Upload `parts` as a multipart body
    ///
    /// Returns the response task and a progress task. The progress task
    /// resolves once the body is encoded, or with an empty progress if the
    /// request could not be built. The status code is not validated.
    #[instrument(skip_all, fields(path = endpoint.path(), parts = parts.len()))]
    pub fn perform_multipart_upload<E>(
        &self,
        endpoint: E,
        parts: Vec<MultipartParameter>,
    ) -> (Task<Response>, Task<Progress>)
    where
        E: Endpoint + 'static,
    {
        let (reporter, progress) = ProgressReporter::new();
        let transport = Arc::clone(&self.transport);
        let runtime = self.background.runtime().clone();

        let response = self
            .generate_request(endpoint)
            .and_then(&self.background, move |request| {
                Task::spawn(&runtime, async move {
                    transport.upload(request, parts, reporter).await
                })
            })
            .and_then(&self.queue, |raw| Task::ready(Response::from_raw(raw)));

        (response, progress)
    }

    fn generate_request<E>(&self, endpoint: E) -> Task<PreparedRequest>
    where
        E: Endpoint + 'static,
    {
        let router: Router = self.router.snapshot();
        Task::on(&self.queue, move || router.prepare(&endpoint))
    }
}

/// Builder for [`Client`]
#[derive(Debug)]
pub struct ClientBuilder {
    environment: Arc<dyn Environment>,
    signature: Option<Signature>,
    trusted_hosts: Vec<String>,
    background_session_id: Option<String>,
    app_name: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    runtime: Option<Handle>,
    queue_label: Option<String>,
}

impl ClientBuilder {
    /// Create a new [`ClientBuilder`]
    pub fn new(environment: Arc<dyn Environment>) -> Self {
        Self {
            environment,
            signature: None,
            trusted_hosts: Vec::new(),
            background_session_id: None,
            app_name: None,
            transport: None,
            runtime: None,
            queue_label: None,
        }
    }

    /// Initial auth signature
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Hosts whose certificates are accepted without evaluation
    pub fn trusted_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_hosts.extend(hosts.into_iter().map(Into::into));
        self
    }

    /// Fixed upload session id
    pub fn background_session_id(mut self, id: impl Into<String>) -> Self {
        self.background_session_id = Some(id.into());
        self
    }

    /// Application name, used as the generated session id prefix
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Use `transport` instead of [`ReqwestTransport`]
    ///
    /// Trusted hosts and session id settings are ignored.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Runtime driving the pipeline. Defaults to the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Name of the serial queue thread
    pub fn queue_label(mut self, label: impl Into<String>) -> Self {
        self.queue_label = Some(label.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<Client, Error> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|err| Error::Runtime(err.to_string()))?,
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let mut builder = ReqwestTransport::builder().trusted_hosts(self.trusted_hosts);
                if let Some(id) = self.background_session_id {
                    builder = builder.background_session_id(id);
                }
                if let Some(name) = self.app_name {
                    builder = builder.app_name(name);
                }
                Arc::new(builder.build()?)
            }
        };

        let label = self.queue_label.as_deref().unwrap_or(DEFAULT_QUEUE_LABEL);
        let queue = SerialQueue::new(label, runtime.clone())?;

        tracing::debug!("Client ready on queue `{label}`");

        Ok(Client {
            router: SharedRouter::new(Router::new(self.environment, self.signature)),
            transport,
            queue,
            background: Background::new(runtime),
        })
    }
}
