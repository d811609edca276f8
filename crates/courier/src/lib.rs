//! Endpoint-driven HTTP client
//!
//! Describe an API call as an [`Endpoint`], point a [`Client`] at an
//! [`Environment`], and get back a [`Task`] resolving to a normalized
//! [`Response`]. Status codes can be classified into an [`ErrorKind`] with
//! [`Client::perform_and_validate_request`].
//!
//! # Example
//!
//! ```no_run
//! use courier::{ApiEndpoint, BaseUrl, Client, Error, Signature};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     name: String,
//! }
//!
//! async fn example() -> Result<User, Error> {
//!     let client = Client::new(BaseUrl::new("https://api.example.com"))?;
//!     client.set_auth_signature(Some(Signature::bearer("token")));
//!
//!     let response = client
//!         .perform_and_validate_request(ApiEndpoint::get("/users/42"))
//!         .await?;
//!     response.json()
//! }
//! ```

mod client;
mod encoding;
mod endpoint;
mod environment;
mod error;
mod logging;
mod multipart;
mod progress;
mod queue;
mod request;
mod response;
mod router;
mod settings;
mod task;
mod transport;
mod validate;

pub use client::{Client, ClientBuilder};
pub use endpoint::{
    ApiEndpoint, CustomEncoder, Endpoint, Headers, HttpMethod, ParameterEncoding, Parameters,
};
pub use environment::{BaseUrl, Environment};
pub use error::{EncodingError, Error, ErrorKind};
pub use logging::init_logging;
pub use multipart::MultipartParameter;
pub use progress::{Progress, ProgressCounter, ProgressReporter};
pub use queue::{Background, Executor, Job, MainLoop, MainQueue, SerialQueue};
pub use request::PreparedRequest;
pub use response::{RawResponse, Response};
pub use router::{Router, SharedRouter, Signature};
pub use settings::Settings;
pub use task::{both, both_serially, Deferred, Task};
pub use transport::{ReqwestTransport, ReqwestTransportBuilder, Transport};
pub use validate::{classify, validate};
