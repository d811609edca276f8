//! HTTP engine seam

use std::fmt::Debug;

use crate::error::Error;
use crate::multipart::MultipartParameter;
use crate::progress::ProgressReporter;
use crate::request::PreparedRequest;
use crate::response::RawResponse;

mod reqwest_transport;

pub use reqwest_transport::{ReqwestTransport, ReqwestTransportBuilder};

/// Sends prepared requests
#[async_trait::async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Send `request` and read the whole response
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, Error>;

    /// Send `request` with `parts` as a multipart body
    ///
    /// The reporter is begun once the body size is known. Dropping it unbegun
    /// leaves the progress empty.
    async fn upload(
        &self,
        request: PreparedRequest,
        parts: Vec<MultipartParameter>,
        reporter: ProgressReporter,
    ) -> Result<RawResponse, Error>;

    /// Identifier of the upload session, if the transport has one
    fn background_session_id(&self) -> Option<&str> {
        None
    }
}
