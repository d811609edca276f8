//! Status code validation

use crate::error::ErrorKind;
use crate::response::Response;

/// Classify a status code
///
/// `None` means the code is accepted. 405-499 share
/// [`ErrorKind::UnknownResponse`].
pub fn classify(status_code: u16) -> Option<ErrorKind> {
    match status_code {
        400 => Some(ErrorKind::BadRequest),
        401 => Some(ErrorKind::Unauthorized),
        403 => Some(ErrorKind::Forbidden),
        404 => Some(ErrorKind::ResourceNotFound),
        405..=499 => Some(ErrorKind::UnknownResponse),
        500 => Some(ErrorKind::ServerUnavailable),
        _ => None,
    }
}

/// Pass `response` through unchanged, or fail with its classification
pub fn validate(response: Response) -> Result<Response, ErrorKind> {
    match classify(response.status_code()) {
        Some(kind) => {
            tracing::debug!("Response rejected with status {}: {kind}", response.status_code());
            Err(kind)
        }
        None => Ok(response),
    }
}
