//! HTTP response types

use std::fmt;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::endpoint::Headers;
use crate::error::{Error, ErrorKind};

/// Response as returned by a transport, before normalization
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Header fields
    pub headers: HeaderMap,
    /// Body bytes
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Read a [`reqwest::Response`] to the end
    pub async fn read(response: reqwest::Response) -> Result<Self, Error> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(Self {
            status,
            headers,
            body,
        })
    }
}

/// Snapshot of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status_code: u16,
    headers: Headers,
    data: Vec<u8>,
}

impl Response {
    /// Create a new [`Response`]
    pub fn new(status_code: u16, headers: Headers, data: Vec<u8>) -> Self {
        Self {
            status_code,
            headers,
            data,
        }
    }

    /// Normalize a transport response
    ///
    /// Every header value must be UTF-8 text, otherwise the response is
    /// rejected with [`ErrorKind::UnknownResponse`]. Repeated header fields are joined
    /// with `", "`.
    pub fn from_raw(raw: RawResponse) -> Result<Self, Error> {
        let mut headers = Headers::new();
        for (name, value) in raw.headers.iter() {
            let value = std::str::from_utf8(value.as_bytes()).map_err(|_| {
                tracing::warn!("Header {name} is not representable as text");
                ErrorKind::UnknownResponse
            })?;
            headers
                .entry(name.as_str().to_owned())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_owned());
        }

        let response = Self::new(raw.status, headers, raw.body);

        if cfg!(debug_assertions) {
            if let Some(message) = response.error_message() {
                tracing::debug!("Server error message: {message}");
            }
        }

        Ok(response)
    }

    /// HTTP status code
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Header fields
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Header value, matching the name case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Body bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the body bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Check if the response status is a success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Body as a JSON object, if it is one
    pub fn data_as_json(&self) -> Option<serde_json::Map<String, Value>> {
        match serde_json::from_slice(&self.data) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// Deserialize the body
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.data)?)
    }

    /// Error message carried by a JSON body, if any
    pub fn error_message(&self) -> Option<String> {
        let body = self.data_as_json()?;
        ["message", "error", "error_description"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .map(str::to_owned)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusCode: {}\nHeaders: ", self.status_code)?;
        f.debug_map().entries(self.headers.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderValue, CONTENT_TYPE, SET_COOKIE};
    use serde::Deserialize;

    use super::*;

    fn raw(status: u16, body: &str) -> RawResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        RawResponse {
            status,
            headers,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_from_raw() {
        let response = Response::from_raw(raw(201, r#"{"id": 7}"#)).expect("Normalizes");

        assert_eq!(response.status_code(), 201);
        assert!(response.is_success());
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.data(), br#"{"id": 7}"#);
    }

    #[test]
    fn test_from_raw_joins_repeated_headers() {
        let mut raw = raw(200, "");
        raw.headers
            .append(SET_COOKIE, HeaderValue::from_static("a=1"));
        raw.headers
            .append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let response = Response::from_raw(raw).expect("Normalizes");
        assert_eq!(response.header("set-cookie"), Some("a=1, b=2"));
    }

    #[test]
    fn test_from_raw_rejects_binary_header() {
        let mut raw = raw(200, "");
        raw.headers.insert(
            "x-binary",
            HeaderValue::from_bytes(&[0xfa, 0xfb]).expect("Opaque bytes are a valid value"),
        );

        let err = Response::from_raw(raw).expect_err("Header is not text");
        assert_eq!(err.kind(), Some(ErrorKind::UnknownResponse));
    }

    #[test]
    fn test_from_raw_accepts_utf8_header() {
        let mut raw = raw(200, "");
        raw.headers.insert(
            "content-disposition",
            HeaderValue::from_str("attachment; filename=\"résumé.pdf\"")
                .expect("UTF-8 bytes are a valid value"),
        );

        let response = Response::from_raw(raw).expect("UTF-8 header is text");
        assert_eq!(
            response.header("Content-Disposition"),
            Some("attachment; filename=\"résumé.pdf\"")
        );
    }

    #[test]
    fn test_data_as_json() {
        let response = Response::from_raw(raw(200, r#"{"ok": true}"#)).expect("Normalizes");
        let json = response.data_as_json().expect("Body is an object");
        assert_eq!(json["ok"], true);

        let response = Response::from_raw(raw(200, "[1, 2]")).expect("Normalizes");
        assert!(response.data_as_json().is_none());

        let response = Response::from_raw(raw(200, "not json")).expect("Normalizes");
        assert!(response.data_as_json().is_none());
    }

    #[test]
    fn test_json() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: u32,
        }

        let response = Response::from_raw(raw(200, r#"{"id": 42}"#)).expect("Normalizes");
        assert_eq!(response.json::<User>().expect("Decodes"), User { id: 42 });

        let response = Response::from_raw(raw(200, "nope")).expect("Normalizes");
        assert!(matches!(response.json::<User>(), Err(Error::Decode(_))));
    }

    #[test]
    fn test_error_message() {
        let response =
            Response::from_raw(raw(422, r#"{"error": "email taken"}"#)).expect("Normalizes");
        assert_eq!(response.error_message().as_deref(), Some("email taken"));

        let response = Response::from_raw(raw(200, r#"{"id": 1}"#)).expect("Normalizes");
        assert!(response.error_message().is_none());
    }

    #[test]
    fn test_display() {
        let response = Response::new(404, Headers::new(), Vec::new());
        assert_eq!(response.to_string(), "StatusCode: 404\nHeaders: {}");
    }
}
