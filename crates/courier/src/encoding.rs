//! Parameter encoding

use serde_json::Value;

use crate::endpoint::{HttpMethod, ParameterEncoding, Parameters};
use crate::error::EncodingError;
use crate::request::PreparedRequest;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json";

impl ParameterEncoding {
    /// Place `parameters` on `request`
    pub fn encode(
        &self,
        request: PreparedRequest,
        parameters: Option<&Parameters>,
    ) -> Result<PreparedRequest, EncodingError> {
        match self {
            Self::Url => url_encode(request, parameters),
            Self::Json => json_encode(request, parameters),
            Self::Custom(encoder) => encoder(request, parameters),
        }
    }
}

fn encodes_in_url(method: HttpMethod) -> bool {
    matches!(method, HttpMethod::Get | HttpMethod::Head | HttpMethod::Delete)
}

fn url_encode(
    mut request: PreparedRequest,
    parameters: Option<&Parameters>,
) -> Result<PreparedRequest, EncodingError> {
    let Some(parameters) = parameters.filter(|p| !p.is_empty()) else {
        return Ok(request);
    };

    let encoded = serde_urlencoded::to_string(query_pairs(parameters))?;

    if encodes_in_url(request.method) {
        let query = match request.url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
            _ => encoded,
        };
        request.url.set_query(Some(&query));
    } else {
        if request.header("Content-Type").is_none() {
            request.set_header("Content-Type", FORM_CONTENT_TYPE);
        }
        request.body = Some(encoded.into_bytes());
    }

    Ok(request)
}

fn json_encode(
    mut request: PreparedRequest,
    parameters: Option<&Parameters>,
) -> Result<PreparedRequest, EncodingError> {
    let Some(parameters) = parameters else {
        return Ok(request);
    };

    let body = serde_json::to_vec(parameters)?;
    if request.header("Content-Type").is_none() {
        request.set_header("Content-Type", JSON_CONTENT_TYPE);
    }
    request.body = Some(body);

    Ok(request)
}

/// Flatten parameters into sorted `key=value` pairs
///
/// Nested objects become `key[sub]`, array items `key[]`.
fn query_pairs(parameters: &Parameters) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in sorted(parameters) {
        query_components(key, value, &mut pairs);
    }
    pairs
}

fn sorted(map: &Parameters) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn query_components(key: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (nested_key, nested) in sorted(map) {
                query_components(&format!("{key}[{nested_key}]"), nested, pairs);
            }
        }
        Value::Array(items) => {
            for item in items {
                query_components(&format!("{key}[]"), item, pairs);
            }
        }
        Value::String(text) => pairs.push((key.to_owned(), text.clone())),
        Value::Bool(flag) => pairs.push((key.to_owned(), flag.to_string())),
        Value::Number(number) => pairs.push((key.to_owned(), number.to_string())),
        Value::Null => pairs.push((key.to_owned(), String::new())),
    }
}
