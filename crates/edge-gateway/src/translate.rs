//! Response translation: handler output → envelope → HTTP response.
//!
//! [`translate`] reduces a [`HandlerOutput`] to one [`ResponseEnvelope`].
//! [`into_http`] is the only place an envelope becomes an axum response, so
//! every request is written exactly once.

use crate::error::GatewayError;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::Response,
};
use edge_kernel::gateway::{
    EnvelopeBody, HandlerOutput, ResponseEnvelope, ReturnedBody, ReturnedResponse, ReturnedValue,
};
use tracing::warn;

/// Reduce a handler's output to one envelope.
///
/// Precedence: a Response-shaped return value, then a touched legacy
/// response record, then any other returned value as a JSON 200.
/// Nothing at all is a [`GatewayError::Translation`].
pub fn translate(output: HandlerOutput) -> Result<ResponseEnvelope, GatewayError> {
    match (output.returned, output.record) {
        (ReturnedValue::Response(response), _) => Ok(from_returned(response)),
        (_, Some(record)) => Ok(ResponseEnvelope {
            status: record.status_code,
            headers: record.headers,
            body: record.body,
        }),
        (ReturnedValue::Value(value), None) => Ok(ResponseEnvelope::json(200, value)),
        (ReturnedValue::Nothing, None) => Err(GatewayError::Translation),
    }
}

fn from_returned(response: ReturnedResponse) -> ResponseEnvelope {
    let body = match response.body {
        ReturnedBody::Null => EnvelopeBody::Empty,
        ReturnedBody::Value(value) => EnvelopeBody::Json(value),
        ReturnedBody::Text(text) => match serde_json::from_str(&text) {
            Ok(value) => EnvelopeBody::Json(value),
            Err(_) => EnvelopeBody::Text(text),
        },
    };
    ResponseEnvelope {
        status: response.status.unwrap_or(200),
        headers: response.headers,
        body,
    }
}

/// Write an envelope as an HTTP response.
///
/// Merges in the CORS header set, fills in a default `Content-Type` for
/// JSON and text bodies, and answers 500 for status codes outside 100-599.
/// Headers that are not valid HTTP are dropped with a warning.
pub fn into_http(mut envelope: ResponseEnvelope) -> Response {
    envelope.apply_cors();

    let status = Some(envelope.status)
        .filter(|s| (100..=599).contains(s))
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let (bytes, default_type) = match envelope.body {
        EnvelopeBody::Empty => (Vec::new(), None),
        EnvelopeBody::Text(text) => (text.into_bytes(), Some("text/plain; charset=utf-8")),
        EnvelopeBody::Json(value) => (value.to_string().into_bytes(), Some("application/json")),
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    for (name, value) in &envelope.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "Dropping invalid response header"),
        }
    }
    if let Some(content_type) = default_type {
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
    }
    response
}
