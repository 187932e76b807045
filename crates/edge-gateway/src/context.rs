//! Context builder: transport request → [`AdaptedRequest`].
//!
//! The legacy response builder is created by the script runtime when a
//! module uses the two-argument convention, so this side only adapts the
//! request.

use axum::extract::Query;
use axum::http::{header::HOST, request::Parts};
use edge_kernel::gateway::{AdaptedRequest, RequestBody, RouteMatch};
use std::collections::BTreeMap;

/// Build the handler-visible request from transport parts and the already
/// read body.
pub fn build_request(
    request_id: impl Into<String>,
    parts: &Parts,
    route: &RouteMatch,
    body: &[u8],
) -> AdaptedRequest {
    let path = parts.uri.path().to_string();
    let host = parts
        .headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "localhost".to_string());
    let url = match parts.uri.query() {
        Some(query) => format!("http://{host}{path}?{query}"),
        None => format!("http://{host}{path}"),
    };

    let query: BTreeMap<String, String> =
        Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map(|Query(pairs)| pairs.into_iter().collect())
            .unwrap_or_default();

    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &parts.headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    AdaptedRequest {
        id: request_id.into(),
        method: parts.method.as_str().to_uppercase(),
        url,
        path,
        query,
        headers,
        params: route
            .path_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        body: RequestBody::from_bytes(body),
    }
}
