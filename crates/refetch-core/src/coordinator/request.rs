// ── Request composition ──
//
// Turns a locator plus `RequestConfig` into the `FetchRequest` handed to a
// fetcher: query merged, path params substituted, body encoded.

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use refetch_api::{FetchRequest, RequestBody, compose_url};

use crate::config::RequestConfig;

const CONTENT_TYPE: &str = "content-type";

pub(crate) fn build_request(
    url: &str,
    config: &RequestConfig,
    cancel: CancellationToken,
) -> FetchRequest {
    FetchRequest {
        url: compose_url(url, &config.query, &config.params),
        method: config.method_or_default(),
        headers: config
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        body: config.body.as_ref().map(|body| encode_body(body, config)),
        cancel,
    }
}

/// JSON-encode the body unless the caller picked its own content type, in
/// which case strings go out verbatim and other values as their JSON text.
fn encode_body(body: &Value, config: &RequestConfig) -> RequestBody {
    let custom_type = config
        .headers
        .keys()
        .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE));
    if !custom_type {
        return RequestBody::Json(body.clone());
    }
    match body {
        Value::String(s) => RequestBody::Raw(s.clone()),
        other => RequestBody::Raw(other.to_string()),
    }
}
