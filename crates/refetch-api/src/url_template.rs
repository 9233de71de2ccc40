// ── URL template substitution ──
//
// Path parameters are written either as `[name]` or `:name` segments
// (e.g. `/api/[resource]/:id`). The query string is never touched by
// substitution; query maps are appended separately by `append_query`.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;
use url::form_urlencoded;

/// Render a JSON value the way it should appear inside a URL.
///
/// Strings are used without quotes, arrays are comma-joined, `null`
/// renders as an empty string, and everything else uses its JSON form.
pub fn value_to_url_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(value_to_url_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// Substitute `[name]` and `:name` path segments from `params`.
///
/// A parameter missing from `params` is replaced by its bare name and a
/// warning is logged.
pub fn set_url_params(template: &str, params: &IndexMap<String, Value>) -> String {
    let (path, query) = match template.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (template, None),
    };

    let substituted = path
        .split('/')
        .map(|segment| {
            let name = if segment.len() > 1 && segment.starts_with('[') && segment.ends_with(']')
            {
                &segment[1..segment.len() - 1]
            } else if let Some(name) = segment.strip_prefix(':') {
                name
            } else {
                return segment.to_owned();
            };

            if let Some(value) = params.get(name) {
                value_to_url_string(value)
            } else {
                warn!(
                    param = name,
                    url = template,
                    "param does not exist in params configuration"
                );
                name.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    match query {
        Some(query) => format!("{substituted}?{query}"),
        None => substituted,
    }
}

/// Append `query` to `url` as form-urlencoded pairs.
///
/// Uses `?` when the URL has no query yet and `&` otherwise; a URL that
/// already ends in `?` gets no extra separator. An empty map leaves the
/// URL unchanged.
pub fn append_query(url: &str, query: &IndexMap<String, Value>) -> String {
    if query.is_empty() {
        return url.to_owned();
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in query {
        serializer.append_pair(name, &value_to_url_string(value));
    }
    let encoded = serializer.finish();

    let separator = if !url.contains('?') {
        "?"
    } else if url.ends_with('?') || url.ends_with('&') {
        ""
    } else {
        "&"
    };
    format!("{url}{separator}{encoded}")
}

/// Merge `query` into `url`, then substitute path parameters.
pub fn compose_url(
    url: &str,
    query: &IndexMap<String, Value>,
    params: &IndexMap<String, Value>,
) -> String {
    set_url_params(&append_query(url, query), params)
}
