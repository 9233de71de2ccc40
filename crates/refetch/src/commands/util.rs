//! Shared helpers for command handlers.

use serde_json::Value;

use refetch_core::RequestConfig;

use crate::cli::RequestArgs;
use crate::error::CliError;

/// Split `NAME<sep>VALUE`, trimming whitespace around both halves.
pub fn split_pair<'a>(raw: &'a str, sep: char, flag: &str) -> Result<(&'a str, &'a str), CliError> {
    match raw.split_once(sep) {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value.trim())),
        _ => Err(CliError::Validation {
            field: flag.into(),
            reason: format!("expected NAME{sep}VALUE, got '{raw}'"),
        }),
    }
}

/// Parse `raw` as JSON, falling back to a plain string.
pub fn json_or_string(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Translate request flags into a `RequestConfig`.
pub fn request_config(args: &RequestArgs) -> Result<RequestConfig, CliError> {
    let mut config = RequestConfig::new().with_method(args.method.to_uppercase());

    for raw in &args.query {
        let (name, value) = split_pair(raw, '=', "--query")?;
        config = config.with_query(name, value);
    }
    for raw in &args.param {
        let (name, value) = split_pair(raw, '=', "--param")?;
        config = config.with_param(name, value);
    }
    for raw in &args.header {
        let (name, value) = split_pair(raw, ':', "--header")?;
        config = config.with_header(name, value);
    }

    if let Some(ref body) = args.body {
        let body: Value = serde_json::from_str(body).map_err(|e| CliError::Validation {
            field: "--body".into(),
            reason: format!("not valid JSON: {e}"),
        })?;
        config = config.with_body(body);
    }
    if let Some(ref key) = args.key {
        config = config.with_key(json_or_string(key));
    }

    Ok(config)
}
