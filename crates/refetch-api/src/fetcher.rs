// ── Fetcher contract ──
//
// A fetcher turns a fully-composed request into a response-like value.
// The core never talks to the network directly; it hands a `FetchRequest`
// (including the cycle's cancellation token) to whichever fetcher the
// request configuration selects.

use std::fmt;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// Pluggable transport used by the request coordinator.
///
/// Implementations must honor `request.cancel`: once the token fires the
/// returned future should resolve promptly with [`Error::Cancelled`].
pub trait Fetcher: Send + Sync + fmt::Debug {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, Result<FetchResponse, Error>>;
}

/// Request body as handed to a fetcher.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialize as JSON with the default `application/json` content type.
    Json(Value),
    /// Send verbatim; the caller supplied its own content type.
    Raw(String),
}

/// A fully-composed request: final URL, method, headers, body, and the
/// cancellation handle of the cycle that issued it.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub cancel: CancellationToken,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".into(),
            headers: Vec::new(),
            body: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response payload: either already decoded, or raw bytes to parse on demand.
#[derive(Debug, Clone)]
pub enum ResponseBody {
    Parsed(Value),
    Raw(Bytes),
}

/// A response-like value: a status code plus a body.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    status: u16,
    body: ResponseBody,
}

impl FetchResponse {
    /// A response whose payload is already decoded.
    pub fn parsed(status: u16, data: Value) -> Self {
        Self {
            status,
            body: ResponseBody::Parsed(data),
        }
    }

    /// A response carrying an undecoded body.
    pub fn raw(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: ResponseBody::Raw(body.into()),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Extract the payload.
    ///
    /// Pre-parsed data is returned as-is; raw bodies are decoded as JSON.
    /// An empty raw body decodes to `null`.
    pub fn into_payload(self) -> Result<Value, Error> {
        match self.body {
            ResponseBody::Parsed(data) => Ok(data),
            ResponseBody::Raw(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => {
                Ok(Value::Null)
            }
            ResponseBody::Raw(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                    status: Some(self.status),
                })
            }
        }
    }
}
