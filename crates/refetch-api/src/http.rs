// Default fetcher backed by `reqwest`.
//
// Resolves the locator against the transport's base URL, applies the
// request's method, headers, and body, and races the whole exchange
// against the cycle's cancellation token.

use futures_util::future::BoxFuture;
use reqwest::Method;
use tracing::{debug, trace};

use crate::error::Error;
use crate::fetcher::{FetchRequest, FetchResponse, Fetcher, RequestBody};
use crate::transport::TransportConfig;

/// HTTP fetcher used when a request configuration does not supply its own.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    transport: TransportConfig,
}

impl HttpFetcher {
    /// Create a fetcher from a `TransportConfig`.
    pub fn new(transport: TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, transport })
    }

    async fn execute(&self, request: FetchRequest) -> Result<FetchResponse, Error> {
        let url = self.transport.resolve(&request.url)?;
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::Client(format!("invalid method '{}': {e}", request.method)))?;

        debug!("{} {}", method, url);

        let mut builder = self.http.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(RequestBody::Json(ref body)) => builder.json(body),
            Some(RequestBody::Raw(ref body)) => builder.body(body.clone()),
            None => builder,
        };

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.transport.timeout.as_secs(),
                }
            } else {
                Error::Transport(e)
            }
        })?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(Error::Transport)?;
        trace!(status, bytes = body.len(), "response received");

        Ok(FetchResponse::raw(status, body))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, Result<FetchResponse, Error>> {
        Box::pin(async move {
            let cancel = request.cancel.clone();
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            tokio::select! {
                biased;
                () = cancel.cancelled() => Err(Error::Cancelled),
                result = self.execute(request) => result,
            }
        })
    }
}
