// Shared helpers for refetch-core integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::Value;

use refetch_api::{Error, FetchRequest, FetchResponse, Fetcher};
use refetch_core::{RequestConfig, Revalidator, RevalidatorConfig};

/// What a scripted fetch resolves to.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A response with this status and pre-parsed payload.
    Ok(u16, Value),
    /// A rejected fetch, with a status if the failure carries one.
    Fail(Option<u16>),
}

/// Fetcher that replays a queue of delayed replies and records every
/// request it receives. Honors cancellation.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<(Duration, Reply)>>,
    fallback: Mutex<Option<(Duration, Reply)>>,
    calls: Mutex<Vec<FetchRequest>>,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue one reply, delivered after `delay_ms`.
    pub fn push(&self, delay_ms: u64, reply: Reply) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push_back((Duration::from_millis(delay_ms), reply));
        self
    }

    /// Reply used once the queue is exhausted.
    pub fn always(&self, delay_ms: u64, reply: Reply) -> &Self {
        *self.fallback.lock().unwrap() = Some((Duration::from_millis(delay_ms), reply));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self) -> (Duration, Reply) {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback.lock().unwrap().clone())
            .unwrap_or((Duration::ZERO, Reply::Ok(200, Value::Null)))
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, Result<FetchResponse, Error>> {
        let (delay, reply) = self.next();
        let cancel = request.cancel.clone();
        self.calls.lock().unwrap().push(request);

        Box::pin(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => Err(Error::Cancelled),
                () = tokio::time::sleep(delay) => match reply {
                    Reply::Ok(status, data) => Ok(FetchResponse::parsed(status, data)),
                    Reply::Fail(Some(status)) => Err(Error::Http {
                        status,
                        message: "scripted failure".into(),
                    }),
                    Reply::Fail(None) => Err(Error::Timeout { timeout_secs: 30 }),
                },
            }
        })
    }
}

pub fn revalidator(fetcher: &Arc<ScriptedFetcher>) -> Revalidator {
    Revalidator::with_fetcher(RevalidatorConfig::default(), fetcher.clone())
}

/// A config that never fetches on its own.
pub fn manual() -> RequestConfig {
    RequestConfig::new().with_auto(false)
}

/// Let spawned tasks run without advancing the paused clock.
pub async fn settle_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
