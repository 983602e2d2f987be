//! Scripted in-memory transport shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use algolia_core::{HttpClient, HttpError, HttpRequest, HttpResponse, SearchClient};

/// What a host does when contacted.
#[derive(Debug, Clone)]
pub enum HostBehavior {
    Respond(HttpResponse),
    Fail(HttpError),
    /// Answer after `delay`, unless the request's read timeout expires first.
    Stall { delay: Duration, then: HttpResponse },
}

#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    behaviors: HashMap<String, HostBehavior>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: &str, behavior: HostBehavior) -> Self {
        self.behaviors.insert(host.to_owned(), behavior);
        self
    }

    pub fn ok(self, host: &str, body: &str) -> Self {
        self.host(host, HostBehavior::Respond(HttpResponse::ok_json(body)))
    }

    pub fn status(self, host: &str, status: u16, body: &str) -> Self {
        self.host(host, HostBehavior::Respond(HttpResponse::new(status, body)))
    }

    pub fn unreachable(self, host: &str) -> Self {
        self.host(
            host,
            HostBehavior::Fail(HttpError::connect(format!("connection refused by {host}"))),
        )
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests()
            .pop()
            .expect("at least one request should have been sent")
    }

    pub fn contacted_hosts(&self) -> Vec<String> {
        self.requests().iter().map(|request| host_of(&request.url)).collect()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let host = host_of(&request.url);
        let read_timeout = Duration::from_millis(request.timeout_ms);
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);
        let behavior = self.behaviors.get(&host).cloned();

        Box::pin(async move {
            match behavior {
                Some(HostBehavior::Respond(response)) => Ok(response),
                Some(HostBehavior::Fail(error)) => Err(error),
                Some(HostBehavior::Stall { delay, then }) => {
                    match tokio::time::timeout(read_timeout, tokio::time::sleep(delay)).await {
                        Ok(()) => Ok(then),
                        Err(_) => Err(HttpError::timeout(format!("read timed out after {read_timeout:?}"))),
                    }
                }
                None => Err(HttpError::connect(format!("unknown host {host}"))),
            }
        })
    }
}

pub fn host_of(url: &str) -> String {
    url.trim_start_matches("https://")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_owned()
}

pub fn hosts(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

/// Client over `build`/`query` hosts wired to `transport`.
pub fn client_with(
    transport: &Arc<ScriptedHttpClient>,
    build: &[&str],
    query: &[&str],
) -> SearchClient {
    SearchClient::builder()
        .with_credentials("APPID", "api-key")
        .with_build_and_query_hosts(hosts(build), hosts(query))
        .with_http_client(transport.clone())
        .build()
        .expect("valid client")
}
