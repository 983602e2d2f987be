use std::time::Instant;

use serde_json::Value;

use crate::dispatcher::{Dispatcher, RequestOutcome, Verb};
use crate::error::{ClientError, HostFailure};

/// A call that succeeded on some host, possibly after soft failures on earlier ones.
#[derive(Debug, Clone)]
pub struct FailoverSuccess {
    pub data: Value,
    pub selected_host: String,
    /// Hosts contacted, in order, ending with `selected_host`.
    pub host_chain: Vec<String>,
    /// Soft failures absorbed before `selected_host` answered.
    pub failures: Vec<HostFailure>,
    pub latency_ms: u64,
}

/// Try `hosts` strictly in order until one succeeds or one fails terminally.
///
/// Soft failures are collected and, if every host fails, reported together as
/// [`ClientError::HostsUnreachable`] in host-list order. Nothing carries over
/// between calls; each call starts again at the first host.
pub async fn execute_with_failover(
    dispatcher: &Dispatcher<'_>,
    hosts: &[String],
    verb: &Verb,
    path: &str,
    is_search: bool,
) -> Result<FailoverSuccess, ClientError> {
    let started = Instant::now();
    let mut host_chain = Vec::with_capacity(hosts.len());
    let mut failures = Vec::new();

    for host in hosts {
        host_chain.push(host.clone());

        match dispatcher.attempt(host, verb, path, is_search).await {
            RequestOutcome::Success(data) => {
                if !failures.is_empty() {
                    tracing::info!(
                        host = host.as_str(),
                        failed_attempts = failures.len(),
                        "host fallback succeeded"
                    );
                }

                return Ok(FailoverSuccess {
                    data,
                    selected_host: host.clone(),
                    host_chain,
                    failures,
                    latency_ms: elapsed_ms(started),
                });
            }
            RequestOutcome::TerminalFailure(error) => return Err(error),
            RequestOutcome::SoftFailure(failure) => {
                tracing::warn!(
                    host = failure.host.as_str(),
                    reason = %failure.reason,
                    "host attempt failed, trying next host"
                );
                failures.push(failure);
            }
        }
    }

    Err(ClientError::HostsUnreachable { failures })
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use crate::config::{ClientIdentity, RequestConfig};
    use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};

    /// Answers per host, records every request it receives.
    #[derive(Debug, Default)]
    struct HostTable {
        responses: HashMap<String, Result<HttpResponse, HttpError>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl HostTable {
        fn with(mut self, host: &str, response: Result<HttpResponse, HttpError>) -> Self {
            self.responses.insert(host.to_owned(), response);
            self
        }

        fn contacted(&self) -> Vec<String> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .iter()
                .map(|request| request.url.clone())
                .collect()
        }
    }

    impl HttpClient for HostTable {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            let host = request
                .url
                .trim_start_matches("https://")
                .split('/')
                .next()
                .unwrap_or_default()
                .to_owned();
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self
                .responses
                .get(&host)
                .cloned()
                .unwrap_or_else(|| Err(HttpError::connect("unknown host")));
            Box::pin(async move { response })
        }
    }

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[tokio::test]
    async fn soft_failures_fall_through_to_the_next_host() {
        let table = HostTable::default()
            .with("a", Err(HttpError::connect("connection refused")))
            .with("b", Ok(HttpResponse::new(500, "boom")))
            .with("c", Ok(HttpResponse::ok_json(r#"{"ok":true}"#)));
        let identity = ClientIdentity::new("APPID", "key").expect("valid identity");
        let config = RequestConfig::default();
        let dispatcher = Dispatcher::new(&table, &identity, &config);

        let success = execute_with_failover(&dispatcher, &hosts(&["a", "b", "c"]), &Verb::Get, "/1/indexes/", false)
            .await
            .expect("third host answers");

        assert_eq!(success.data, serde_json::json!({"ok": true}));
        assert_eq!(success.selected_host, "c");
        assert_eq!(success.host_chain, hosts(&["a", "b", "c"]));
        let failed = success
            .failures
            .iter()
            .map(|failure| failure.host.as_str())
            .collect::<Vec<_>>();
        assert_eq!(failed, ["a", "b"]);
        assert_eq!(success.failures[1].reason.to_string(), "boom");
    }

    #[tokio::test]
    async fn client_error_stops_failover() {
        let table = HostTable::default()
            .with("a", Ok(HttpResponse::new(403, Vec::<u8>::new())))
            .with("b", Ok(HttpResponse::ok_json("{}")));
        let identity = ClientIdentity::new("APPID", "key").expect("valid identity");
        let config = RequestConfig::default();
        let dispatcher = Dispatcher::new(&table, &identity, &config);

        let error = execute_with_failover(&dispatcher, &hosts(&["a", "b"]), &Verb::Get, "/1/keys", false)
            .await
            .expect_err("403 is terminal");

        assert_eq!(error.status(), Some(403));
        assert_eq!(table.contacted(), ["https://a/1/keys"]);
    }

    #[tokio::test]
    async fn exhausted_hosts_report_every_failure() {
        let table = HostTable::default()
            .with("a", Err(HttpError::connect("refused")))
            .with("b", Err(HttpError::timeout("timed out")));
        let identity = ClientIdentity::new("APPID", "key").expect("valid identity");
        let config = RequestConfig::default();
        let dispatcher = Dispatcher::new(&table, &identity, &config);

        let error = execute_with_failover(&dispatcher, &hosts(&["a", "b"]), &Verb::Get, "/1/logs", false)
            .await
            .expect_err("no host answers");

        assert!(error.is_unreachable());
        assert_eq!(error.to_string(), "Hosts unreachable: a=refused, b=timed out");
    }
}
