//! One request against one host, and the classification of what came back.
//!
//! | Outcome | Meaning | Failover |
//! |---------|---------|----------|
//! | [`RequestOutcome::Success`] | 2xx with a JSON body | stop |
//! | [`RequestOutcome::SoftFailure`] | transport error, 5xx/3xx, unreadable body | next host |
//! | [`RequestOutcome::TerminalFailure`] | 4xx (even with an unreadable body), malformed 2xx body | stop |

use std::io::Read;

use flate2::read::GzDecoder;
use serde_json::Value;

use crate::config::{ClientIdentity, RequestConfig};
use crate::error::{ClientError, FailureReason, HostFailure};
use crate::http_client::{HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse};

/// Request verb together with its body slot. Bodiless verbs cannot hold one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Get,
    Delete,
    Post(Option<String>),
    Put(Option<String>),
}

impl Verb {
    /// Pair a method with an optional JSON body, rejecting a body on GET/DELETE.
    pub fn new(method: HttpMethod, body: Option<String>) -> Result<Self, ClientError> {
        match (method, body) {
            (HttpMethod::Get, None) => Ok(Self::Get),
            (HttpMethod::Delete, None) => Ok(Self::Delete),
            (HttpMethod::Post, body) => Ok(Self::Post(body)),
            (HttpMethod::Put, body) => Ok(Self::Put(body)),
            (method, Some(_)) => Err(ClientError::BodyNotAllowed {
                method: method.as_str(),
            }),
        }
    }

    pub fn post(body: impl Into<String>) -> Self {
        Self::Post(Some(body.into()))
    }

    pub fn put(body: impl Into<String>) -> Self {
        Self::Put(Some(body.into()))
    }

    pub const fn method(&self) -> HttpMethod {
        match self {
            Self::Get => HttpMethod::Get,
            Self::Delete => HttpMethod::Delete,
            Self::Post(_) => HttpMethod::Post,
            Self::Put(_) => HttpMethod::Put,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Post(body) | Self::Put(body) => body.as_deref(),
            Self::Get | Self::Delete => None,
        }
    }
}

/// Result of a single host attempt.
#[derive(Debug)]
pub enum RequestOutcome {
    Success(Value),
    SoftFailure(HostFailure),
    TerminalFailure(ClientError),
}

/// Builds and sends requests for one call, using a fixed configuration snapshot.
pub struct Dispatcher<'a> {
    http: &'a dyn HttpClient,
    identity: &'a ClientIdentity,
    config: &'a RequestConfig,
}

impl<'a> Dispatcher<'a> {
    pub fn new(http: &'a dyn HttpClient, identity: &'a ClientIdentity, config: &'a RequestConfig) -> Self {
        Self {
            http,
            identity,
            config,
        }
    }

    pub fn build_request(&self, host: &str, verb: &Verb, path: &str, is_search: bool) -> HttpRequest {
        let timeouts = self.config.timeouts;
        let mut request = HttpRequest::new(verb.method(), format!("https://{host}{path}"))
            .with_header("Accept-Encoding", "gzip")
            .with_auth(&self.config.auth(self.identity))
            .with_connect_timeout_ms(timeouts.connect_timeout_ms)
            .with_timeout_ms(timeouts.read_timeout_ms(is_search));

        for (name, value) in &self.config.extra_headers {
            request = request.with_header(name.as_str(), value.as_str());
        }
        request = request.with_header("User-Agent", self.config.user_agent.as_str());

        if let Some(body) = verb.body() {
            request = request
                .with_header("Content-Type", "application/json; charset=utf-8")
                .with_body(body);
        }
        request
    }

    pub async fn attempt(&self, host: &str, verb: &Verb, path: &str, is_search: bool) -> RequestOutcome {
        let request = self.build_request(host, verb, path, is_search);
        tracing::debug!(
            host,
            method = %verb.method(),
            path,
            timeout_ms = request.timeout_ms,
            "dispatching request"
        );

        match self.http.execute(request).await {
            Ok(response) => classify(host, response),
            Err(error) => classify_error(host, &error),
        }
    }
}

/// Map a transport error to an outcome.
///
/// A 4xx whose body could not be read is still a rejection and ends the call
/// with the default message for its status.
pub fn classify_error(host: &str, error: &HttpError) -> RequestOutcome {
    match (error.kind(), error.status()) {
        (HttpErrorKind::Body, Some(status)) if (400..500).contains(&status) => {
            tracing::debug!(host, status, "request rejected by service, body unreadable");
            RequestOutcome::TerminalFailure(ClientError::Api {
                status,
                message: default_client_error_message(status).to_owned(),
            })
        }
        (HttpErrorKind::Body, _) => RequestOutcome::SoftFailure(HostFailure::new(
            host,
            FailureReason::Body(error.message().to_owned()),
        )),
        _ => RequestOutcome::SoftFailure(HostFailure::new(
            host,
            FailureReason::Transport(error.message().to_owned()),
        )),
    }
}

/// Map a received response to an outcome. Consumes the response.
pub fn classify(host: &str, response: HttpResponse) -> RequestOutcome {
    let status = response.status;

    if response.is_client_error() {
        let text = decoded_text(&response).unwrap_or_default();
        let message = if text.is_empty() {
            default_client_error_message(status).to_owned()
        } else {
            text
        };
        tracing::debug!(host, status, "request rejected by service");
        return RequestOutcome::TerminalFailure(ClientError::Api { status, message });
    }

    if !response.is_success() {
        let body = decoded_text(&response).unwrap_or_default();
        return RequestOutcome::SoftFailure(HostFailure::new(
            host,
            FailureReason::Status { status, body },
        ));
    }

    let bytes = match decompress(&response) {
        Ok(bytes) => bytes,
        Err(error) => {
            return RequestOutcome::SoftFailure(HostFailure::new(
                host,
                FailureReason::Body(format!("failed to decompress response body: {error}")),
            ));
        }
    };

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(error) => {
            return RequestOutcome::TerminalFailure(ClientError::MalformedResponse(error.to_string()));
        }
    };

    match serde_json::from_str(&text) {
        Ok(value) => RequestOutcome::Success(value),
        Err(error) => RequestOutcome::TerminalFailure(ClientError::MalformedResponse(error.to_string())),
    }
}

pub fn default_client_error_message(status: u16) -> &'static str {
    match status {
        400 => "Bad request",
        403 => "Invalid Application-ID or API-Key",
        404 => "Resource does not exist",
        _ => "Error",
    }
}

fn decompress(response: &HttpResponse) -> std::io::Result<Vec<u8>> {
    if !response.is_gzip() {
        return Ok(response.body.clone());
    }

    let mut decoder = GzDecoder::new(response.body.as_slice());
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

fn decoded_text(response: &HttpResponse) -> Option<String> {
    decompress(response)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}
