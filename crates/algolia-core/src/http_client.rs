use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// HTTP verbs spoken by the search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether requests with this verb may carry an entity body.
    pub const fn accepts_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials applied to every outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpAuth {
    ApiKey {
        application_id: String,
        api_key: String,
    },
    /// Rate-limit delegation: authenticate with the admin key while the service
    /// accounts the call against the end user's IP and rate-limited key.
    Forwarded {
        application_id: String,
        admin_api_key: String,
        end_user_ip: String,
        rate_limit_api_key: String,
    },
}

impl HttpAuth {
    pub fn apply(&self, headers: &mut BTreeMap<String, String>) {
        match self {
            Self::ApiKey {
                application_id,
                api_key,
            } => {
                headers.insert(String::from("x-algolia-application-id"), application_id.clone());
                headers.insert(String::from("x-algolia-api-key"), api_key.clone());
            }
            Self::Forwarded {
                application_id,
                admin_api_key,
                end_user_ip,
                rate_limit_api_key,
            } => {
                headers.insert(String::from("x-algolia-application-id"), application_id.clone());
                headers.insert(String::from("x-algolia-api-key"), admin_api_key.clone());
                headers.insert(String::from("x-forwarded-for"), end_user_ip.clone());
                headers.insert(String::from("x-forwarded-api-key"), rate_limit_api_key.clone());
            }
        }
    }
}

/// HTTP request envelope handed to the transport for a single host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub connect_timeout_ms: u64,
    /// Socket read timeout for this request.
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            connect_timeout_ms: 2_000,
            timeout_ms: 30_000,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_auth(mut self, auth: &HttpAuth) -> Self {
        auth.apply(&mut self.headers);
        self
    }

    pub fn with_connect_timeout_ms(mut self, connect_timeout_ms: u64) -> Self {
        self.connect_timeout_ms = connect_timeout_ms;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Raw response as received from one host. The body is left undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_encoding: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_encoding: None,
            body: body.into(),
        }
    }

    pub fn ok_json(body: impl Into<String>) -> Self {
        Self::new(200, body.into())
    }

    pub fn with_content_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.content_encoding = Some(encoding.into());
        self
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    pub fn is_gzip(&self) -> bool {
        self.content_encoding
            .as_deref()
            .is_some_and(|encoding| encoding.to_ascii_lowercase().contains("gzip"))
    }
}

/// Where in the exchange a transport error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    Connect,
    Timeout,
    /// Status line received, body could not be read.
    Body,
    Other,
}

/// Transport-level HTTP error.
///
/// `status` is set once a status line has been received, so a body read
/// failure on a rejected request can still be told apart from a server error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
    kind: HttpErrorKind,
    status: Option<u16>,
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            status: None,
        }
    }

    /// Body read failure after `status` was received.
    pub fn body(status: u16, message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Body, message).with_status(status)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Connect, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Timeout, message)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Transport contract: execute one request against one host.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// Production transport backed by reqwest.
///
/// reqwest fixes the connect and read timeouts per `Client`, so a few clients
/// are kept, one per timeout pair, oldest evicted first. The read timeout
/// bounds each wait for data, not the whole exchange. Automatic decompression
/// stays off: the dispatcher inspects `Content-Encoding` itself.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    clients: Arc<Mutex<Vec<(TimeoutKey, reqwest::Client)>>>,
}

/// `(connect_timeout_ms, read_timeout_ms)`
type TimeoutKey = (u64, u64);

const MAX_CACHED_CLIENTS: usize = 4;

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn client_for(&self, request: &HttpRequest) -> Result<reqwest::Client, HttpError> {
        let key = (request.connect_timeout_ms, request.timeout_ms);
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, client)) = clients.iter().find(|(cached, _)| *cached == key) {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(key.0))
            .read_timeout(Duration::from_millis(key.1))
            .build()
            .map_err(|e| HttpError::new(HttpErrorKind::Other, format!("failed to build http client: {e}")))?;

        if clients.len() >= MAX_CACHED_CLIENTS {
            clients.remove(0);
        }
        clients.push((key, client.clone()));
        Ok(client)
    }

    #[cfg(test)]
    fn cached_clients(&self) -> usize {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let client = self.client_for(&request)?;
            let mut builder = match request.method {
                HttpMethod::Get => client.get(&request.url),
                HttpMethod::Post => client.post(&request.url),
                HttpMethod::Put => client.put(&request.url),
                HttpMethod::Delete => client.delete(&request.url),
            };

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    HttpError::timeout(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::connect(format!("connection failed: {e}"))
                } else {
                    HttpError::new(HttpErrorKind::Other, format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let content_encoding = response
                .headers()
                .get(reqwest::header::CONTENT_ENCODING)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let body = response
                .bytes()
                .await
                .map_err(|e| HttpError::body(status, format!("failed to read response body: {e}")))?;

            Ok(HttpResponse {
                status,
                content_encoding,
                body: body.to_vec(),
            })
        })
    }
}
