use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Why a single host attempt failed without ending the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Connection refused, DNS failure, timeout and friends.
    Transport(String),
    /// Non-2xx, non-4xx status. `body` is empty when nothing could be read.
    Status { status: u16, body: String },
    /// The response arrived but its body could not be read or decompressed.
    Body(String),
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) | Self::Body(message) => f.write_str(message),
            Self::Status { status, body } if body.is_empty() => write!(f, "{status}"),
            Self::Status { body, .. } => f.write_str(body),
        }
    }
}

/// A soft failure recorded against one host during failover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFailure {
    pub host: String,
    pub reason: FailureReason,
}

impl HostFailure {
    pub fn new(host: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            host: host.into(),
            reason,
        }
    }
}

impl Display for HostFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.host, self.reason)
    }
}

/// Every unsuccessful client call ends in exactly one of these.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing identity, empty host list, unusable signing key.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The service rejected the request (HTTP 4xx). Never retried on another host.
    #[error("{message} (status {status})")]
    Api { status: u16, message: String },

    /// A 2xx response whose body is not valid UTF-8 JSON.
    #[error("JSON decode error: {0}")]
    MalformedResponse(String),

    #[error("Hosts unreachable: {}", join_failures(.failures))]
    HostsUnreachable { failures: Vec<HostFailure> },

    #[error("method {method} cannot enclose a request body")]
    BodyNotAllowed { method: &'static str },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// HTTP status carried by a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` when the request itself was invalid ("your request is wrong").
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// `true` when no host could serve the call ("the service was unreachable").
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::HostsUnreachable { .. })
    }

    pub fn host_failures(&self) -> &[HostFailure] {
        match self {
            Self::HostsUnreachable { failures } => failures,
            _ => &[],
        }
    }
}

fn join_failures(failures: &[HostFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
