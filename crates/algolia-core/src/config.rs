use std::collections::BTreeMap;

use crate::error::ClientError;
use crate::http_client::HttpAuth;

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_SOCKET_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SEARCH_SOCKET_TIMEOUT_MS: u64 = 5_000;

const USER_AGENT_PREFIX: &str = "Algolia for Rust";

/// Connect and read timeouts applied to each host attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutProfile {
    pub connect_timeout_ms: u64,
    pub socket_timeout_ms: u64,
    /// Read timeout for latency-sensitive search calls.
    pub search_socket_timeout_ms: u64,
}

impl Default for TimeoutProfile {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            socket_timeout_ms: DEFAULT_SOCKET_TIMEOUT_MS,
            search_socket_timeout_ms: DEFAULT_SEARCH_SOCKET_TIMEOUT_MS,
        }
    }
}

impl TimeoutProfile {
    pub const fn read_timeout_ms(&self, is_search: bool) -> u64 {
        if is_search {
            self.search_socket_timeout_ms
        } else {
            self.socket_timeout_ms
        }
    }
}

/// Rate-limit delegation credentials. Set and cleared as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingContext {
    pub admin_api_key: String,
    pub end_user_ip: String,
    pub rate_limit_api_key: String,
}

impl ForwardingContext {
    pub fn new(
        admin_api_key: impl Into<String>,
        end_user_ip: impl Into<String>,
        rate_limit_api_key: impl Into<String>,
    ) -> Self {
        Self {
            admin_api_key: admin_api_key.into(),
            end_user_ip: end_user_ip.into(),
            rate_limit_api_key: rate_limit_api_key.into(),
        }
    }
}

/// Immutable application id / API key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    application_id: String,
    api_key: String,
}

impl ClientIdentity {
    pub fn new(
        application_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let application_id = application_id.into();
        let api_key = api_key.into();
        if application_id.is_empty() {
            return Err(ClientError::configuration("an application ID is required"));
        }
        if api_key.is_empty() {
            return Err(ClientError::configuration("an API key is required"));
        }

        Ok(Self {
            application_id,
            api_key,
        })
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Mutable per-client settings, copied once at the start of every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub timeouts: TimeoutProfile,
    pub forwarding: Option<ForwardingContext>,
    pub extra_headers: BTreeMap<String, String>,
    pub user_agent: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeouts: TimeoutProfile::default(),
            forwarding: None,
            extra_headers: BTreeMap::new(),
            user_agent: default_user_agent(),
        }
    }
}

impl RequestConfig {
    pub fn auth(&self, identity: &ClientIdentity) -> HttpAuth {
        match &self.forwarding {
            Some(forwarding) => HttpAuth::Forwarded {
                application_id: identity.application_id().to_owned(),
                admin_api_key: forwarding.admin_api_key.clone(),
                end_user_ip: forwarding.end_user_ip.clone(),
                rate_limit_api_key: forwarding.rate_limit_api_key.clone(),
            },
            None => HttpAuth::ApiKey {
                application_id: identity.application_id().to_owned(),
                api_key: identity.api_key().to_owned(),
            },
        }
    }

    pub fn set_user_agent_suffix(&mut self, name: &str, version: &str) {
        self.user_agent = format!("{} {name} ({version})", default_user_agent());
    }
}

pub fn default_user_agent() -> String {
    format!("{USER_AGENT_PREFIX} {}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_calls_use_the_search_read_timeout() {
        let timeouts = TimeoutProfile::default();
        assert_eq!(timeouts.read_timeout_ms(true), 5_000);
        assert_eq!(timeouts.read_timeout_ms(false), 30_000);
        assert_eq!(timeouts.connect_timeout_ms, 2_000);
    }

    #[test]
    fn identity_requires_both_fields() {
        assert!(ClientIdentity::new("", "key").is_err());
        assert!(ClientIdentity::new("APPID", "").is_err());
        assert!(ClientIdentity::new("APPID", "key").is_ok());
    }

    #[test]
    fn auth_switches_with_forwarding() {
        let identity = ClientIdentity::new("APPID", "key").expect("valid identity");
        let mut config = RequestConfig::default();
        assert!(matches!(config.auth(&identity), HttpAuth::ApiKey { .. }));

        config.forwarding = Some(ForwardingContext::new("admin", "10.0.0.1", "limited"));
        assert!(matches!(config.auth(&identity), HttpAuth::Forwarded { .. }));
    }

    #[test]
    fn user_agent_suffix_names_the_integration() {
        let mut config = RequestConfig::default();
        config.set_user_agent_suffix("magento", "2.1.0");
        assert_eq!(
            config.user_agent,
            format!("Algolia for Rust {} magento (2.1.0)", env!("CARGO_PKG_VERSION"))
        );
    }
}
