use std::env;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::config::{ClientIdentity, ForwardingContext, RequestConfig, TimeoutProfile};
use crate::dispatcher::{Dispatcher, Verb};
use crate::error::ClientError;
use crate::failover::{execute_with_failover, FailoverSuccess};
use crate::hosts::{HostSet, TlsCapability};
use crate::http_client::{HttpClient, HttpMethod, ReqwestHttpClient};
use crate::query::Query;
use crate::signer;

/// Entry point for every call to the search service.
///
/// Identity and hosts are fixed at construction. Timeouts, forwarding, extra
/// headers and the user agent can change at any time; each call works on a
/// snapshot taken when it starts, so a change made while a call is in flight
/// only affects later calls.
pub struct SearchClient {
    identity: ClientIdentity,
    hosts: HostSet,
    http: Arc<dyn HttpClient>,
    config: RwLock<RequestConfig>,
}

impl Debug for SearchClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("application_id", &self.identity.application_id())
            .field("hosts", &self.hosts)
            .finish_non_exhaustive()
    }
}

impl SearchClient {
    /// Client using the default dedicated and fallback hosts for `application_id`.
    pub fn new(application_id: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ClientError> {
        SearchClientBuilder::new()
            .with_credentials(application_id, api_key)
            .build()
    }

    /// Client using one host list for both reads and writes.
    pub fn with_hosts(
        application_id: impl Into<String>,
        api_key: impl Into<String>,
        hosts: Vec<String>,
    ) -> Result<Self, ClientError> {
        SearchClientBuilder::new()
            .with_credentials(application_id, api_key)
            .with_hosts(hosts)
            .build()
    }

    pub fn with_build_and_query_hosts(
        application_id: impl Into<String>,
        api_key: impl Into<String>,
        build_hosts: Vec<String>,
        query_hosts: Vec<String>,
    ) -> Result<Self, ClientError> {
        SearchClientBuilder::new()
            .with_credentials(application_id, api_key)
            .with_build_and_query_hosts(build_hosts, query_hosts)
            .build()
    }

    pub fn builder() -> SearchClientBuilder {
        SearchClientBuilder::new()
    }

    pub fn application_id(&self) -> &str {
        self.identity.application_id()
    }

    pub fn hosts(&self) -> &HostSet {
        &self.hosts
    }

    /// Copy of the configuration the next call will use.
    pub fn config_snapshot(&self) -> RequestConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_config(&self, update: impl FnOnce(&mut RequestConfig)) {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut config);
    }

    /// Set the connect and general socket timeouts, in milliseconds.
    pub fn set_timeouts(&self, connect_timeout_ms: u64, socket_timeout_ms: u64) {
        self.update_config(|config| {
            config.timeouts.connect_timeout_ms = connect_timeout_ms;
            config.timeouts.socket_timeout_ms = socket_timeout_ms;
        });
    }

    /// Set the socket timeout used by search calls, in milliseconds.
    pub fn set_search_timeout(&self, search_socket_timeout_ms: u64) {
        self.update_config(|config| config.timeouts.search_socket_timeout_ms = search_socket_timeout_ms);
    }

    pub fn timeouts(&self) -> TimeoutProfile {
        self.config_snapshot().timeouts
    }

    /// Authenticate with `admin_api_key` and have the service rate-limit the
    /// call as coming from `end_user_ip` with `rate_limit_api_key`.
    pub fn enable_request_forwarding(
        &self,
        admin_api_key: impl Into<String>,
        end_user_ip: impl Into<String>,
        rate_limit_api_key: impl Into<String>,
    ) {
        let forwarding = ForwardingContext::new(admin_api_key, end_user_ip, rate_limit_api_key);
        self.update_config(|config| config.forwarding = Some(forwarding));
    }

    pub fn disable_request_forwarding(&self) {
        self.update_config(|config| config.forwarding = None);
    }

    /// Add a header to every request. A later value for the same name wins.
    pub fn set_extra_header(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        self.update_config(|config| {
            config.extra_headers.insert(name, value);
        });
    }

    /// Append an integration name and version to the user agent.
    pub fn set_user_agent_suffix(&self, name: &str, version: &str) {
        self.update_config(|config| config.set_user_agent_suffix(name, version));
    }

    /// Run one call with host failover.
    ///
    /// `is_build` selects the build hosts instead of the query hosts and
    /// `is_search` selects the shorter search read timeout. A body on GET or
    /// DELETE is rejected before any host is contacted.
    pub async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        json_body: Option<String>,
        is_build: bool,
        is_search: bool,
    ) -> Result<Value, ClientError> {
        let verb = Verb::new(method, json_body)?;
        self.execute_verb(verb, path, is_build, is_search).await
    }

    pub async fn execute_verb(
        &self,
        verb: Verb,
        path: &str,
        is_build: bool,
        is_search: bool,
    ) -> Result<Value, ClientError> {
        self.execute_with_report(verb, path, is_build, is_search)
            .await
            .map(|success| success.data)
    }

    /// Like [`SearchClient::execute_verb`], keeping which host answered and
    /// which hosts failed before it.
    pub async fn execute_with_report(
        &self,
        verb: Verb,
        path: &str,
        is_build: bool,
        is_search: bool,
    ) -> Result<FailoverSuccess, ClientError> {
        let config = self.config_snapshot();
        let dispatcher = Dispatcher::new(self.http.as_ref(), &self.identity, &config);
        execute_with_failover(&dispatcher, self.hosts.hosts_for(is_build), &verb, path, is_search).await
    }

    /// See [`signer::generate_secured_api_key`].
    pub fn generate_secured_api_key(
        &self,
        private_api_key: &str,
        query: &Query,
        user_token: Option<&str>,
    ) -> Result<String, ClientError> {
        signer::generate_secured_api_key(private_api_key, query, user_token)
    }

    /// See [`signer::generate_secured_api_key_from_tag_filters`].
    pub fn generate_secured_api_key_from_tag_filters(
        &self,
        private_api_key: &str,
        tag_filters: &str,
        user_token: Option<&str>,
    ) -> Result<String, ClientError> {
        signer::generate_secured_api_key_from_tag_filters(private_api_key, tag_filters, user_token)
    }
}

#[derive(Debug, Clone, Default)]
enum HostChoice {
    #[default]
    Default,
    Uniform(Vec<String>),
    Split {
        build: Vec<String>,
        query: Vec<String>,
    },
}

/// Builder for [`SearchClient`].
///
/// # Environment Variables
///
/// | Setting | Primary Env Var | Fallback Env Var |
/// |---------|-----------------|------------------|
/// | Application ID | `ALGOLIA_APPLICATION_ID` | `ALGOLIA_APP_ID` |
/// | API key | `ALGOLIA_API_KEY` | - |
///
/// # Example
///
/// ```rust,ignore
/// use algolia_core::SearchClientBuilder;
///
/// let client = SearchClientBuilder::new()
///     .from_env()
///     .with_timeouts(1_000, 10_000)
///     .build()?;
/// ```
#[derive(Default)]
pub struct SearchClientBuilder {
    application_id: Option<String>,
    api_key: Option<String>,
    hosts: HostChoice,
    tls_capability: Option<TlsCapability>,
    timeouts: TimeoutProfile,
    user_agent_suffix: Option<(String, String)>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl SearchClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, application_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self.api_key = Some(api_key.into());
        self
    }

    /// Read credentials from the environment. Unset variables leave the
    /// current values untouched.
    pub fn from_env(mut self) -> Self {
        if let Ok(application_id) =
            env::var("ALGOLIA_APPLICATION_ID").or_else(|_| env::var("ALGOLIA_APP_ID"))
        {
            self.application_id = Some(application_id);
        }
        if let Ok(api_key) = env::var("ALGOLIA_API_KEY") {
            self.api_key = Some(api_key);
        }
        self
    }

    pub fn with_hosts(mut self, hosts: Vec<String>) -> Self {
        self.hosts = HostChoice::Uniform(hosts);
        self
    }

    pub fn with_build_and_query_hosts(mut self, build_hosts: Vec<String>, query_hosts: Vec<String>) -> Self {
        self.hosts = HostChoice::Split {
            build: build_hosts,
            query: query_hosts,
        };
        self
    }

    /// Override the probed TLS capability used to pick the fallback domain.
    pub fn with_tls_capability(mut self, capability: TlsCapability) -> Self {
        self.tls_capability = Some(capability);
        self
    }

    pub fn with_timeouts(mut self, connect_timeout_ms: u64, socket_timeout_ms: u64) -> Self {
        self.timeouts.connect_timeout_ms = connect_timeout_ms;
        self.timeouts.socket_timeout_ms = socket_timeout_ms;
        self
    }

    pub fn with_search_timeout(mut self, search_socket_timeout_ms: u64) -> Self {
        self.timeouts.search_socket_timeout_ms = search_socket_timeout_ms;
        self
    }

    pub fn with_user_agent_suffix(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.user_agent_suffix = Some((name.into(), version.into()));
        self
    }

    /// Replace the reqwest transport, e.g. with an in-memory one in tests.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn build(self) -> Result<SearchClient, ClientError> {
        let identity = ClientIdentity::new(
            self.application_id.unwrap_or_default(),
            self.api_key.unwrap_or_default(),
        )?;

        let hosts = match self.hosts {
            HostChoice::Default => {
                let capability = self.tls_capability.unwrap_or_else(TlsCapability::probe);
                HostSet::default_for(identity.application_id(), capability)
            }
            HostChoice::Uniform(hosts) => HostSet::uniform(hosts)?,
            HostChoice::Split { build, query } => HostSet::new(build, query)?,
        };

        let mut config = RequestConfig {
            timeouts: self.timeouts,
            ..RequestConfig::default()
        };
        if let Some((name, version)) = &self.user_agent_suffix {
            config.set_user_agent_suffix(name, version);
        }

        let http = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));

        tracing::debug!(
            application_id = identity.application_id(),
            build_hosts = hosts.build_hosts().len(),
            query_hosts = hosts.query_hosts().len(),
            "search client configured"
        );

        Ok(SearchClient {
            identity,
            hosts,
            http,
            config: RwLock::new(config),
        })
    }
}
