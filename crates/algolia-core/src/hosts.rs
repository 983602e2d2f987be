use crate::error::ClientError;

/// TLS feature level of the runtime, decided once at startup.
///
/// Hosts on the modern fallback domain are only reachable with SNI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsCapability {
    #[default]
    Sni,
    LegacyNoSni,
}

impl TlsCapability {
    /// The TLS stacks reqwest links against always send SNI.
    pub fn probe() -> Self {
        Self::Sni
    }

    pub const fn fallback_domain(self) -> &'static str {
        match self {
            Self::Sni => "algolianet.com",
            Self::LegacyNoSni => "algolia.net",
        }
    }
}

/// Ordered build and query host lists. Order is failover priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSet {
    build_hosts: Vec<String>,
    query_hosts: Vec<String>,
}

impl HostSet {
    pub fn new(build_hosts: Vec<String>, query_hosts: Vec<String>) -> Result<Self, ClientError> {
        if build_hosts.is_empty() || query_hosts.is_empty() {
            return Err(ClientError::configuration(
                "a non-empty list of build hosts and query hosts is required",
            ));
        }
        if build_hosts.iter().chain(&query_hosts).any(|host| host.trim().is_empty()) {
            return Err(ClientError::configuration("host names cannot be empty"));
        }

        Ok(Self {
            build_hosts,
            query_hosts,
        })
    }

    /// Same list for reads and writes.
    pub fn uniform(hosts: Vec<String>) -> Result<Self, ClientError> {
        Self::new(hosts.clone(), hosts)
    }

    /// Dedicated primary hosts followed by three fallback hosts.
    pub fn default_for(application_id: &str, capability: TlsCapability) -> Self {
        let domain = capability.fallback_domain();
        let fallbacks = (1..=3)
            .map(|n| format!("{application_id}-{n}.{domain}"))
            .collect::<Vec<_>>();

        let mut build_hosts = vec![format!("{application_id}.algolia.net")];
        build_hosts.extend(fallbacks.iter().cloned());
        let mut query_hosts = vec![format!("{application_id}-dsn.algolia.net")];
        query_hosts.extend(fallbacks);

        Self {
            build_hosts,
            query_hosts,
        }
    }

    pub fn hosts_for(&self, is_build: bool) -> &[String] {
        if is_build {
            &self.build_hosts
        } else {
            &self.query_hosts
        }
    }

    pub fn build_hosts(&self) -> &[String] {
        &self.build_hosts
    }

    pub fn query_hosts(&self) -> &[String] {
        &self.query_hosts
    }
}
