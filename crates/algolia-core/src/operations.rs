//! Account-level operations: indexes, API keys, logs, batches and multi-index queries.
//!
//! Each one only chooses a path, a verb, a body and the host class, then hands
//! over to [`SearchClient::execute_verb`].
//!
//! | Operation | Verb | Path | Hosts |
//! |-----------|------|------|-------|
//! | [`SearchClient::list_indexes`] | GET | `/1/indexes/` | query |
//! | [`SearchClient::delete_index`] | DELETE | `/1/indexes/{name}` | build |
//! | [`SearchClient::move_index`] / [`SearchClient::copy_index`] | POST | `/1/indexes/{name}/operation` | build |
//! | [`SearchClient::get_logs`] | GET | `/1/logs` | query |
//! | [`SearchClient::list_user_keys`] | GET | `/1/keys` | query |
//! | [`SearchClient::add_user_key`] | POST | `/1/keys` | build |
//! | [`SearchClient::update_user_key`] | PUT | `/1/keys/{key}` | build |
//! | [`SearchClient::multiple_queries`] | POST | `/1/indexes/*/queries` | query (search timeout) |
//! | [`SearchClient::batch`] | POST | `/1/indexes/*/batch` | build |

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::SearchClient;
use crate::dispatcher::Verb;
use crate::error::ClientError;
use crate::index::Index;
use crate::query::Query;

/// Which log stream to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    Query,
    Build,
    Error,
    #[default]
    All,
}

impl LogType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Build => "build",
            Self::Error => "error",
            Self::All => "all",
        }
    }
}

impl Display for LogType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings of a user API key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserKeyParams {
    pub acl: Vec<String>,
    /// Seconds before the key expires; 0 means never.
    pub validity: u32,
    #[serde(rename = "maxQueriesPerIPPerHour")]
    pub max_queries_per_ip_per_hour: u32,
    #[serde(rename = "maxHitsPerQuery")]
    pub max_hits_per_query: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexes: Option<Vec<String>>,
}

impl UserKeyParams {
    pub fn new<I, S>(acl: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            acl: acl.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_validity(mut self, validity: u32) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_max_queries_per_ip_per_hour(mut self, limit: u32) -> Self {
        self.max_queries_per_ip_per_hour = limit;
        self
    }

    pub fn with_max_hits_per_query(mut self, limit: u32) -> Self {
        self.max_hits_per_query = limit;
        self
    }

    pub fn with_indexes<I, S>(mut self, indexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes = Some(indexes.into_iter().map(Into::into).collect());
        self
    }
}

/// One query of a multi-index request.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
    pub index_name: String,
    pub query: Query,
}

impl IndexQuery {
    pub fn new(index_name: impl Into<String>, query: Query) -> Self {
        Self {
            index_name: index_name.into(),
            query,
        }
    }
}

/// How the service runs the queries of a multi-index request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultipleQueriesStrategy {
    /// Run every query.
    #[default]
    None,
    /// Stop once enough hits have been gathered.
    StopIfEnoughMatches,
}

impl MultipleQueriesStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::StopIfEnoughMatches => "stopIfEnoughMatches",
        }
    }
}

pub(crate) fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

impl SearchClient {
    pub async fn list_indexes(&self) -> Result<Value, ClientError> {
        self.execute_verb(Verb::Get, "/1/indexes/", false, false).await
    }

    pub async fn delete_index(&self, index_name: &str) -> Result<Value, ClientError> {
        let path = format!("/1/indexes/{}", encode_segment(index_name));
        self.execute_verb(Verb::Delete, &path, true, false).await
    }

    /// Rename `src` to `dst`, replacing `dst` if it exists.
    pub async fn move_index(&self, src: &str, dst: &str) -> Result<Value, ClientError> {
        self.index_operation(src, "move", dst).await
    }

    /// Copy `src` into `dst`, replacing `dst` if it exists.
    pub async fn copy_index(&self, src: &str, dst: &str) -> Result<Value, ClientError> {
        self.index_operation(src, "copy", dst).await
    }

    async fn index_operation(&self, src: &str, operation: &str, dst: &str) -> Result<Value, ClientError> {
        let path = format!("/1/indexes/{}/operation", encode_segment(src));
        let body = json!({ "operation": operation, "destination": dst });
        self.execute_verb(Verb::post(body.to_string()), &path, true, false)
            .await
    }

    pub fn init_index(&self, index_name: impl Into<String>) -> Index<'_> {
        Index::new(self, index_name)
    }

    /// The ten most recent log entries.
    pub async fn get_logs(&self) -> Result<Value, ClientError> {
        self.execute_verb(Verb::Get, "/1/logs", false, false).await
    }

    /// `length` entries starting at `offset` (0 is the most recent).
    pub async fn get_logs_with(&self, offset: u32, length: u32, log_type: LogType) -> Result<Value, ClientError> {
        let path = format!("/1/logs?offset={offset}&length={length}&type={log_type}");
        self.execute_verb(Verb::Get, &path, false, false).await
    }

    pub async fn list_user_keys(&self) -> Result<Value, ClientError> {
        self.execute_verb(Verb::Get, "/1/keys", false, false).await
    }

    pub async fn get_user_key_acl(&self, key: &str) -> Result<Value, ClientError> {
        let path = format!("/1/keys/{}", encode_segment(key));
        self.execute_verb(Verb::Get, &path, false, false).await
    }

    pub async fn delete_user_key(&self, key: &str) -> Result<Value, ClientError> {
        let path = format!("/1/keys/{}", encode_segment(key));
        self.execute_verb(Verb::Delete, &path, true, false).await
    }

    pub async fn add_user_key(&self, params: &UserKeyParams) -> Result<Value, ClientError> {
        let body = serde_json::to_string(params)?;
        self.execute_verb(Verb::post(body), "/1/keys", true, false).await
    }

    pub async fn update_user_key(&self, key: &str, params: &UserKeyParams) -> Result<Value, ClientError> {
        let path = format!("/1/keys/{}", encode_segment(key));
        let body = serde_json::to_string(params)?;
        self.execute_verb(Verb::put(body), &path, true, false).await
    }

    /// Run several queries, possibly on different indexes, in one call.
    pub async fn multiple_queries(
        &self,
        queries: &[IndexQuery],
        strategy: MultipleQueriesStrategy,
    ) -> Result<Value, ClientError> {
        let requests = queries
            .iter()
            .map(|entry| json!({ "indexName": entry.index_name, "params": entry.query.to_query_string() }))
            .collect::<Vec<_>>();
        let body = json!({ "requests": requests });
        let path = format!("/1/indexes/*/queries?strategy={}", strategy.as_str());
        self.execute_verb(Verb::post(body.to_string()), &path, false, true)
            .await
    }

    /// Send a list of write actions spanning any number of indexes.
    pub async fn batch(&self, actions: Vec<Value>) -> Result<Value, ClientError> {
        let body = json!({ "requests": actions });
        self.execute_verb(Verb::post(body.to_string()), "/1/indexes/*/batch", true, false)
            .await
    }
}
