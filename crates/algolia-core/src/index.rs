use serde_json::{json, Value};

use crate::client::SearchClient;
use crate::dispatcher::Verb;
use crate::error::ClientError;
use crate::operations::encode_segment;
use crate::query::Query;

/// Handle on one index. Creating it makes no network call.
#[derive(Debug, Clone)]
pub struct Index<'c> {
    client: &'c SearchClient,
    name: String,
    path: String,
}

impl<'c> Index<'c> {
    pub(crate) fn new(client: &'c SearchClient, name: impl Into<String>) -> Self {
        let name = name.into();
        let path = format!("/1/indexes/{}", encode_segment(&name));
        Self { client, name, path }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Search this index. Goes to the query hosts with the search timeout.
    pub async fn search(&self, query: &Query) -> Result<Value, ClientError> {
        let body = json!({ "params": query.to_query_string() });
        self.client
            .execute_verb(Verb::post(body.to_string()), &format!("{}/query", self.path), false, true)
            .await
    }

    pub async fn get_object(&self, object_id: &str) -> Result<Value, ClientError> {
        let path = format!("{}/{}", self.path, encode_segment(object_id));
        self.client.execute_verb(Verb::Get, &path, false, false).await
    }

    /// Add an object; the service assigns its `objectID`.
    pub async fn add_object(&self, object: &Value) -> Result<Value, ClientError> {
        self.client
            .execute_verb(Verb::post(object.to_string()), &self.path, true, false)
            .await
    }

    pub async fn delete_object(&self, object_id: &str) -> Result<Value, ClientError> {
        if object_id.is_empty() {
            return Err(ClientError::configuration("objectID cannot be empty"));
        }
        let path = format!("{}/{}", self.path, encode_segment(object_id));
        self.client.execute_verb(Verb::Delete, &path, true, false).await
    }

    pub async fn get_settings(&self) -> Result<Value, ClientError> {
        let path = format!("{}/settings", self.path);
        self.client.execute_verb(Verb::Get, &path, false, false).await
    }

    pub async fn set_settings(&self, settings: &Value) -> Result<Value, ClientError> {
        let path = format!("{}/settings", self.path);
        self.client
            .execute_verb(Verb::put(settings.to_string()), &path, true, false)
            .await
    }

    /// Delete every object, keeping settings.
    pub async fn clear(&self) -> Result<Value, ClientError> {
        let path = format!("{}/clear", self.path);
        self.client.execute_verb(Verb::Post(None), &path, true, false).await
    }
}
