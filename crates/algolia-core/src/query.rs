//! Search parameters and their URL query-string form.
//!
//! Values keep their JSON shape until encoding. Scalars are embedded as
//! text, arrays and objects as compact JSON, so
//! `attributesToRetrieve=["title","url"]` travels as
//! `attributesToRetrieve=%5B%22title%22%2C%22url%22%5D`.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde_json::Value;

use crate::error::ClientError;

const USER_TOKEN: &str = "userToken";

/// A set of search parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    params: BTreeMap<String, Value>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full-text query.
    pub fn query(self, text: impl Into<String>) -> Self {
        self.set("query", text.into())
    }

    pub fn tag_filters(self, tag_filters: impl Into<String>) -> Self {
        self.set("tagFilters", tag_filters.into())
    }

    pub fn filters(self, filters: impl Into<String>) -> Self {
        self.set("filters", filters.into())
    }

    pub fn numeric_filters(self, numeric_filters: impl Into<String>) -> Self {
        self.set("numericFilters", numeric_filters.into())
    }

    pub fn hits_per_page(self, hits_per_page: u32) -> Self {
        self.set("hitsPerPage", hits_per_page)
    }

    pub fn page(self, page: u32) -> Self {
        self.set("page", page)
    }

    pub fn attributes_to_retrieve<I, S>(self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attributes = attributes.into_iter().map(Into::into).collect::<Vec<String>>();
        self.set("attributesToRetrieve", attributes)
    }

    /// Scope the query to one end user. Replaces any previous token.
    pub fn user_token(self, user_token: impl Into<String>) -> Self {
        self.set(USER_TOKEN, user_token.into())
    }

    /// Set an arbitrary parameter. `null` values are dropped on encoding.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.params.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters rendered as the text each one takes on the wire.
    pub fn to_string_params(&self) -> BTreeMap<String, String> {
        self.params
            .iter()
            .filter_map(|(name, value)| param_text(value).map(|text| (name.clone(), text)))
            .collect()
    }

    pub fn to_query_string(&self) -> String {
        self.to_string_params()
            .iter()
            .map(|(name, text)| {
                format!("{}={}", urlencoding::encode(name), urlencoding::encode(text))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

fn param_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Parse an encoded query string back into its parameters.
///
/// `+` is read as a space so strings produced by form encoders decode too.
pub fn decode_query_string(encoded: &str) -> Result<BTreeMap<String, String>, ClientError> {
    let mut params = BTreeMap::new();
    for pair in encoded.split('&').filter(|pair| !pair.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(decode_component(name)?, decode_component(value)?);
    }
    Ok(params)
}

fn decode_component(component: &str) -> Result<String, ClientError> {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ClientError::configuration(format!("invalid query string component '{component}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_are_embedded_as_text() {
        let query = Query::new().query("running shoes").hits_per_page(20).set("analytics", false);

        assert_eq!(
            query.to_query_string(),
            "analytics=false&hitsPerPage=20&query=running%20shoes"
        );
    }

    #[test]
    fn structured_values_are_embedded_as_json() {
        let query = Query::new()
            .attributes_to_retrieve(["title", "url"])
            .set("facetFilters", json!({"brand": "acme"}));

        let params = query.to_string_params();
        assert_eq!(params["attributesToRetrieve"], r#"["title","url"]"#);
        assert_eq!(params["facetFilters"], r#"{"brand":"acme"}"#);
    }

    #[test]
    fn null_parameters_are_omitted() {
        let query = Query::new().query("q").set("filters", Value::Null);
        assert_eq!(query.to_query_string(), "query=q");
    }

    #[test]
    fn user_token_overrides_previous_value() {
        let query = Query::new().user_token("alice").user_token("bob");
        assert_eq!(query.get("userToken"), Some(&json!("bob")));
    }

    #[test]
    fn decode_recovers_encoded_parameters() {
        let query = Query::new()
            .query("a&b=c d")
            .tag_filters("(public,user_42)")
            .page(3)
            .attributes_to_retrieve(["ünïcode", "x"]);

        let decoded = decode_query_string(&query.to_query_string()).expect("valid query string");
        assert_eq!(decoded, query.to_string_params());
    }

    #[test]
    fn decode_reads_plus_as_space() {
        let decoded = decode_query_string("query=hello+world&page=1").expect("valid query string");
        assert_eq!(decoded["query"], "hello world");
        assert_eq!(decoded["page"], "1");
    }

    #[test]
    fn empty_query_encodes_to_empty_string() {
        assert_eq!(Query::new().to_query_string(), "");
        assert!(decode_query_string("").expect("empty is valid").is_empty());
    }
}
