use reqwest::Url;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::pager::{Cursor, PageRequest};
use crate::util::with_query_key;

pub(crate) const JSON: &str = "application/json";
pub(crate) const GEO_JSON: &str = "application/geo+json";

/// Media type a REST request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accept {
    #[default]
    Json,
    GeoJson,
}

impl Accept {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accept::Json => JSON,
            Accept::GeoJson => GEO_JSON,
        }
    }

    /// Where page items live in a response of this media type.
    pub fn items_pointer(&self) -> &'static str {
        match self {
            Accept::Json => "/results",
            Accept::GeoJson => "/features",
        }
    }
}

/// A GET request described by its URL and query string.
///
/// Paging overwrites the `pageNum` query parameter (configurable); every
/// other parameter is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    url: Url,
    page_param: String,
    page_size_param: String,
    accept: Accept,
}

impl RestRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            page_param: "pageNum".to_string(),
            page_size_param: "pageSize".to_string(),
            accept: Accept::Json,
        }
    }

    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| Error::Configuration(format!("invalid url {}: {}", url, e)))?;
        Ok(Self::new(url))
    }

    pub fn with_param_names(
        mut self,
        page_param: impl Into<String>,
        page_size_param: impl Into<String>,
    ) -> Self {
        self.page_param = page_param.into();
        self.page_size_param = page_size_param.into();
        self
    }

    pub fn with_accept(mut self, accept: Accept) -> Self {
        self.accept = accept;
        self
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.set_query(key, value);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        let name = self.page_size_param.clone();
        self.set_query(&name, &page_size.to_string());
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn accept(&self) -> Accept {
        self.accept
    }

    pub fn query(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Replaces every occurrence of `key`, keeping other pairs in order.
    pub fn set_query(&mut self, key: &str, value: &str) {
        self.url = with_query_key(&self.url, key, value);
    }
}

impl PageRequest for RestRequest {
    fn set_cursor(&mut self, cursor: &Cursor) {
        let name = self.page_param.clone();
        self.set_query(&name, &cursor.to_string());
    }

    fn page_size(&self) -> Option<usize> {
        self.query(&self.page_size_param)?.parse().ok()
    }
}

/// A GraphQL POST body. Paging overwrites one variable (`cursor` by default).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlRequest {
    query: String,
    variables: Map<String, Value>,
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    operation_name: Option<String>,
    #[serde(skip)]
    cursor_variable: String,
}

impl GraphQlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Map::new(),
            operation_name: None,
            cursor_variable: "cursor".to_string(),
        }
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_cursor_variable(mut self, name: impl Into<String>) -> Self {
        self.cursor_variable = name.into();
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

impl PageRequest for GraphQlRequest {
    fn set_cursor(&mut self, cursor: &Cursor) {
        let value = match cursor {
            Cursor::Token(t) => Value::String(t.clone()),
            Cursor::Number(n) => Value::from(*n),
        };
        self.variables.insert(self.cursor_variable.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn rest_page_number_is_overwritten() {
        let mut req = RestRequest::parse("https://api.example.test/field-boundaries?op=within")
            .unwrap()
            .with_page_size(100);
        req.set_cursor(&Cursor::Number(1));
        req.set_cursor(&Cursor::Number(2));

        assert_eq!(
            req.url().as_str(),
            "https://api.example.test/field-boundaries?op=within&pageSize=100&pageNum=2"
        );
        assert_eq!(req.page_size(), Some(100));
        assert_eq!(req.query("pageNum").as_deref(), Some("2"));
    }

    #[test]
    fn rest_query_values_are_encoded() {
        let req = RestRequest::parse("https://api.example.test/field-boundaries")
            .unwrap()
            .with_query("geometry", "POLYGON((-1.29 51.57,-1.17 51.57))");
        assert_eq!(
            req.query("geometry").as_deref(),
            Some("POLYGON((-1.29 51.57,-1.17 51.57))")
        );
        assert!(!req.url().as_str().contains(' '));
    }

    #[test]
    fn rest_without_page_size_has_no_hint() {
        let req = RestRequest::parse("https://api.example.test/x?pageSize=abc").unwrap();
        assert_eq!(req.page_size(), None);
        assert!(RestRequest::parse("not a url").is_err());
    }

    #[test]
    fn custom_page_param_names() {
        let mut req = RestRequest::parse("https://api.example.test/x")
            .unwrap()
            .with_param_names("page", "per_page")
            .with_page_size(25);
        req.set_cursor(&Cursor::Number(3));
        assert_eq!(req.query("page").as_deref(), Some("3"));
        assert_eq!(req.page_size(), Some(25));
    }

    #[test]
    fn graphql_body_shape() {
        let mut req = GraphQlRequest::new("query Q($cursor: String) { fields(after: $cursor) { id } }")
            .with_operation_name("Q")
            .with_variable("cursor", Value::Null);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "query": "query Q($cursor: String) { fields(after: $cursor) { id } }",
                "variables": {"cursor": null},
                "operationName": "Q"
            })
        );

        req.set_cursor(&Cursor::from("c1"));
        assert_eq!(req.variable("cursor"), Some(&json!("c1")));
        assert_eq!(req.page_size(), None);
    }

    #[test]
    fn graphql_custom_cursor_variable() {
        let mut req = GraphQlRequest::new("{ x }").with_cursor_variable("after");
        req.set_cursor(&Cursor::Number(5));
        assert_eq!(req.variable("after"), Some(&json!(5)));
        assert!(serde_json::to_value(&req).unwrap().get("operationName").is_none());
    }
}
