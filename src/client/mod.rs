//! Zentral API client
//!
//! A thin typed layer over a [`Transport`]: every entity gets an
//! [`Endpoint`] (`create`, `get_by_id`, `get_by_name`, `update`, ...)
//! that maps remote failures to `ClientError` and honours host
//! cancellation.
//!
//! Transports:
//! - [`HttpTransport`]: the real REST API over reqwest
//! - `MemoryTransport`: an in-process fake of the API, built with the
//!   `test-support` feature

pub mod http;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use http::{ClientConfig, HttpTransport};
#[cfg(any(test, feature = "test-support"))]
pub use memory::{Collection, MemoryTransport};

use crate::domain::ports::CallContext;
use crate::error::{Error, Operation, Result};
use crate::metrics::{self, Outcome};
use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value as Json};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// User agent sent with every request
pub fn user_agent() -> String {
    format!("terraform-provider-zentral/{}", crate::VERSION)
}

// =============================================================================
// Requests & Responses
// =============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// Request to the Zentral API. `path` is relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Json>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Json) -> Self {
        self.body = Some(body);
        self
    }
}

/// Response from the Zentral API; empty bodies decode as `null`
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Json,
}

impl ApiResponse {
    pub fn new(status: u16, body: Json) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Error text of a failed response
    pub fn error_text(&self) -> String {
        match &self.body {
            Json::String(s) => s.clone(),
            Json::Object(o) => match o.get("detail") {
                Some(Json::String(detail)) => detail.clone(),
                _ => self.body.to_string(),
            },
            Json::Null => format!("HTTP {}", self.status),
            other => other.to_string(),
        }
    }
}

/// Sends requests to a Zentral API
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

// =============================================================================
// Client
// =============================================================================

/// Client handle shared by every handler; safe for concurrent use
#[derive(Debug, Clone)]
pub struct ZentralClient {
    transport: Arc<dyn Transport>,
}

impl ZentralClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Client over the REST API
    pub fn http(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Endpoint of an entity collection, e.g. `("Santa rule", "/santa/rules/")`
    pub fn endpoint<'a>(&'a self, kind: &'a str, path: &'a str) -> Endpoint<'a> {
        Endpoint {
            transport: self.transport.as_ref(),
            kind,
            path,
        }
    }
}

// =============================================================================
// Endpoint
// =============================================================================

/// Primary key flavour of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Int,
    Uuid,
}

/// CRUD surface of one entity collection
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    transport: &'a dyn Transport,
    kind: &'a str,
    path: &'a str,
}

impl<'a> Endpoint<'a> {
    pub fn kind(&self) -> &str {
        self.kind
    }

    pub fn path(&self) -> &str {
        self.path
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}{}/", self.path, urlencoding::encode(id))
    }

    fn client_error(&self, operation: Operation, id: Option<&str>, status: Option<u16>, message: String) -> Error {
        Error::Client {
            kind: self.kind.to_string(),
            operation,
            id: id.map(str::to_string),
            status,
            message,
        }
    }

    async fn call(
        &self,
        ctx: &CallContext,
        operation: Operation,
        id: Option<&str>,
        request: ApiRequest,
    ) -> Result<Json> {
        let label = operation.to_string();
        debug!(
            method = %request.method,
            path = %request.path,
            kind = self.kind,
            "Sending request to Zentral"
        );

        let response = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                metrics::record_api_request(self.path, &label, Outcome::Cancelled);
                return Err(self.client_error(operation, id, None, "request cancelled".to_string()));
            }
            response = self.transport.send(request) => response,
        };

        match response {
            Ok(response) if response.is_success() => {
                metrics::record_api_request(self.path, &label, Outcome::Success);
                Ok(response.body)
            }
            Ok(response) => {
                let outcome = if response.status == 404 {
                    Outcome::NotFound
                } else {
                    Outcome::Error
                };
                metrics::record_api_request(self.path, &label, outcome);
                warn!(
                    status = response.status,
                    kind = self.kind,
                    operation = %operation,
                    "Zentral API returned an error"
                );
                Err(self.client_error(operation, id, Some(response.status), response.error_text()))
            }
            Err(e) => {
                metrics::record_api_request(self.path, &label, Outcome::Error);
                Err(self.client_error(operation, id, None, e.to_string()))
            }
        }
    }

    /// Create a record; returns the stored record
    pub async fn create(&self, ctx: &CallContext, record: JsonMap<String, Json>) -> Result<Json> {
        let request = ApiRequest::new(Method::Post, self.path).body(Json::Object(record));
        self.call(ctx, Operation::Create, None, request).await
    }

    /// Fetch a record by its integer id
    pub async fn get_by_id(&self, ctx: &CallContext, id: i64) -> Result<Json> {
        let id = id.to_string();
        let request = ApiRequest::new(Method::Get, self.item_path(&id));
        self.call(ctx, Operation::Read, Some(&id), request).await
    }

    /// Fetch a record by its UUID
    pub async fn get_by_uuid(&self, ctx: &CallContext, uuid: &str) -> Result<Json> {
        let request = ApiRequest::new(Method::Get, self.item_path(uuid));
        self.call(ctx, Operation::Read, Some(uuid), request).await
    }

    /// Fetch the record with the given name
    pub async fn get_by_name(&self, ctx: &CallContext, name: &str) -> Result<Json> {
        self.get_by_query(ctx, &[("name", name)]).await
    }

    /// Filtered list that must match exactly one record.
    ///
    /// No match is a not-found `ClientError`; several matches are an
    /// `AmbiguousLookup`.
    pub async fn get_by_query(&self, ctx: &CallContext, query: &[(&str, &str)]) -> Result<Json> {
        let mut records = self.list(ctx, query).await?;
        let described = query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        match records.len() {
            1 => Ok(records.remove(0)),
            0 => Err(self.client_error(
                Operation::Read,
                None,
                Some(404),
                format!("no {} found with {}", self.kind, described),
            )),
            count => Err(Error::AmbiguousLookup {
                kind: self.kind.to_string(),
                field: query.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", "),
                value: query.iter().map(|(_, v)| *v).collect::<Vec<_>>().join(", "),
                count,
            }),
        }
    }

    /// List the records matching every query parameter
    pub async fn list(&self, ctx: &CallContext, query: &[(&str, &str)]) -> Result<Vec<Json>> {
        let request = query
            .iter()
            .fold(ApiRequest::new(Method::Get, self.path), |r, (k, v)| r.query(k, v));
        match self.call(ctx, Operation::Read, None, request).await? {
            Json::Array(records) => Ok(records),
            other => Err(self.client_error(
                Operation::Read,
                None,
                None,
                format!("expected a list of records, got {}", crate::translate::primitives::json_type(&other)),
            )),
        }
    }

    /// Replace a record; returns the stored record
    pub async fn update(&self, ctx: &CallContext, id: &str, record: JsonMap<String, Json>) -> Result<Json> {
        let request = ApiRequest::new(Method::Put, self.item_path(id)).body(Json::Object(record));
        self.call(ctx, Operation::Update, Some(id), request).await
    }

    pub async fn delete(&self, ctx: &CallContext, id: &str) -> Result<()> {
        let request = ApiRequest::new(Method::Delete, self.item_path(id));
        self.call(ctx, Operation::Delete, Some(id), request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::{Collection, MemoryTransport};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn client() -> (ZentralClient, Arc<MemoryTransport>) {
        let transport = Arc::new(MemoryTransport::new());
        transport.register("/santa/rules/", Collection::int().versioned());
        transport.register("/mdm/dep_virtual_servers/", Collection::int());
        (ZentralClient::new(transport.clone()), transport)
    }

    fn record(value: Json) -> JsonMap<String, Json> {
        match value {
            Json::Object(o) => o,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_user_agent() {
        assert!(user_agent().starts_with("terraform-provider-zentral/"));
    }

    #[tokio::test]
    async fn test_endpoint_crud() {
        let (client, _) = client();
        let rules = client.endpoint("Santa rule", "/santa/rules/");
        let ctx = CallContext::new();

        let created = rules
            .create(&ctx, record(json!({"target_type": "BINARY", "policy": 1})))
            .await
            .unwrap();
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["version"], json!(1));

        let fetched = rules.get_by_id(&ctx, id).await.unwrap();
        assert_eq!(fetched, created);

        let updated = rules
            .update(&ctx, &id.to_string(), record(json!({"target_type": "BINARY", "policy": 2})))
            .await
            .unwrap();
        assert_eq!(updated["policy"], json!(2));
        assert_eq!(updated["version"], json!(2));

        rules.delete(&ctx, &id.to_string()).await.unwrap();
        let err = rules.get_by_id(&ctx, id).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            format!("Unable to read Santa rule {}, got error: Not found.", id)
        );
    }

    #[tokio::test]
    async fn test_get_by_name_is_unambiguous() {
        let (client, transport) = client();
        transport.insert("/mdm/dep_virtual_servers/", json!({"name": "Default"}));
        transport.insert("/mdm/dep_virtual_servers/", json!({"name": "Shared"}));
        transport.insert("/mdm/dep_virtual_servers/", json!({"name": "Shared"}));
        let servers = client.endpoint("MDM DEP virtual server", "/mdm/dep_virtual_servers/");
        let ctx = CallContext::new();

        let found = servers.get_by_name(&ctx, "Default").await.unwrap();
        assert_eq!(found["name"], json!("Default"));

        assert_matches!(
            servers.get_by_name(&ctx, "Shared").await,
            Err(Error::AmbiguousLookup { count: 2, .. })
        );
        assert!(servers.get_by_name(&ctx, "Missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_cancelled_call_returns_client_error() {
        let (client, transport) = client();
        let rules = client.endpoint("Santa rule", "/santa/rules/");
        let ctx = CallContext::new();
        ctx.cancel();

        let err = rules
            .create(&ctx, record(json!({"target_type": "BINARY", "policy": 1})))
            .await
            .unwrap_err();
        assert_matches!(err, Error::Client { operation: Operation::Create, .. });
        assert!(transport.records("/santa/rules/").is_empty());
    }
}
