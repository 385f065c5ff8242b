//! In-process Zentral API
//!
//! Collections keyed by endpoint path hold JSON records. The transport
//! behaves like the REST API where the provider can observe it:
//! - server-assigned integer or UUID keys
//! - version counters on versioned collections
//! - enrollment secrets minted on create and kept on update
//! - list filters on any top-level field (`?name=...`)
//! - 404 on unknown records

use super::{ApiRequest, ApiResponse, KeyKind, Method, Transport};
use crate::error::Result;
use crate::translate::primitives::canonical_string;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Map as JsonMap, Value as Json};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use uuid::Uuid;

/// Server-side behaviour of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    pub key: KeyKind,
    /// Record field holding the key
    pub key_field: &'static str,
    /// Server maintains a `version` counter
    pub versioned: bool,
}

impl Collection {
    pub fn int() -> Self {
        Self {
            key: KeyKind::Int,
            key_field: "id",
            versioned: false,
        }
    }

    pub fn uuid() -> Self {
        Self {
            key: KeyKind::Uuid,
            key_field: "id",
            versioned: false,
        }
    }

    pub fn key_field(mut self, field: &'static str) -> Self {
        self.key_field = field;
        self
    }

    pub fn versioned(mut self) -> Self {
        self.versioned = true;
        self
    }
}

#[derive(Debug, Default)]
struct Store {
    collection: Option<Collection>,
    records: BTreeMap<String, JsonMap<String, Json>>,
    // Insertion order for list responses
    order: Vec<String>,
}

/// Fake Zentral API
#[derive(Debug, Default)]
pub struct MemoryTransport {
    stores: RwLock<BTreeMap<String, Store>>,
    sequence: AtomicU64,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a collection; unregistered paths behave like integer-keyed
    /// collections without versions
    pub fn register(&self, path: &str, collection: Collection) {
        self.stores.write().entry(path.to_string()).or_default().collection = Some(collection);
    }

    /// Seed a record the provider cannot create itself; returns it with its key
    pub fn insert(&self, path: &str, record: Json) -> Json {
        let mut record = match record {
            Json::Object(record) => record,
            _ => JsonMap::new(),
        };
        let mut stores = self.stores.write();
        let store = stores.entry(path.to_string()).or_default();
        let collection = store.collection.unwrap_or_else(Collection::int);
        let key = match record.get(collection.key_field) {
            Some(id) if !id.is_null() => canonical_string(id),
            _ => {
                let key = self.next_key(collection.key);
                record.insert(collection.key_field.into(), key_json(collection.key, &key));
                key
            }
        };
        if !store.records.contains_key(&key) {
            store.order.push(key.clone());
        }
        store.records.insert(key, record.clone());
        Json::Object(record)
    }

    /// Every record of a collection, in creation order
    pub fn records(&self, path: &str) -> Vec<Json> {
        let stores = self.stores.read();
        match stores.get(path) {
            Some(store) => store
                .order
                .iter()
                .filter_map(|k| store.records.get(k))
                .map(|r| Json::Object(r.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    fn next_key(&self, kind: KeyKind) -> String {
        match kind {
            KeyKind::Int => (self.sequence.fetch_add(1, Ordering::Relaxed) + 1).to_string(),
            KeyKind::Uuid => Uuid::new_v4().to_string(),
        }
    }

    fn mint_secret(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Split a request path into a collection path and an optional key
    fn route(&self, path: &str) -> (String, Option<String>) {
        let stores = self.stores.read();
        if stores.contains_key(path) {
            return (path.to_string(), None);
        }
        let trimmed = path.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(pos) if stores.contains_key(&trimmed[..=pos]) => {
                let key = urlencoding::decode(&trimmed[pos + 1..])
                    .map(|k| k.into_owned())
                    .unwrap_or_else(|_| trimmed[pos + 1..].to_string());
                (trimmed[..=pos].to_string(), Some(key))
            }
            _ => (path.to_string(), None),
        }
    }

    fn create(&self, path: &str, body: Option<Json>) -> ApiResponse {
        let mut record = match body {
            Some(Json::Object(record)) => record,
            _ => return bad_request("expected a JSON object"),
        };
        let mut stores = self.stores.write();
        let store = stores.entry(path.to_string()).or_default();
        let collection = store.collection.unwrap_or_else(Collection::int);

        let key = self.next_key(collection.key);
        record.insert(collection.key_field.into(), key_json(collection.key, &key));
        if collection.versioned {
            record.insert("version".into(), json!(1));
        }
        if let Some(Json::Object(secret)) = record.get_mut("enrollment_secret") {
            secret.insert("secret".into(), Json::String(self.mint_secret()));
            secret.insert("request_count".into(), json!(0));
        }
        let now = chrono::Utc::now().to_rfc3339();
        record.insert("created_at".into(), Json::String(now.clone()));
        record.insert("updated_at".into(), Json::String(now));

        store.order.push(key.clone());
        store.records.insert(key, record.clone());
        ApiResponse::new(201, Json::Object(record))
    }

    fn update(&self, path: &str, key: &str, body: Option<Json>) -> ApiResponse {
        let mut record = match body {
            Some(Json::Object(record)) => record,
            _ => return bad_request("expected a JSON object"),
        };
        let mut stores = self.stores.write();
        let Some(store) = stores.get_mut(path) else {
            return not_found();
        };
        let collection = store.collection.unwrap_or_else(Collection::int);
        let Some(existing) = store.records.get(key) else {
            return not_found();
        };

        // Server-owned fields survive the update.
        for field in [collection.key_field, "created_at"] {
            if let Some(v) = existing.get(field) {
                record.insert(field.into(), v.clone());
            }
        }
        if collection.versioned {
            let version = existing.get("version").and_then(Json::as_i64).unwrap_or(0);
            record.insert("version".into(), json!(version + 1));
        }
        if let (Some(Json::Object(old)), Some(Json::Object(new))) =
            (existing.get("enrollment_secret"), record.get_mut("enrollment_secret"))
        {
            for field in ["secret", "request_count"] {
                if let Some(v) = old.get(field) {
                    new.insert(field.into(), v.clone());
                }
            }
        }
        record.insert("updated_at".into(), Json::String(chrono::Utc::now().to_rfc3339()));

        store.records.insert(key.to_string(), record.clone());
        ApiResponse::new(200, Json::Object(record))
    }

    fn get(&self, path: &str, key: &str) -> ApiResponse {
        let stores = self.stores.read();
        match stores.get(path).and_then(|s| s.records.get(key)) {
            Some(record) => ApiResponse::new(200, Json::Object(record.clone())),
            None => not_found(),
        }
    }

    fn list(&self, path: &str, query: &[(String, String)]) -> ApiResponse {
        let records: Vec<Json> = self
            .records(path)
            .into_iter()
            .filter(|record| {
                query
                    .iter()
                    .all(|(field, value)| record.get(field).map(canonical_string).as_deref() == Some(value.as_str()))
            })
            .collect();
        ApiResponse::new(200, Json::Array(records))
    }

    fn delete(&self, path: &str, key: &str) -> ApiResponse {
        let mut stores = self.stores.write();
        let Some(store) = stores.get_mut(path) else {
            return not_found();
        };
        if store.records.remove(key).is_none() {
            return not_found();
        }
        store.order.retain(|k| k != key);
        ApiResponse::new(204, Json::Null)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let (path, key) = self.route(&request.path);
        debug!(method = %request.method, path = %path, key = ?key, "In-memory Zentral request");

        let response = match (request.method, key) {
            (Method::Post, None) => self.create(&path, request.body),
            (Method::Get, None) => self.list(&path, &request.query),
            (Method::Get, Some(key)) => self.get(&path, &key),
            (Method::Put, Some(key)) => self.update(&path, &key, request.body),
            (Method::Delete, Some(key)) => self.delete(&path, &key),
            _ => ApiResponse::new(405, json!({"detail": "Method not allowed."})),
        };
        Ok(response)
    }
}

fn key_json(kind: KeyKind, key: &str) -> Json {
    match kind {
        KeyKind::Int => key.parse::<i64>().map(Json::from).unwrap_or_else(|_| Json::String(key.to_string())),
        KeyKind::Uuid => Json::String(key.to_string()),
    }
}

fn not_found() -> ApiResponse {
    ApiResponse::new(404, json!({"detail": "Not found."}))
}

fn bad_request(detail: &str) -> ApiResponse {
    ApiResponse::new(400, json!({"detail": detail}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_mints_secret_and_keeps_it() {
        let transport = MemoryTransport::new();
        transport.register("/osquery/enrollments/", Collection::int());

        let created = transport
            .send(ApiRequest::new(Method::Post, "/osquery/enrollments/").body(json!({
                "configuration": 1,
                "enrollment_secret": {"meta_business_unit": 2, "tags": []},
            })))
            .await
            .unwrap();
        assert_eq!(created.status, 201);
        let secret = created.body["enrollment_secret"]["secret"].as_str().unwrap().to_string();
        assert_eq!(secret.len(), 32);
        let parsed = Uuid::parse_str(&secret).unwrap();
        assert_eq!(parsed.get_version_num(), 4);

        let updated = transport
            .send(ApiRequest::new(Method::Put, "/osquery/enrollments/1/").body(json!({
                "configuration": 3,
                "enrollment_secret": {"meta_business_unit": 2, "tags": [4]},
            })))
            .await
            .unwrap();
        assert_eq!(updated.status, 200);
        assert_eq!(updated.body["enrollment_secret"]["secret"], json!(secret));
        assert_eq!(updated.body["configuration"], json!(3));
        assert_eq!(updated.body["id"], json!(1));
    }

    #[tokio::test]
    async fn test_minted_secrets_are_distinct() {
        let transport = MemoryTransport::new();
        transport.register("/santa/enrollments/", Collection::int());

        let mut secrets = Vec::new();
        for configuration in [1, 2] {
            let created = transport
                .send(ApiRequest::new(Method::Post, "/santa/enrollments/").body(json!({
                    "configuration": configuration,
                    "enrollment_secret": {"meta_business_unit": 1, "tags": []},
                })))
                .await
                .unwrap();
            let secret = created.body["enrollment_secret"]["secret"].as_str().unwrap().to_string();
            assert_eq!(Uuid::parse_str(&secret).unwrap().simple().to_string(), secret);
            secrets.push(secret);
        }
        assert_ne!(secrets[0], secrets[1]);
        assert_eq!(transport.records("/santa/enrollments/")[1]["id"], json!(2));
    }

    #[tokio::test]
    async fn test_uuid_keys_and_filters() {
        let transport = MemoryTransport::new();
        transport.register("/mdm/artifacts/", Collection::uuid());

        let a = transport.insert("/mdm/artifacts/", json!({"name": "A", "type": "Profile"}));
        let b = transport.insert("/mdm/artifacts/", json!({"name": "B", "type": "Profile"}));
        assert_ne!(a["id"], b["id"]);
        for record in [&a, &b] {
            let key = Uuid::parse_str(record["id"].as_str().unwrap()).unwrap();
            assert_eq!(key.get_version(), Some(uuid::Version::Random));
        }

        let path = format!("/mdm/artifacts/{}/", a["id"].as_str().unwrap());
        let fetched = transport.send(ApiRequest::new(Method::Get, path)).await.unwrap();
        assert_eq!(fetched.body["name"], json!("A"));

        let listed = transport
            .send(ApiRequest::new(Method::Get, "/mdm/artifacts/").query("name", "B"))
            .await
            .unwrap();
        assert_eq!(listed.body.as_array().unwrap().len(), 1);

        let missing = transport
            .send(ApiRequest::new(Method::Delete, "/mdm/artifacts/nope/"))
            .await
            .unwrap();
        assert_eq!(missing.status, 404);
    }
}
