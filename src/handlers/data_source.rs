//! Generic data source handler
//!
//! Looks a record up by its primary key or by a unique field, then decodes
//! it with the entity codec against the derived data-source schema.

use super::identity::{self, LookupRequest};
use super::ClientSlot;
use crate::catalog::EntityDef;
use crate::domain::ports::{CallContext, ClientHandle, DataSource, StateResponse};
use crate::domain::value::Value;
use crate::error::{AttributePath, Diagnostics, Result};
use crate::schema::{validate_block, Schema};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct DataSourceHandler {
    def: Arc<EntityDef>,
    type_name: String,
    schema: Schema,
    client: ClientSlot,
}

impl DataSourceHandler {
    /// `None` when the entity is not exposed as a data source
    pub fn new(def: Arc<EntityDef>) -> Option<Self> {
        let schema = def.data_source_schema()?;
        Some(Self {
            type_name: def.type_name(),
            schema,
            def,
            client: ClientSlot::new(),
        })
    }

    pub fn entity(&self) -> &EntityDef {
        &self.def
    }

    async fn read_inner(&self, ctx: &CallContext, config: &Value) -> Result<Value> {
        let request = identity::resolve_lookup(&self.def, config)?;
        let client = self.client.get()?;
        let endpoint = client.endpoint(self.def.kind, self.def.path);

        let record = match &request {
            LookupRequest::Key(id) => identity::get_by_key(&endpoint, ctx, self.def.key, id).await?,
            LookupRequest::Query(query) => {
                let query: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
                endpoint.get_by_query(ctx, &query).await?
            }
        };
        debug!(kind = self.def.kind, lookup = ?request, "Found Zentral record");
        self.def.codec.decode(&self.schema.block, &record, config)
    }
}

#[async_trait]
impl DataSource for DataSourceHandler {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn configure(&self, client: Option<ClientHandle>) -> Diagnostics {
        self.client.configure(&self.type_name, client)
    }

    fn validate(&self, config: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validate_block(&self.schema.block, config, &AttributePath::root(), &mut diags);
        diags
    }

    async fn read(&self, ctx: &CallContext, config: &Value) -> StateResponse {
        let diags = self.validate(config);
        if diags.has_errors() {
            return StateResponse::failed(diags);
        }
        match self.read_inner(ctx, config).await {
            Ok(state) => StateResponse::ok(state),
            Err(e) => {
                warn!(kind = self.def.kind, error = %e, "Data source read failed");
                StateResponse::failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::client::{MemoryTransport, ZentralClient};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn handler(name: &str) -> (DataSourceHandler, Arc<MemoryTransport>) {
        let catalog = Catalog::zentral();
        let transport = Arc::new(MemoryTransport::new());
        catalog.register_collections(&transport);
        let handler = DataSourceHandler::new(catalog.get(name).unwrap().clone()).unwrap();
        let client: ClientHandle = Arc::new(ZentralClient::new(transport.clone()));
        assert!(handler.configure(Some(client)).is_empty());
        (handler, transport)
    }

    #[test]
    fn test_resource_only_entities_have_no_data_source() {
        let catalog = Catalog::zentral();
        assert!(DataSourceHandler::new(catalog.get("zentral_mdm_blueprint_artifact").unwrap().clone()).is_none());
    }

    #[tokio::test]
    async fn test_read_by_name_and_by_id() {
        let (handler, transport) = handler("zentral_santa_configuration");
        let seeded = transport.insert(
            "/santa/configurations/",
            json!({"name": "Default", "client_mode": 2, "batch_size": 50}),
        );
        let id = seeded["id"].as_i64().unwrap();
        let ctx = CallContext::new();

        let mut config = handler.schema().block.null_object();
        config.set("name", Value::from("Default"));
        let state = handler.read(&ctx, &config).await.state.unwrap();
        assert_eq!(state.get("id"), &Value::Int(id));
        assert_eq!(state.get("client_mode"), &Value::from("LOCKDOWN"));

        let mut config = handler.schema().block.null_object();
        config.set("id", Value::Int(id));
        let by_id = handler.read(&ctx, &config).await.state.unwrap();
        assert_eq!(by_id, state);
    }

    #[tokio::test]
    async fn test_both_identifiers_are_rejected() {
        let (handler, _) = handler("zentral_tag");
        let mut config = handler.schema().block.null_object();
        config.set("id", Value::Int(1));
        config.set("name", Value::from("Mac"));
        let response = handler.read(&CallContext::new(), &config).await;
        assert!(response.state.is_none());
        assert!(response.diagnostics.has_errors());
    }

    #[tokio::test]
    async fn test_ambiguous_name_is_an_error() {
        let (handler, transport) = handler("zentral_mdm_dep_virtual_server");
        transport.insert("/mdm/dep_virtual_servers/", json!({"name": "Shared"}));
        transport.insert("/mdm/dep_virtual_servers/", json!({"name": "Shared"}));

        let mut config = handler.schema().block.null_object();
        config.set("name", Value::from("Shared"));
        let response = handler.read(&CallContext::new(), &config).await;
        assert!(response.state.is_none());
        assert_eq!(response.diagnostics.iter().next().unwrap().summary, "Ambiguous Lookup");
    }

    #[tokio::test]
    async fn test_location_asset_composite_lookup() {
        let (handler, transport) = handler("zentral_mdm_location_asset");
        transport.insert(
            "/mdm/location_assets/",
            json!({"location": 1, "adam_id": "409183694", "pricing_param": "STDQ"}),
        );
        transport.insert(
            "/mdm/location_assets/",
            json!({"location": 1, "adam_id": "409183694", "pricing_param": "PLUS"}),
        );

        let mut config = handler.schema().block.null_object();
        config.set("location_id", Value::Int(1));
        config.set("adam_id", Value::from("409183694"));
        config.set("pricing_param", Value::from("PLUS"));
        let state = handler.read(&CallContext::new(), &config).await.state.unwrap();
        assert_eq!(state.get("pricing_param"), &Value::from("PLUS"));
        assert!(state.get("id").is_known());
    }

    #[tokio::test]
    async fn test_missing_record_is_a_client_error() {
        let (handler, _) = handler("zentral_tag");
        let mut config = handler.schema().block.null_object();
        config.set("name", Value::from("Missing"));
        let response = handler.read(&CallContext::new(), &config).await;
        assert_matches!(response.state, None);
        assert_eq!(response.diagnostics.iter().next().unwrap().summary, "Client Error");
    }
}
