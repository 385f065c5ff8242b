//! Generic resource handler
//!
//! Create / Read / Update / Delete / ImportState for any catalog entity:
//! 1. encode the plan with the entity codec
//! 2. call the remote endpoint
//! 3. decode the response into the new state
//!
//! Remote failures become `Client Error` diagnostics and no state is
//! written.

use super::identity;
use super::ClientSlot;
use crate::catalog::EntityDef;
use crate::domain::ports::{CallContext, ClientHandle, PlanResponse, Resource, StateResponse};
use crate::domain::value::Value;
use crate::error::{AttributePath, Diagnostics, Error, Result};
use crate::schema::{plan_resource_change, validate_block, Schema};
use crate::translate::Record;
use async_trait::async_trait;
use serde_json::Value as Json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resource handler over one catalog entity
#[derive(Debug)]
pub struct ResourceHandler {
    def: Arc<EntityDef>,
    type_name: String,
    schema: Schema,
    client: ClientSlot,
}

impl ResourceHandler {
    pub fn new(def: Arc<EntityDef>) -> Self {
        Self {
            type_name: def.type_name(),
            schema: def.resource_schema(),
            def,
            client: ClientSlot::new(),
        }
    }

    pub fn entity(&self) -> &EntityDef {
        &self.def
    }

    fn decode(&self, json: &Json, prior: &Value) -> Result<Value> {
        let state = self.def.codec.decode(&self.def.block, json, prior)?;
        debug!(kind = self.def.kind, "Decoded Zentral record");
        Ok(state)
    }

    /// Encode on the blocking pool: codecs may read local files.
    async fn encode(&self, plan: &Value) -> Result<Record> {
        let def = Arc::clone(&self.def);
        let plan = plan.clone();
        let record = tokio::task::spawn_blocking(move || def.codec.encode(&def.block, &plan))
            .await
            .map_err(|e| Error::Internal(format!("{} encoder task failed: {}", self.def.kind, e)))??;
        debug!(kind = self.def.kind, fields = record.len(), "Encoded Zentral record");
        Ok(record)
    }

    async fn create_inner(&self, ctx: &CallContext, plan: &Value) -> Result<Value> {
        let client = self.client.get()?;
        let record = self.encode(plan).await?;

        let created = client.endpoint(self.def.kind, self.def.path).create(ctx, record).await?;
        let state = self.decode(&created, plan)?;
        info!(
            "Created {} {}",
            self.def.kind,
            identity::record_id(&self.def, &state).unwrap_or_default()
        );
        Ok(state)
    }

    async fn read_inner(&self, ctx: &CallContext, state: &Value) -> Result<Value> {
        let client = self.client.get()?;
        let id = identity::record_id(&self.def, state)?;
        let endpoint = client.endpoint(self.def.kind, self.def.path);
        let record = identity::get_by_key(&endpoint, ctx, self.def.key, &id).await?;
        self.decode(&record, state)
    }

    async fn update_inner(&self, ctx: &CallContext, prior: &Value, plan: &Value) -> Result<Value> {
        let client = self.client.get()?;
        let id = identity::record_id(&self.def, prior)?;
        let record = self.encode(plan).await?;

        let updated = client
            .endpoint(self.def.kind, self.def.path)
            .update(ctx, &id, record)
            .await?;
        let state = self.decode(&updated, plan)?;
        info!("Updated {} {}", self.def.kind, id);
        Ok(state)
    }

    async fn delete_inner(&self, ctx: &CallContext, state: &Value) -> Result<()> {
        let client = self.client.get()?;
        let id = identity::record_id(&self.def, state)?;
        client.endpoint(self.def.kind, self.def.path).delete(ctx, &id).await?;
        info!("Deleted {} {}", self.def.kind, id);
        Ok(())
    }
}

#[async_trait]
impl Resource for ResourceHandler {
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
        self.def.codec.validate(config, &mut diags);
        diags
    }

    fn plan(&self, prior: Option<&Value>, config: &Value) -> PlanResponse {
        // Destroy
        if config.is_null() {
            return PlanResponse {
                planned: Some(Value::Null),
                ..Default::default()
            };
        }

        let diagnostics = self.validate(config);
        if diagnostics.has_errors() {
            return PlanResponse {
                planned: None,
                requires_replace: Vec::new(),
                diagnostics,
            };
        }

        let change = plan_resource_change(&self.schema.block, prior, config);
        if !change.requires_replace.is_empty() {
            debug!(
                type_name = %self.type_name,
                paths = ?change.requires_replace,
                "Planned replacement"
            );
        }
        PlanResponse {
            planned: Some(change.planned),
            requires_replace: change.requires_replace,
            diagnostics,
        }
    }

    async fn create(&self, ctx: &CallContext, plan: &Value) -> StateResponse {
        match self.create_inner(ctx, plan).await {
            Ok(state) => StateResponse::ok(state),
            Err(e) => {
                warn!(kind = self.def.kind, error = %e, "Create failed");
                StateResponse::failed(e)
            }
        }
    }

    async fn read(&self, ctx: &CallContext, state: &Value) -> StateResponse {
        match self.read_inner(ctx, state).await {
            Ok(state) => StateResponse::ok(state),
            Err(e) => {
                warn!(kind = self.def.kind, error = %e, "Read failed");
                StateResponse::failed(e)
            }
        }
    }

    async fn update(&self, ctx: &CallContext, prior: &Value, plan: &Value) -> StateResponse {
        match self.update_inner(ctx, prior, plan).await {
            Ok(state) => StateResponse::ok(state),
            Err(e) => {
                warn!(kind = self.def.kind, error = %e, "Update failed");
                StateResponse::failed(e)
            }
        }
    }

    async fn delete(&self, ctx: &CallContext, state: &Value) -> Diagnostics {
        match self.delete_inner(ctx, state).await {
            Ok(()) => Diagnostics::new(),
            Err(e) => {
                warn!(kind = self.def.kind, error = %e, "Delete failed");
                Diagnostics::from(e)
            }
        }
    }

    fn import_state(&self, id: &str) -> StateResponse {
        match identity::import_state(&self.def, id) {
            Ok(state) => StateResponse::ok(state),
            Err(e) => StateResponse::failed(e),
        }
    }
}
