//! Zentral provider
//!
//! Entry points of the plugin contract:
//! - Configure: resolve the provider block and build the API client
//! - ListResources / ListDataSources: the catalog
//! - ValidateConfig, Plan, Create / Read / Update / Delete, ImportState
//! - ReadDataSource
//!
//! Every entry point is addressed by host kind name and returns
//! diagnostics instead of failing.

pub mod config;

pub use config::{provider_schema, DEFAULT_TIMEOUT_SECS};

use crate::catalog::Catalog;
use crate::client::ZentralClient;
use crate::domain::ports::{CallContext, ClientHandle, DataSource, PlanResponse, Resource, StateResponse};
use crate::domain::value::Value;
use crate::error::{AttributePath, Diagnostics, Error, Result};
use crate::handlers::{DataSourceHandler, ResourceHandler};
use crate::schema::{validate_block, Schema};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The provider: catalog handlers plus the configured client
pub struct Provider {
    schema: Schema,
    resources: IndexMap<String, Arc<dyn Resource>>,
    data_sources: IndexMap<String, Arc<dyn DataSource>>,
    client: RwLock<Option<Arc<ZentralClient>>>,
    timeout: Duration,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("resources", &self.resources.len())
            .field("data_sources", &self.data_sources.len())
            .field("configured", &self.is_configured())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl Provider {
    /// Provider over the full Zentral catalog
    pub fn new(timeout: Duration) -> Self {
        Self::with_catalog(&Catalog::zentral(), timeout)
    }

    pub fn with_catalog(catalog: &Catalog, timeout: Duration) -> Self {
        let mut resources: IndexMap<String, Arc<dyn Resource>> = IndexMap::new();
        for def in catalog.resources() {
            let handler = ResourceHandler::new(def.clone());
            resources.insert(handler.type_name().to_string(), Arc::new(handler));
        }

        let mut data_sources: IndexMap<String, Arc<dyn DataSource>> = IndexMap::new();
        for def in catalog.data_sources() {
            if let Some(handler) = DataSourceHandler::new(def.clone()) {
                data_sources.insert(handler.type_name().to_string(), Arc::new(handler));
            }
        }

        debug!(
            resources = resources.len(),
            data_sources = data_sources.len(),
            "Zentral provider catalog loaded"
        );
        Self {
            schema: provider_schema(),
            resources,
            data_sources,
            client: RwLock::new(None),
            timeout,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    // =========================================================================
    // Configure
    // =========================================================================

    /// Configure from the provider block, falling back to the process
    /// environment
    pub fn configure(&self, config: &Value) -> Diagnostics {
        self.configure_with_env(config, &config::process_env)
    }

    pub fn configure_with_env(&self, config: &Value, env: config::Env<'_>) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validate_block(&self.schema.block, config, &AttributePath::root(), &mut diags);
        if diags.has_errors() {
            return diags;
        }

        let resolution = config::resolve(config, env, self.timeout);
        diags.extend(resolution.diagnostics);
        let Some(client_config) = resolution.client else {
            return diags;
        };

        info!("Configuring Zentral client for {}", client_config.base_url);
        match ZentralClient::http(client_config) {
            Ok(client) => diags.extend(self.configure_client(Arc::new(client))),
            Err(e) => {
                warn!(error = %e, "Unable to create the Zentral API client");
                diags.add(e);
            }
        }
        diags
    }

    /// Hand a client to every handler
    pub fn configure_client(&self, client: Arc<ZentralClient>) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let handle: ClientHandle = client.clone();
        for handler in self.resources.values() {
            diags.extend(handler.configure(Some(handle.clone())));
        }
        for handler in self.data_sources.values() {
            diags.extend(handler.configure(Some(handle.clone())));
        }
        *self.client.write() = Some(client);
        diags
    }

    pub fn is_configured(&self) -> bool {
        self.client.read().is_some()
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn data_source_types(&self) -> impl Iterator<Item = &str> {
        self.data_sources.keys().map(String::as_str)
    }

    pub fn resource(&self, type_name: &str) -> Result<&Arc<dyn Resource>> {
        self.resources
            .get(type_name)
            .ok_or_else(|| Error::UnknownEntityType(type_name.to_string()))
    }

    pub fn data_source(&self, type_name: &str) -> Result<&Arc<dyn DataSource>> {
        self.data_sources
            .get(type_name)
            .ok_or_else(|| Error::UnknownEntityType(type_name.to_string()))
    }

    // =========================================================================
    // Resources
    // =========================================================================

    pub fn validate_resource_config(&self, type_name: &str, config: &Value) -> Diagnostics {
        match self.resource(type_name) {
            Ok(resource) => resource.validate(config),
            Err(e) => e.into(),
        }
    }

    /// Planned state for a create (`prior == None`), an update, or a
    /// destroy (null configuration)
    pub fn plan_resource_change(&self, type_name: &str, prior: Option<&Value>, config: &Value) -> PlanResponse {
        match self.resource(type_name) {
            Ok(resource) => resource.plan(prior, config),
            Err(e) => PlanResponse {
                diagnostics: e.into(),
                ..Default::default()
            },
        }
    }

    pub async fn create_resource(&self, ctx: &CallContext, type_name: &str, plan: &Value) -> StateResponse {
        match self.resource(type_name) {
            Ok(resource) => resource.create(ctx, plan).await,
            Err(e) => StateResponse::failed(e),
        }
    }

    pub async fn read_resource(&self, ctx: &CallContext, type_name: &str, state: &Value) -> StateResponse {
        match self.resource(type_name) {
            Ok(resource) => resource.read(ctx, state).await,
            Err(e) => StateResponse::failed(e),
        }
    }

    pub async fn update_resource(
        &self,
        ctx: &CallContext,
        type_name: &str,
        prior: &Value,
        plan: &Value,
    ) -> StateResponse {
        match self.resource(type_name) {
            Ok(resource) => resource.update(ctx, prior, plan).await,
            Err(e) => StateResponse::failed(e),
        }
    }

    pub async fn delete_resource(&self, ctx: &CallContext, type_name: &str, state: &Value) -> Diagnostics {
        match self.resource(type_name) {
            Ok(resource) => resource.delete(ctx, state).await,
            Err(e) => e.into(),
        }
    }

    pub fn import_resource_state(&self, type_name: &str, id: &str) -> StateResponse {
        match self.resource(type_name) {
            Ok(resource) => resource.import_state(id),
            Err(e) => StateResponse::failed(e),
        }
    }

    // =========================================================================
    // Data Sources
    // =========================================================================

    pub fn validate_data_source_config(&self, type_name: &str, config: &Value) -> Diagnostics {
        match self.data_source(type_name) {
            Ok(data_source) => data_source.validate(config),
            Err(e) => e.into(),
        }
    }

    pub async fn read_data_source(&self, ctx: &CallContext, type_name: &str, config: &Value) -> StateResponse {
        match self.data_source(type_name) {
            Ok(data_source) => data_source.read(ctx, config).await,
            Err(e) => StateResponse::failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryTransport;
    use crate::error::Severity;

    fn provider() -> Provider {
        let provider = Provider::default();
        let transport = Arc::new(MemoryTransport::new());
        Catalog::zentral().register_collections(&transport);
        assert!(provider
            .configure_client(Arc::new(ZentralClient::new(transport)))
            .is_empty());
        provider
    }

    #[test]
    fn test_catalog_enumeration() {
        let provider = Provider::default();
        let resources: Vec<&str> = provider.resource_types().collect();
        let data_sources: Vec<&str> = provider.data_source_types().collect();
        assert!(resources.contains(&"zentral_santa_rule"));
        assert!(!resources.contains(&"zentral_realm"));
        assert!(data_sources.contains(&"zentral_realm"));
        assert!(data_sources.contains(&"zentral_mdm_location_asset"));
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_unknown_type_is_reported() {
        let provider = Provider::default();
        let diags = provider.validate_resource_config("zentral_nope", &Value::Null);
        assert_eq!(diags.iter().next().unwrap().summary, "Unknown Type");
        assert!(provider.import_resource_state("zentral_nope", "1").state.is_none());
    }

    #[test]
    fn test_unconfigured_data_source_read() {
        let provider = Provider::default();
        let config = Value::object([("id", Value::Null), ("name", Value::from("Default"))]);
        let response = tokio_test::block_on(provider.read_data_source(
            &CallContext::new(),
            "zentral_santa_configuration",
            &config,
        ));
        assert!(response.state.is_none());
        assert_eq!(
            response.diagnostics.iter().next().unwrap().summary,
            "Provider Configuration Error"
        );
    }

    #[test]
    fn test_configure_defers_on_unknown_values() {
        let provider = Provider::default();
        let config = Value::object([("base_url", Value::Unknown), ("token", Value::from("yolo"))]);
        let diags = provider.configure_with_env(&config, &|_: &str| None);
        assert!(!diags.has_errors());
        assert_eq!(diags.iter().next().unwrap().severity, Severity::Warning);
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_configure_builds_http_client() {
        let provider = Provider::default();
        let config = Value::object([("base_url", Value::Null), ("token", Value::Null)]);
        let env = |name: &str| match name {
            config::BASE_URL_ENV => Some("https://zentral.example.com/api/".to_string()),
            config::TOKEN_ENV => Some("yolo".to_string()),
            _ => None,
        };
        let diags = provider.configure_with_env(&config, &env);
        assert!(diags.is_empty(), "{:?}", diags);
        assert!(provider.is_configured());
    }

    #[tokio::test]
    async fn test_import_then_read() {
        let provider = provider();
        let ctx = CallContext::new();
        let plan = provider
            .plan_resource_change(
                "zentral_meta_business_unit",
                None,
                &Value::object([
                    ("id", Value::Null),
                    ("name", Value::from("Default")),
                    ("api_enrollment_enabled", Value::Null),
                ]),
            )
            .planned
            .unwrap();
        let created = provider
            .create_resource(&ctx, "zentral_meta_business_unit", &plan)
            .await
            .state
            .unwrap();

        let id = created.get_int("id").unwrap().to_string();
        let imported = provider
            .import_resource_state("zentral_meta_business_unit", &id)
            .state
            .unwrap();
        let read = provider
            .read_resource(&ctx, "zentral_meta_business_unit", &imported)
            .await
            .state
            .unwrap();
        assert_eq!(read, created);
    }
}
