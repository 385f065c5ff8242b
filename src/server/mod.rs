//! Plugin endpoint
//!
//! Serves the provider contract as JSON over HTTP on a local address. The
//! host reads the handshake line from stdout, then drives every call
//! through the routes below.

pub mod wire;

use crate::domain::ports::{CallContext, PlanResponse, StateResponse};
use crate::domain::value::Value;
use crate::error::{AttributePath, Diagnostics, Error};
use crate::provider::Provider;
use crate::schema::Schema;
use axum::{
    extract::{Json, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use wire::{object_from_json, schema_to_json, value_to_json};

/// Protocol version announced in the handshake line
pub const PROTOCOL_VERSION: u32 = 1;

/// Line printed on stdout once the endpoint listens
pub fn handshake_line(addr: SocketAddr) -> String {
    format!("ZENTRAL_PROVIDER|{}|{}", PROTOCOL_VERSION, addr)
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigRequest {
    #[serde(default)]
    pub config: JsonValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub prior_state: JsonValue,
    #[serde(default)]
    pub config: JsonValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateRequest {
    #[serde(default)]
    pub prior_state: JsonValue,
    #[serde(default)]
    pub planned_state: JsonValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsResponse {
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanResult {
    pub planned_state: JsonValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateResult {
    pub state: JsonValue,
    pub diagnostics: Diagnostics,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<PlanResponse> for PlanResult {
    fn from(response: PlanResponse) -> Self {
        Self {
            planned_state: response.planned.as_ref().map(value_to_json).unwrap_or_default(),
            requires_replace: response.requires_replace,
            diagnostics: response.diagnostics,
        }
    }
}

impl From<StateResponse> for StateResult {
    fn from(response: StateResponse) -> Self {
        Self {
            state: response.state.as_ref().map(value_to_json).unwrap_or_default(),
            diagnostics: response.diagnostics,
        }
    }
}

fn error_response(err: Error) -> Response {
    let (status, error) = match &err {
        Error::UnknownEntityType(_) => (StatusCode::NOT_FOUND, "unknown_type"),
        Error::InvalidAttributeValue { .. } | Error::InvalidConfiguration { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_value")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    let details = err.paths().first().map(|p| p.to_string());
    (
        status,
        Json(ApiErrorResponse {
            error: error.into(),
            message: err.to_string(),
            details,
        }),
    )
        .into_response()
}

// =============================================================================
// Router
// =============================================================================

/// Build the plugin router over a provider
pub fn router(provider: Arc<Provider>) -> Router {
    Router::new()
        .route("/v1/schema", get(get_schema))
        .route("/v1/configure", post(configure))
        .route("/v1/resources/:type_name/validate", post(validate_resource))
        .route("/v1/resources/:type_name/plan", post(plan_resource))
        .route("/v1/resources/:type_name/create", post(create_resource))
        .route("/v1/resources/:type_name/read", post(read_resource))
        .route("/v1/resources/:type_name/update", post(update_resource))
        .route("/v1/resources/:type_name/delete", post(delete_resource))
        .route("/v1/resources/:type_name/import", post(import_resource))
        .route("/v1/data-sources/:type_name/validate", post(validate_data_source))
        .route("/v1/data-sources/:type_name/read", post(read_data_source))
        .route("/healthz", get(health_check))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(provider)
}

/// Serve the plugin endpoint until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, provider: Arc<Provider>, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    info!("Plugin endpoint listening on {}", listener.local_addr()?);
    axum::serve(listener, router(provider))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Per-request context; the call is cancelled when the host drops the request
fn call_context() -> (CallContext, tokio_util::sync::DropGuard) {
    let ctx = CallContext::new();
    let guard = ctx.token().clone().drop_guard();
    (ctx, guard)
}

fn resource_schema<'a>(provider: &'a Provider, type_name: &str) -> Result<&'a Schema, Error> {
    provider.resource(type_name).map(|r| r.schema())
}

fn decode(schema: &Schema, json: &JsonValue, field: &str) -> Result<Value, Error> {
    object_from_json(&schema.block, json, &AttributePath::root()).map_err(|e| match e {
        Error::InvalidAttributeValue { path, message } => {
            Error::invalid_value(path, format!("{}: {}", field, message))
        }
        other => other,
    })
}

// =============================================================================
// Handlers
// =============================================================================

async fn get_schema(State(provider): State<Arc<Provider>>) -> impl IntoResponse {
    let resources: serde_json::Map<String, JsonValue> = provider
        .resource_types()
        .filter_map(|t| provider.resource(t).ok().map(|r| (t.to_string(), schema_to_json(r.schema()))))
        .collect();
    let data_sources: serde_json::Map<String, JsonValue> = provider
        .data_source_types()
        .filter_map(|t| provider.data_source(t).ok().map(|d| (t.to_string(), schema_to_json(d.schema()))))
        .collect();
    Json(json!({
        "version": crate::VERSION,
        "provider": schema_to_json(provider.schema()),
        "resources": resources,
        "data_sources": data_sources,
    }))
}

async fn configure(State(provider): State<Arc<Provider>>, Json(request): Json<ConfigRequest>) -> Response {
    let config = match decode(provider.schema(), &request.config, "config") {
        Ok(config) => config,
        Err(e) => return error_response(e),
    };
    let diagnostics = provider.configure(&config);
    Json(DiagnosticsResponse { diagnostics }).into_response()
}

async fn validate_resource(
    State(provider): State<Arc<Provider>>,
    Path(type_name): Path<String>,
    Json(request): Json<ConfigRequest>,
) -> Response {
    let config = match resource_schema(&provider, &type_name)
        .and_then(|s| decode(s, &request.config, "config"))
    {
        Ok(config) => config,
        Err(e) => return error_response(e),
    };
    let diagnostics = provider.validate_resource_config(&type_name, &config);
    Json(DiagnosticsResponse { diagnostics }).into_response()
}

async fn plan_resource(
    State(provider): State<Arc<Provider>>,
    Path(type_name): Path<String>,
    Json(request): Json<PlanRequest>,
) -> Response {
    let decoded = resource_schema(&provider, &type_name).and_then(|s| {
        Ok((
            decode(s, &request.prior_state, "prior_state")?,
            decode(s, &request.config, "config")?,
        ))
    });
    let (prior, config) = match decoded {
        Ok(values) => values,
        Err(e) => return error_response(e),
    };
    let prior = (!prior.is_null()).then_some(&prior);
    debug!("Planning {}", type_name);
    let response = provider.plan_resource_change(&type_name, prior, &config);
    Json(PlanResult::from(response)).into_response()
}

async fn create_resource(
    State(provider): State<Arc<Provider>>,
    Path(type_name): Path<String>,
    Json(request): Json<StateRequest>,
) -> Response {
    let plan = match resource_schema(&provider, &type_name)
        .and_then(|s| decode(s, &request.planned_state, "planned_state"))
    {
        Ok(plan) => plan,
        Err(e) => return error_response(e),
    };
    let (ctx, _guard) = call_context();
    let response = provider.create_resource(&ctx, &type_name, &plan).await;
    Json(StateResult::from(response)).into_response()
}

async fn read_resource(
    State(provider): State<Arc<Provider>>,
    Path(type_name): Path<String>,
    Json(request): Json<StateRequest>,
) -> Response {
    let state = match resource_schema(&provider, &type_name)
        .and_then(|s| decode(s, &request.prior_state, "prior_state"))
    {
        Ok(state) => state,
        Err(e) => return error_response(e),
    };
    let (ctx, _guard) = call_context();
    let response = provider.read_resource(&ctx, &type_name, &state).await;
    Json(StateResult::from(response)).into_response()
}

async fn update_resource(
    State(provider): State<Arc<Provider>>,
    Path(type_name): Path<String>,
    Json(request): Json<StateRequest>,
) -> Response {
    let decoded = resource_schema(&provider, &type_name).and_then(|s| {
        Ok((
            decode(s, &request.prior_state, "prior_state")?,
            decode(s, &request.planned_state, "planned_state")?,
        ))
    });
    let (prior, plan) = match decoded {
        Ok(values) => values,
        Err(e) => return error_response(e),
    };
    let (ctx, _guard) = call_context();
    let response = provider.update_resource(&ctx, &type_name, &prior, &plan).await;
    Json(StateResult::from(response)).into_response()
}

async fn delete_resource(
    State(provider): State<Arc<Provider>>,
    Path(type_name): Path<String>,
    Json(request): Json<StateRequest>,
) -> Response {
    let state = match resource_schema(&provider, &type_name)
        .and_then(|s| decode(s, &request.prior_state, "prior_state"))
    {
        Ok(state) => state,
        Err(e) => return error_response(e),
    };
    let (ctx, _guard) = call_context();
    let diagnostics = provider.delete_resource(&ctx, &type_name, &state).await;
    Json(DiagnosticsResponse { diagnostics }).into_response()
}

async fn import_resource(
    State(provider): State<Arc<Provider>>,
    Path(type_name): Path<String>,
    Json(request): Json<ImportRequest>,
) -> Response {
    if let Err(e) = provider.resource(&type_name) {
        return error_response(e);
    }
    info!("Importing {} {}", type_name, request.id);
    let response = provider.import_resource_state(&type_name, &request.id);
    Json(StateResult::from(response)).into_response()
}

async fn validate_data_source(
    State(provider): State<Arc<Provider>>,
    Path(type_name): Path<String>,
    Json(request): Json<ConfigRequest>,
) -> Response {
    let config = match provider
        .data_source(&type_name)
        .and_then(|d| decode(d.schema(), &request.config, "config"))
    {
        Ok(config) => config,
        Err(e) => return error_response(e),
    };
    let diagnostics = provider.validate_data_source_config(&type_name, &config);
    Json(DiagnosticsResponse { diagnostics }).into_response()
}

async fn read_data_source(
    State(provider): State<Arc<Provider>>,
    Path(type_name): Path<String>,
    Json(request): Json<ConfigRequest>,
) -> Response {
    let config = match provider
        .data_source(&type_name)
        .and_then(|d| decode(d.schema(), &request.config, "config"))
    {
        Ok(config) => config,
        Err(e) => return error_response(e),
    };
    let (ctx, _guard) = call_context();
    let response = provider.read_data_source(&ctx, &type_name, &config).await;
    Json(StateResult::from(response)).into_response()
}

/// Health check
async fn health_check() -> &'static str {
    "ok"
}

async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::gather_text(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::client::{MemoryTransport, ZentralClient};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn provider() -> Arc<Provider> {
        let provider = Provider::default();
        let transport = Arc::new(MemoryTransport::new());
        Catalog::zentral().register_collections(&transport);
        assert!(provider
            .configure_client(Arc::new(ZentralClient::new(transport)))
            .is_empty());
        Arc::new(provider)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: JsonValue) -> (StatusCode, JsonValue) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, json)
    }

    #[test]
    fn test_handshake_line() {
        let addr: SocketAddr = "127.0.0.1:4242".parse().unwrap();
        assert_eq!(handshake_line(addr), "ZENTRAL_PROVIDER|1|127.0.0.1:4242");
    }

    #[tokio::test]
    async fn test_health_and_schema() {
        let app = router(provider());
        let (status, body) = call(&app, "GET", "/healthz", JsonValue::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, JsonValue::String("ok".into()));

        let (status, body) = call(&app, "GET", "/v1/schema", JsonValue::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["provider"]["attributes"]["token"]["sensitive"], json!(true));
        assert!(body["resources"]["zentral_santa_rule"].is_object());
        assert!(body["data_sources"]["zentral_mdm_location"].is_object());
    }

    #[tokio::test]
    async fn test_tag_lifecycle_over_http() {
        let app = router(provider());

        let (status, plan) = call(
            &app,
            "POST",
            "/v1/resources/zentral_tag/plan",
            json!({"config": {"name": "Mac"}}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(plan["planned_state"]["id"], json!({"$unknown": true}));
        assert_eq!(plan["planned_state"]["color"], json!("0079bf"));

        let (_, created) = call(
            &app,
            "POST",
            "/v1/resources/zentral_tag/create",
            json!({"planned_state": plan["planned_state"]}),
        )
        .await;
        assert_eq!(created["diagnostics"], json!([]));
        let id = created["state"]["id"].as_i64().unwrap();

        let (_, imported) = call(
            &app,
            "POST",
            "/v1/resources/zentral_tag/import",
            json!({"id": id.to_string()}),
        )
        .await;
        let (_, read) = call(
            &app,
            "POST",
            "/v1/resources/zentral_tag/read",
            json!({"prior_state": imported["state"]}),
        )
        .await;
        assert_eq!(read["state"], created["state"]);

        let (_, found) = call(
            &app,
            "POST",
            "/v1/data-sources/zentral_tag/read",
            json!({"config": {"name": "Mac"}}),
        )
        .await;
        assert_eq!(found["state"]["id"], json!(id));

        let (_, deleted) = call(
            &app,
            "POST",
            "/v1/resources/zentral_tag/delete",
            json!({"prior_state": created["state"]}),
        )
        .await;
        assert_eq!(deleted["diagnostics"], json!([]));
    }

    #[tokio::test]
    async fn test_errors() {
        let app = router(provider());
        let (status, body) = call(&app, "POST", "/v1/resources/zentral_nope/validate", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("unknown_type"));

        let (status, body) = call(
            &app,
            "POST",
            "/v1/resources/zentral_tag/validate",
            json!({"config": {"name": 12}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"], json!("name"));

        let (status, body) = call(
            &app,
            "POST",
            "/v1/data-sources/zentral_tag/validate",
            json!({"config": {"id": 1, "name": "Mac"}}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["diagnostics"][0]["summary"], json!("Invalid Configuration"));
        assert_eq!(body["diagnostics"][0]["attributes"], json!([["id"], ["name"]]));
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        crate::metrics::record_api_request("/test/server/", "read", crate::metrics::Outcome::Success);
        let app = router(provider());
        let (status, body) = call(&app, "GET", "/metrics", JsonValue::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_str().unwrap().contains("zentral_provider_api_requests_total"));
    }
}
