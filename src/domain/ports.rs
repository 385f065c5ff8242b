//! Domain Ports - Handler contracts of the provider
//!
//! The host drives every resource and data source through these traits.
//! Handlers are pure steps: they take the prior state, the plan or the
//! configuration, and return the new state plus accumulated diagnostics.

use super::value::Value;
use crate::error::{AttributePath, Diagnostics};
use crate::schema::Schema;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Client handle handed to handlers at configure time
pub type ClientHandle = Arc<dyn Any + Send + Sync>;

// =============================================================================
// Call Context
// =============================================================================

/// Per-call context; cancellation from the host propagates into the remote call
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the host cancelled the call
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

// =============================================================================
// Responses
// =============================================================================

/// New state of a resource or data source. `state == None` means the host
/// must not write anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateResponse {
    pub state: Option<Value>,
    pub diagnostics: Diagnostics,
}

impl StateResponse {
    pub fn ok(state: Value) -> Self {
        Self {
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn failed(diagnostics: impl Into<Diagnostics>) -> Self {
        Self {
            state: None,
            diagnostics: diagnostics.into(),
        }
    }
}

/// Planned state of a resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanResponse {
    pub planned: Option<Value>,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Diagnostics,
}

// =============================================================================
// Handler Traits
// =============================================================================

/// Resource handler: Create / Read / Update / Delete / ImportState
#[async_trait]
pub trait Resource: Send + Sync {
    /// Kind name exposed to the host, e.g. `zentral_santa_rule`
    fn type_name(&self) -> &str;

    fn schema(&self) -> &Schema;

    /// Store the client handle. An absent handle is a no-op.
    fn configure(&self, client: Option<ClientHandle>) -> Diagnostics;

    /// Schema validators plus the handler's cross-field checks
    fn validate(&self, config: &Value) -> Diagnostics;

    /// Apply plan modifiers to a configuration. `prior` is `None` on create.
    fn plan(&self, prior: Option<&Value>, config: &Value) -> PlanResponse;

    async fn create(&self, ctx: &CallContext, plan: &Value) -> StateResponse;

    async fn read(&self, ctx: &CallContext, state: &Value) -> StateResponse;

    async fn update(&self, ctx: &CallContext, prior: &Value, plan: &Value) -> StateResponse;

    async fn delete(&self, ctx: &CallContext, state: &Value) -> Diagnostics;

    /// Turn an import identifier into a state holding only the id
    fn import_state(&self, id: &str) -> StateResponse;
}

/// Data source handler: ValidateConfig / Read
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &str;

    fn schema(&self) -> &Schema;

    fn configure(&self, client: Option<ClientHandle>) -> Diagnostics;

    /// Identifier cardinality and schema validators
    fn validate(&self, config: &Value) -> Diagnostics;

    async fn read(&self, ctx: &CallContext, config: &Value) -> StateResponse;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_call_context_cancellation() {
        let ctx = CallContext::new();
        assert!(!ctx.is_cancelled());

        let child = ctx.clone();
        ctx.cancel();
        assert!(child.is_cancelled());
        child.cancelled().await;
    }
}
