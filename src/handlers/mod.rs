//! Reconciliation handlers
//!
//! One generic [`ResourceHandler`] and one generic [`DataSourceHandler`]
//! drive every catalog entity. Entity specifics come from the
//! [`EntityDef`](crate::catalog::EntityDef): schema, endpoint, key flavour
//! and codec.

pub mod data_source;
pub mod identity;
pub mod resource;

pub use data_source::DataSourceHandler;
pub use resource::ResourceHandler;

use crate::client::ZentralClient;
use crate::domain::ports::ClientHandle;
use crate::error::{Diagnostics, Error, Result};
use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Client handle stored by a handler at configure time
#[derive(Debug, Default)]
pub struct ClientSlot(RwLock<Option<Arc<ZentralClient>>>);

impl ClientSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the client. An absent handle is not an error: the host calls
    /// configure before the provider itself is configured.
    pub fn configure(&self, type_name: &str, handle: Option<ClientHandle>) -> Diagnostics {
        let Some(handle) = handle else {
            debug!(type_name, "No client handle yet, skipping configure");
            return Diagnostics::new();
        };
        match handle.downcast::<ZentralClient>() {
            Ok(client) => {
                *self.0.write() = Some(client);
                Diagnostics::new()
            }
            Err(other) => Diagnostics::from(Error::UnexpectedType {
                expected: "*ZentralClient".to_string(),
                got: format!("{:?}", Any::type_id(&*other)),
            }),
        }
    }

    pub fn get(&self) -> Result<Arc<ZentralClient>> {
        self.0.read().clone().ok_or_else(|| {
            Error::ProviderConfiguration("The Zentral client has not been configured.".to_string())
        })
    }

    pub fn is_configured(&self) -> bool {
        self.0.read().is_some()
    }
}
