//! Zentral Provider - Infrastructure-as-code provider for Zentral
//!
//! Manages Zentral configuration objects (inventory, MDM, Munki, Osquery,
//! Santa, Monolith, probes, stores) declaratively through a host engine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Host engine (plan / apply)                  │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ plugin endpoint (JSON/HTTP)
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │  Provider: configure, catalog, validate / plan / CRUD        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Generic resource & data-source handlers                     │
//! │  ┌─────────────────┐  ┌──────────────────┐  ┌─────────────┐  │
//! │  │ Schema registry │  │ Value translation│  │ Identifiers │  │
//! │  │ (catalog)       │  │ (entity codecs)  │  │ & lookups   │  │
//! │  └─────────────────┘  └──────────────────┘  └─────────────┘  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Zentral client: HTTP transport / in-memory transport        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`domain`]: tri-state values and the handler contracts
//! - [`schema`]: attribute descriptors, validation and plan modifiers
//! - [`translate`]: declarative value to wire record translation
//! - [`catalog`]: every Zentral entity the provider exposes
//! - [`client`]: Zentral REST client
//! - [`handlers`]: generic resource and data-source handlers
//! - [`provider`]: provider configuration and plugin entry points
//! - [`server`]: JSON-over-HTTP plugin endpoint
//! - [`error`]: error taxonomy and diagnostics

pub mod catalog;
pub mod client;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod provider;
pub mod schema;
pub mod server;
pub mod translate;

// Re-export commonly used types
pub use catalog::{Catalog, EntityDef, Lookup, LookupKey};

pub use client::{ClientConfig, HttpTransport, KeyKind, Transport, ZentralClient};
#[cfg(any(test, feature = "test-support"))]
pub use client::MemoryTransport;

pub use domain::ports::{
    CallContext, ClientHandle, DataSource, PlanResponse, Resource, StateResponse,
};
pub use domain::value::Value;

pub use error::{AttributePath, Diagnostic, Diagnostics, Error, Result, Severity};

pub use provider::Provider;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
