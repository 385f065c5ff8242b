//! Provider configuration
//!
//! `base_url` and `token` come from the provider block, or from
//! `ZTL_API_BASE_URL` / `ZTL_API_TOKEN` when the block leaves them null.

use crate::client::ClientConfig;
use crate::domain::value::Value;
use crate::error::{AttributePath, Diagnostic, Diagnostics, Error};
use crate::schema::{AttrType, Attribute, Block, Schema};
use std::time::Duration;
use tracing::warn;

pub const BASE_URL_ENV: &str = "ZTL_API_BASE_URL";
pub const TOKEN_ENV: &str = "ZTL_API_TOKEN";

/// Default remote request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Schema of the provider block
pub fn provider_schema() -> Schema {
    Schema::new(
        "Interact with Zentral.",
        Block::new()
            .attr(
                "base_url",
                Attribute::optional(AttrType::String).describe(
                    "Zentral API base URL. May also be provided via the ZTL_API_BASE_URL environment variable.",
                ),
            )
            .attr(
                "token",
                Attribute::optional(AttrType::String)
                    .describe("Zentral API token. May also be provided via the ZTL_API_TOKEN environment variable.")
                    .sensitive(),
            ),
    )
}

/// Environment variable lookup
pub type Env<'a> = &'a dyn Fn(&str) -> Option<String>;

/// The process environment
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Outcome of resolving the provider block
#[derive(Debug)]
pub struct Resolution {
    /// `None` when configuration is deferred or failed
    pub client: Option<ClientConfig>,
    pub diagnostics: Diagnostics,
}

/// Resolve the provider block into a client configuration.
///
/// Unknown values defer configuration with a warning; empty values are
/// errors.
pub fn resolve(config: &Value, env: Env<'_>, timeout: Duration) -> Resolution {
    let mut diagnostics = Diagnostics::new();

    for (attribute, env_var, what) in [
        ("base_url", BASE_URL_ENV, "API base URL"),
        ("token", TOKEN_ENV, "API token"),
    ] {
        if config.get(attribute).is_unknown() {
            warn!(attribute, "Zentral provider configuration is unknown, deferring");
            diagnostics.push(
                Diagnostic::warning(
                    format!("Unknown Zentral {}", what),
                    format!(
                        "The provider cannot create the Zentral API client as there is an unknown configuration value for the Zentral {}. \
                         Either target apply the source of the value first, set the value statically in the configuration, or use the {} environment variable.",
                        what, env_var
                    ),
                )
                .with_attribute(AttributePath::attr(attribute)),
            );
        }
    }
    if !diagnostics.is_empty() {
        return Resolution {
            client: None,
            diagnostics,
        };
    }

    let base_url = setting(config, "base_url", env, BASE_URL_ENV);
    let token = setting(config, "token", env, TOKEN_ENV);

    for (value, attribute, env_var, what) in [
        (&base_url, "base_url", BASE_URL_ENV, "API base URL"),
        (&token, "token", TOKEN_ENV, "API token"),
    ] {
        if value.is_empty() {
            let mut diagnostic: Diagnostic = Error::ProviderConfiguration(format!(
                "The provider cannot create the Zentral API client as there is a missing or empty value for the Zentral {}. \
                 Set the {} value in the configuration or use the {} environment variable.",
                what, attribute, env_var
            ))
            .into();
            diagnostic.summary = format!("Missing Zentral {}", what);
            diagnostics.push(diagnostic.with_attribute(AttributePath::attr(attribute)));
        }
    }
    if diagnostics.has_errors() {
        return Resolution {
            client: None,
            diagnostics,
        };
    }

    Resolution {
        client: Some(ClientConfig::new(base_url, token).with_timeout(timeout)),
        diagnostics,
    }
}

/// Explicit value first, then the environment
fn setting(config: &Value, attribute: &str, env: Env<'_>, env_var: &str) -> String {
    match config.get(attribute) {
        Value::String(value) => value.clone(),
        _ => env(env_var).unwrap_or_default(),
    }
}
