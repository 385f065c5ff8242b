//! Error types for the Zentral provider
//!
//! Provides the error taxonomy surfaced to the host and the diagnostics bag
//! the plugin contract returns with every response.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

// =============================================================================
// Attribute Paths
// =============================================================================

/// Path to an attribute inside a resource or data source value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AttributePath(Vec<PathStep>);

/// One step in an attribute path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathStep {
    Attribute(String),
    Index(usize),
    Key(String),
}

impl AttributePath {
    /// The empty (root) path
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path to a top-level attribute
    pub fn attr(name: &str) -> Self {
        Self(vec![PathStep::Attribute(name.to_string())])
    }

    /// Extend with a nested attribute name
    pub fn at(&self, name: &str) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Attribute(name.to_string()));
        Self(steps)
    }

    /// Extend with a list index
    pub fn index(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Index(index));
        Self(steps)
    }

    /// Extend with a map key
    pub fn key(&self, key: &str) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Key(key.to_string()));
        Self(steps)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => write!(f, "{}", name)?,
                PathStep::Attribute(name) => write!(f, ".{}", name)?,
                PathStep::Index(index) => write!(f, "[{}]", index)?,
                PathStep::Key(key) => write!(f, "[\"{}\"]", key)?,
            }
        }
        Ok(())
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Remote operation verbs, used in client error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

// =============================================================================
// Error
// =============================================================================

/// Unified error type for the provider
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Host-facing taxonomy
    // =========================================================================
    #[error("{0}")]
    ProviderConfiguration(String),

    #[error("Unable to {operation} {kind}{}, got error: {message}", id_suffix(.id))]
    Client {
        kind: String,
        operation: Operation,
        id: Option<String>,
        status: Option<u16>,
        message: String,
    },

    #[error("{message}")]
    InvalidConfiguration {
        message: String,
        paths: Vec<AttributePath>,
    },

    #[error("{message}")]
    InvalidAttributeValue {
        path: AttributePath,
        message: String,
    },

    #[error("{kind} lookup by {field} {value:?} returned {count} results")]
    AmbiguousLookup {
        kind: String,
        field: String,
        value: String,
        count: usize,
    },

    #[error("Expected {expected}, got: {got}. Please report this issue to the provider developers.")]
    UnexpectedType { expected: String, got: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

fn id_suffix(id: &Option<String>) -> String {
    match id {
        Some(id) => format!(" {}", id),
        None => String::new(),
    }
}

impl Error {
    /// Invalid attribute value at a path
    pub fn invalid_value(path: AttributePath, message: impl Into<String>) -> Self {
        Error::InvalidAttributeValue {
            path,
            message: message.into(),
        }
    }

    /// Invalid configuration touching the given attribute paths
    pub fn invalid_configuration(message: impl Into<String>, paths: Vec<AttributePath>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
            paths,
        }
    }

    /// Check if this is a remote "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Client { status: Some(404), .. })
    }

    /// Diagnostic summary naming the error class
    pub fn summary(&self) -> &'static str {
        match self {
            Error::ProviderConfiguration(_) => "Provider Configuration Error",
            Error::Client { .. } => "Client Error",
            Error::InvalidConfiguration { .. } => "Invalid Configuration",
            Error::InvalidAttributeValue { .. } => "Invalid Attribute Value",
            Error::AmbiguousLookup { .. } => "Ambiguous Lookup",
            Error::UnexpectedType { .. } => "Unexpected Type",
            Error::UnknownEntityType(_) => "Unknown Type",
            Error::Internal(_) | Error::Json(_) | Error::Io(_) | Error::Http(_) => "Internal Error",
        }
    }

    /// Attribute paths this error points at
    pub fn paths(&self) -> Vec<AttributePath> {
        match self {
            Error::InvalidConfiguration { paths, .. } => paths.clone(),
            Error::InvalidAttributeValue { path, .. } if !path.is_root() => vec![path.clone()],
            _ => Vec::new(),
        }
    }
}

/// Result type alias for the provider
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Diagnostics
// =============================================================================

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic returned to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attributes: Vec::new(),
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attributes.push(path);
        self
    }
}

impl From<Error> for Diagnostic {
    fn from(err: Error) -> Self {
        Self {
            severity: Severity::Error,
            summary: err.summary().to_string(),
            detail: err.to_string(),
            attributes: err.paths(),
        }
    }
}

/// Accumulated diagnostics; nothing is silently swallowed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Record an error
    pub fn add(&mut self, err: Error) {
        self.0.push(err.into());
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.0.push(Diagnostic::warning(summary, detail));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Errors only
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Error)
    }
}

impl From<Error> for Diagnostics {
    fn from(err: Error) -> Self {
        Self(vec![err.into()])
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
