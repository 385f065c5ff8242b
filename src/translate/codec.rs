//! Entity codecs
//!
//! Every catalog entry owns an [`EntityCodec`]. The default is the plain
//! schema-driven translation; the special codecs below layer cross-field
//! checks and encode-time policies on top of it.

use super::composite::{decode_block, encode_block};
use super::primitives::canonical_json;
use super::records::BackendUnion;
use crate::domain::value::Value;
use crate::error::{AttributePath, Diagnostics, Error, Result};
use crate::schema::Block;
use serde_json::{Map as JsonMap, Value as Json};
use std::fmt;
use tracing::debug;

/// Wire record of an entity
pub type Record = JsonMap<String, Json>;

/// Entity-level translation between the declarative model and the wire model
pub trait EntityCodec: Send + Sync + fmt::Debug {
    /// Cross-attribute checks on a configuration, run at validate and plan time
    fn validate(&self, _value: &Value, _diags: &mut Diagnostics) {}

    /// Declarative object to wire record
    fn encode(&self, block: &Block, value: &Value) -> Result<Record> {
        encode_block(block, value, &AttributePath::root())
    }

    /// Wire record to declarative object
    fn decode(&self, block: &Block, json: &Json, prior: &Value) -> Result<Value> {
        decode_block(block, json, prior, &AttributePath::root())
    }
}

// =============================================================================
// Schema Codec
// =============================================================================

/// Plain schema-driven codec
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaCodec;

impl EntityCodec for SchemaCodec {}

// =============================================================================
// Backend Codec
// =============================================================================

/// Exactly-one-backend enforcement before encoding
#[derive(Debug, Clone)]
pub struct BackendCodec {
    union: BackendUnion,
}

impl BackendCodec {
    pub fn new(union: BackendUnion) -> Self {
        Self { union }
    }
}

impl EntityCodec for BackendCodec {
    fn validate(&self, value: &Value, diags: &mut Diagnostics) {
        if let Err(err) = self.union.check(value, &AttributePath::root()) {
            diags.add(err);
        }
    }

    fn encode(&self, block: &Block, value: &Value) -> Result<Record> {
        self.union.check(value, &AttributePath::root())?;
        encode_block(block, value, &AttributePath::root())
    }
}

// =============================================================================
// Santa Rule
// =============================================================================

/// `cel_expr` goes with the CEL policy and only with it
#[derive(Debug, Default, Clone, Copy)]
pub struct SantaRuleCodec;

impl SantaRuleCodec {
    fn check(&self, value: &Value) -> Result<()> {
        let (policy, cel_expr) = match (value.get("policy"), value.get("cel_expr")) {
            (Value::String(policy), Value::String(expr)) => (policy.as_str(), expr.as_str()),
            (Value::String(policy), Value::Null) => (policy.as_str(), ""),
            _ => return Ok(()),
        };
        let paths = vec![AttributePath::attr("cel_expr"), AttributePath::attr("policy")];
        if policy == "CEL" && cel_expr.is_empty() {
            return Err(Error::invalid_configuration("cel_expr is required when policy is CEL", paths));
        }
        if policy != "CEL" && !cel_expr.is_empty() {
            return Err(Error::invalid_configuration(
                "cel_expr can only be set when policy is CEL",
                paths,
            ));
        }
        Ok(())
    }
}

impl EntityCodec for SantaRuleCodec {
    fn validate(&self, value: &Value, diags: &mut Diagnostics) {
        if let Err(err) = self.check(value) {
            diags.add(err);
        }
    }

    fn encode(&self, block: &Block, value: &Value) -> Result<Record> {
        self.check(value)?;
        encode_block(block, value, &AttributePath::root())
    }
}

// =============================================================================
// MDM Software Update Enforcement
// =============================================================================

pub const DEFAULT_DELAY_DAYS: i64 = 14;
pub const DEFAULT_LOCAL_TIME: &str = "09:30:00";

/// Encode-time defaults for the delayed enforcement.
///
/// Zentral applies 14 days at 09:30 when a latest-version enforcement is
/// created without them. Sending the same values keeps the state in line
/// with what the server stores.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareUpdateEnforcementCodec;

impl EntityCodec for SoftwareUpdateEnforcementCodec {
    fn encode(&self, block: &Block, value: &Value) -> Result<Record> {
        let mut value = value.clone();
        let latest = matches!(value.get("max_os_version"), Value::String(v) if !v.is_empty());
        for (name, default) in [
            ("delay_days", Value::Int(DEFAULT_DELAY_DAYS)),
            ("local_time", Value::from(DEFAULT_LOCAL_TIME)),
        ] {
            if value.get(name).is_unknown() {
                let filled = if latest { default } else { Value::Null };
                debug!(attribute = name, value = %filled, "Filling unknown enforcement attribute");
                value.set(name, filled);
            }
        }
        encode_block(block, &value, &AttributePath::root())
    }
}

// =============================================================================
// MDM Enrollment Custom View
// =============================================================================

/// Inline `html` or `html_file`, read when the record is sent
#[derive(Debug, Default, Clone, Copy)]
pub struct CustomViewCodec;

impl EntityCodec for CustomViewCodec {
    fn encode(&self, block: &Block, value: &Value) -> Result<Record> {
        let mut value = value.clone();
        if let Some(path) = value.get_str("html_file").map(str::to_owned) {
            let html = std::fs::read_to_string(&path).map_err(|e| {
                Error::invalid_value(
                    AttributePath::attr("html_file"),
                    format!("could not read {}: {}", path, e),
                )
            })?;
            debug!(path = %path, bytes = html.len(), "Read custom view HTML");
            value.set("html", Value::String(html));
        }
        if !value.get("html").is_known() {
            return Err(Error::invalid_configuration(
                "html or html_file missing",
                vec![AttributePath::attr("html"), AttributePath::attr("html_file")],
            ));
        }
        encode_block(block, &value, &AttributePath::root())
    }
}

// =============================================================================
// MDM Declaration
// =============================================================================

/// Declaration `source`: JSON text on the host side, JSON object on the wire.
///
/// Decoding keeps the prior text when it is semantically equal to what the
/// server returned, and falls back to the canonical form otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclarationCodec;

impl DeclarationCodec {
    const FIELD: &'static str = "source";
}

impl EntityCodec for DeclarationCodec {
    fn encode(&self, block: &Block, value: &Value) -> Result<Record> {
        let mut record = encode_block(block, value, &AttributePath::root())?;
        if let Some(Json::String(text)) = record.get(Self::FIELD) {
            let parsed: Json = serde_json::from_str(text).map_err(|e| {
                Error::invalid_value(AttributePath::attr(Self::FIELD), format!("invalid JSON: {}", e))
            })?;
            record.insert(Self::FIELD.to_string(), parsed);
        }
        Ok(record)
    }

    fn decode(&self, block: &Block, json: &Json, prior: &Value) -> Result<Value> {
        let mut json = json.clone();
        if let Some(record) = json.as_object_mut() {
            if let Some(source) = record.get(Self::FIELD).filter(|s| !s.is_null() && !s.is_string()) {
                let keep_prior = prior
                    .get_str(Self::FIELD)
                    .and_then(|text| serde_json::from_str::<Json>(text).ok())
                    .map_or(false, |prior_source| &prior_source == source);
                let text = match prior.get_str(Self::FIELD) {
                    Some(text) if keep_prior => text.to_string(),
                    _ => canonical_json(source),
                };
                record.insert(Self::FIELD.to_string(), Json::String(text));
            }
        }
        decode_block(block, &json, prior, &AttributePath::root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttrType, Attribute, Constraint, Validator};
    use crate::translate::records::{cert_issuer_backend_block, cert_issuer_union, ACME_ISSUER_BACKENDS};
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_santa_rule_cel_expr_goes_with_cel_policy() {
        let rule = |policy: &str, cel_expr: &str| {
            Value::object([("policy", Value::from(policy)), ("cel_expr", Value::from(cel_expr))])
        };

        let mut diags = Diagnostics::new();
        SantaRuleCodec.validate(&rule("CEL", "target.signing_time >= timestamp('2025-05-31T00:00:00Z')"), &mut diags);
        assert!(diags.is_empty());

        let mut diags = Diagnostics::new();
        SantaRuleCodec.validate(&rule("CEL", ""), &mut diags);
        assert!(diags.has_errors());

        let mut diags = Diagnostics::new();
        SantaRuleCodec.validate(&rule("BLOCKLIST", "true"), &mut diags);
        assert!(diags.has_errors());

        let mut diags = Diagnostics::new();
        SantaRuleCodec.validate(&rule("BLOCKLIST", ""), &mut diags);
        assert!(diags.is_empty());

        let mut diags = Diagnostics::new();
        let pending = Value::object([("policy", Value::Unknown), ("cel_expr", Value::from("x"))]);
        SantaRuleCodec.validate(&pending, &mut diags);
        assert!(diags.is_empty());
    }

    fn enforcement_block() -> Block {
        Block::new()
            .attr("name", Attribute::required(AttrType::String))
            .attr("max_os_version", Attribute::optional(AttrType::String).default(""))
            .attr("delay_days", Attribute::optional_computed(AttrType::Int))
            .attr(
                "local_time",
                Attribute::optional_computed(AttrType::String).validate(Validator::TimeOfDay),
            )
    }

    #[test]
    fn test_software_update_enforcement_defaults() {
        let value = Value::object([
            ("name", Value::from("latest")),
            ("max_os_version", Value::from("15")),
            ("delay_days", Value::Unknown),
            ("local_time", Value::Unknown),
        ]);
        let record = SoftwareUpdateEnforcementCodec.encode(&enforcement_block(), &value).unwrap();
        assert_eq!(record["delay_days"], json!(14));
        assert_eq!(record["local_time"], json!("09:30:00"));

        let value = Value::object([
            ("name", Value::from("latest")),
            ("max_os_version", Value::from("15")),
            ("delay_days", Value::Int(3)),
            ("local_time", Value::Unknown),
        ]);
        let record = SoftwareUpdateEnforcementCodec.encode(&enforcement_block(), &value).unwrap();
        assert_eq!(record["delay_days"], json!(3));

        let value = Value::object([
            ("name", Value::from("one time")),
            ("max_os_version", Value::from("")),
            ("delay_days", Value::Unknown),
            ("local_time", Value::Unknown),
        ]);
        let record = SoftwareUpdateEnforcementCodec.encode(&enforcement_block(), &value).unwrap();
        assert_eq!(record["delay_days"], Json::Null);
        assert_eq!(record["local_time"], Json::Null);
    }

    fn custom_view_block() -> Block {
        Block::new()
            .attr("name", Attribute::required(AttrType::String))
            .attr("html", Attribute::optional_computed(AttrType::String))
            .attr("html_file", Attribute::optional(AttrType::String).local())
            .constraint(Constraint::ExactlyOneOf(vec!["html", "html_file"]))
    }

    #[test]
    fn test_custom_view_reads_html_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<h1>Welcome</h1>").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let value = Value::object([
            ("name", Value::from("welcome")),
            ("html", Value::Unknown),
            ("html_file", Value::from(path.as_str())),
        ]);
        let record = CustomViewCodec.encode(&custom_view_block(), &value).unwrap();
        assert_eq!(record["html"], json!("<h1>Welcome</h1>"));
        assert!(!record.contains_key("html_file"));

        let decoded = CustomViewCodec
            .decode(&custom_view_block(), &Json::Object(record), &value)
            .unwrap();
        assert_eq!(decoded.get_str("html_file"), Some(path.as_str()));
        assert_eq!(decoded.get_str("html"), Some("<h1>Welcome</h1>"));
    }

    #[test]
    fn test_custom_view_missing_file() {
        let value = Value::object([
            ("name", Value::from("welcome")),
            ("html", Value::Unknown),
            ("html_file", Value::from("/nonexistent/zentral/view.html")),
        ]);
        assert_matches!(
            CustomViewCodec.encode(&custom_view_block(), &value),
            Err(Error::InvalidAttributeValue { .. })
        );
    }

    fn declaration_block() -> Block {
        Block::new()
            .attr("id", crate::schema::uuid_id())
            .attr("source", Attribute::required(AttrType::String).validate(Validator::Json))
    }

    #[test]
    fn test_declaration_source_is_stable() {
        let text = "{\n  \"Type\": \"com.apple.configuration.passcode.settings\",\n  \"Payload\": {\"RequireAlphanumericPasscode\": true}\n}";
        let value = Value::object([("id", Value::Unknown), ("source", Value::from(text))]);

        let mut record = DeclarationCodec.encode(&declaration_block(), &value).unwrap();
        assert_eq!(record["source"]["Payload"]["RequireAlphanumericPasscode"], json!(true));
        record.insert("id".into(), json!("6f0c4d8e-2a4b-4a8e-9d51-0b9e2c1f6a10"));

        let decoded = DeclarationCodec
            .decode(&declaration_block(), &Json::Object(record.clone()), &value)
            .unwrap();
        assert_eq!(decoded.get_str("source"), Some(text));

        // Imported: no prior text, canonical form.
        let decoded = DeclarationCodec
            .decode(&declaration_block(), &Json::Object(record), &Value::Null)
            .unwrap();
        assert_eq!(
            decoded.get_str("source"),
            Some(r#"{"Payload":{"RequireAlphanumericPasscode":true},"Type":"com.apple.configuration.passcode.settings"}"#)
        );
    }

    #[test]
    fn test_declaration_malformed_source() {
        let value = Value::object([("id", Value::Unknown), ("source", Value::from("{not json"))]);
        assert_matches!(
            DeclarationCodec.encode(&declaration_block(), &value),
            Err(Error::InvalidAttributeValue { ref path, .. }) if path.to_string() == "source"
        );
    }

    #[test]
    fn test_backend_codec_rejects_two_backends_before_encoding() {
        let block = Block::new()
            .attr("name", Attribute::required(AttrType::String))
            .merge(cert_issuer_backend_block(ACME_ISSUER_BACKENDS));
        let codec = BackendCodec::new(cert_issuer_union(ACME_ISSUER_BACKENDS));
        let value = Value::object([
            ("name", Value::from("issuer")),
            ("backend", Value::from("STATIC_CHALLENGE")),
            ("ident", Value::Null),
            ("microsoft_ca", Value::Null),
            ("okta_ca", Value::Null),
            ("static_challenge", Value::object([("challenge", Value::from("s"))])),
        ]);
        let record = codec.encode(&block, &value).unwrap();
        assert_eq!(record["backend"], json!("STATIC_CHALLENGE"));
        assert_eq!(record["static_challenge"], json!({"challenge": "s"}));
        assert_eq!(record["ident"], Json::Null);

        let mut both = value.clone();
        both.set("okta_ca", Value::object([("url", Value::from("u"))]));
        assert_matches!(codec.encode(&block, &both), Err(Error::InvalidConfiguration { .. }));

        let mut diags = Diagnostics::new();
        codec.validate(&both, &mut diags);
        assert_eq!(diags.len(), 1);
    }
}
