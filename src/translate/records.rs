//! Shared sub-record translators
//!
//! Named shapes reused across the catalog. Each one is a block (or an
//! attribute wrapping one) that the schema-driven codec translates; the
//! polymorphic backends also carry the exactly-one-backend rule.

use crate::domain::value::Value;
use crate::error::{AttributePath, Error, Result};
use crate::schema::{self, AttrType, Attribute, Block, Validator};

// =============================================================================
// Enrollment Secret
// =============================================================================

/// Enrollment secret embedded in every enrollment entity.
///
/// The secret itself is minted by the server and mirrored into state after
/// create.
pub fn enrollment_secret() -> Attribute {
    let block = Block::new()
        .attr(
            "secret",
            Attribute::computed(AttrType::String)
                .describe("Enrollment secret.")
                .sensitive()
                .use_state_for_unknown()
                .read_only(),
        )
        .attr(
            "meta_business_unit_id",
            Attribute::required(AttrType::Int)
                .describe("The ID of the meta business unit the machines will be assigned to at enrollment."),
        )
        .attr(
            "tag_ids",
            schema::tag_ids("The IDs of the tags that the machines will get at enrollment.").wire_name("tags"),
        )
        .attr(
            "serial_numbers",
            schema::string_set("The serial numbers the enrollment is restricted to."),
        )
        .attr("udids", schema::string_set("The UDIDs the enrollment is restricted to."))
        .attr(
            "quota",
            Attribute::optional(AttrType::Int)
                .describe("The number of time the enrollment can be used.")
                .validate(Validator::IntBetween(1, 10000)),
        )
        .attr(
            "request_count",
            Attribute::computed(AttrType::Int)
                .describe("The number of time the enrollment has been used.")
                .read_only(),
        );

    Attribute::required(block.into_type())
        .describe("Enrollment secret.")
        .wire_name("enrollment_secret")
}

// =============================================================================
// Event Filter Set
// =============================================================================

fn event_filter() -> Block {
    Block::new()
        .attr(
            "tags",
            Attribute::optional(AttrType::string_set())
                .describe("Event tags.")
                .nullable_empty(),
        )
        .attr(
            "event_type",
            Attribute::optional(AttrType::string_set())
                .describe("Event types.")
                .nullable_empty(),
        )
        .attr(
            "routing_key",
            Attribute::optional(AttrType::string_set())
                .describe("Event routing keys.")
                .nullable_empty(),
        )
}

/// Included and excluded event filter sets
pub fn event_filter_set(description: &'static str) -> Attribute {
    let block = Block::new()
        .attr(
            "included_event_filters",
            Attribute::optional(AttrType::set_of(event_filter().into_type()))
                .describe("Event filters used to select the events. All events are included if empty.")
                .nullable_empty(),
        )
        .attr(
            "excluded_event_filters",
            Attribute::optional(AttrType::set_of(event_filter().into_type()))
                .describe("Event filters used to exclude events.")
                .nullable_empty(),
        );
    Attribute::optional(block.into_type()).describe(description)
}

// =============================================================================
// HTTP Headers
// =============================================================================

/// Set of HTTP headers; values are sensitive
pub fn http_headers(description: &'static str) -> Attribute {
    let block = Block::new()
        .attr("name", Attribute::required(AttrType::String).describe("Header name."))
        .attr(
            "value",
            Attribute::required(AttrType::String).describe("Header value.").sensitive(),
        );
    Attribute::optional(AttrType::set_of(block.into_type()))
        .describe(description)
        .default(Value::empty_set())
}

// =============================================================================
// Tag Shards
// =============================================================================

/// Per-tag shard overrides
pub fn tag_shards() -> Attribute {
    let block = Block::new()
        .attr("tag_id", Attribute::required(AttrType::Int).describe("Tag ID.").wire_name("tag"))
        .attr(
            "shard",
            Attribute::required(AttrType::Int)
                .describe("Shard for the tag.")
                .validate(Validator::IntBetween(1, 1000)),
        );
    Attribute::optional(AttrType::set_of(block.into_type()))
        .describe("Shards for specific tags.")
        .default(Value::empty_set())
}

/// `default_shard` / `shard_modulo` pair used by the partial rollouts
pub fn sharding() -> Block {
    Block::new()
        .attr(
            "default_shard",
            Attribute::optional(AttrType::Int)
                .describe("Default shard value. Must be less than or equal to the shard modulo.")
                .default(100)
                .validate(Validator::IntBetween(0, 1000)),
        )
        .attr(
            "shard_modulo",
            Attribute::optional(AttrType::Int)
                .describe("Shard modulo.")
                .default(100)
                .validate(Validator::IntBetween(1, 1000)),
        )
}

// =============================================================================
// MDM Artifact Version Base
// =============================================================================

pub const MDM_PLATFORMS: &[&str] = &["ios", "ipados", "macos", "tvos"];

/// Per-platform flags with their optional min/max version windows
pub fn platform_flags() -> Block {
    let mut block = Block::new();
    for platform in MDM_PLATFORMS {
        let (flag, min, max): (&'static str, &'static str, &'static str) = match *platform {
            "ios" => ("ios", "ios_min_version", "ios_max_version"),
            "ipados" => ("ipados", "ipados_min_version", "ipados_max_version"),
            "macos" => ("macos", "macos_min_version", "macos_max_version"),
            _ => ("tvos", "tvos_min_version", "tvos_max_version"),
        };
        block = block
            .attr(
                flag,
                Attribute::optional(AttrType::Bool)
                    .describe("Enable the platform.")
                    .default(false),
            )
            .attr(
                min,
                Attribute::optional(AttrType::String)
                    .describe("Minimum OS version (inclusive).")
                    .default(""),
            )
            .attr(
                max,
                Attribute::optional(AttrType::String)
                    .describe("Maximum OS version (exclusive).")
                    .default(""),
            );
    }
    block
}

/// Attributes shared by every MDM artifact version variant
pub fn artifact_version_base() -> Block {
    Block::new()
        .attr("id", schema::uuid_id())
        .attr(
            "artifact_id",
            Attribute::required(AttrType::String)
                .describe("ID of the artifact.")
                .wire_name("artifact")
                .requires_replace(),
        )
        .merge(platform_flags())
        .merge(sharding())
        .attr(
            "excluded_tag_ids",
            schema::tag_ids("Machines tagged with one of these tags will not receive the artifact version.")
                .wire_name("excluded_tags"),
        )
        .attr("tag_shards", tag_shards())
        .attr(
            "version",
            Attribute::required(AttrType::Int)
                .describe("Version of the artifact version. Must be unique for the artifact.")
                .validate(Validator::IntAtLeast(1)),
        )
}

// =============================================================================
// Polymorphic Backends
// =============================================================================

/// One arm of a discriminated backend union
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendVariant {
    /// Discriminator value (uppercase)
    pub name: &'static str,
    /// Attribute carrying the variant body; `None` for body-less variants
    pub attribute: Option<&'static str>,
}

/// Discriminator attribute plus one optional object attribute per variant
#[derive(Debug, Clone, PartialEq)]
pub struct BackendUnion {
    pub discriminator: &'static str,
    pub variants: Vec<BackendVariant>,
}

impl BackendUnion {
    pub fn new(discriminator: &'static str, variants: Vec<BackendVariant>) -> Self {
        Self {
            discriminator,
            variants,
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.variants.iter().map(|v| v.name).collect()
    }

    fn attributes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.variants.iter().filter_map(|v| v.attribute)
    }

    /// Enforce exactly-one-backend on an object value.
    ///
    /// The body named by the discriminator must be set and every other body
    /// must be null. A null discriminator (provisioned objects) requires all
    /// bodies to be null. Unknown values defer the check.
    pub fn check(&self, value: &Value, path: &AttributePath) -> Result<Option<BackendVariant>> {
        let at = |name: &str| {
            if path.is_root() {
                AttributePath::attr(name)
            } else {
                path.at(name)
            }
        };
        let discriminator = value.get(self.discriminator);
        if discriminator.is_unknown() {
            return Ok(None);
        }

        let selected = match discriminator {
            Value::Null => None,
            Value::String(name) => Some(
                self.variants
                    .iter()
                    .copied()
                    .find(|v| v.name == name)
                    .ok_or_else(|| {
                        Error::invalid_value(
                            at(self.discriminator),
                            format!("unknown backend {:?}, expected one of: {}", name, self.names().join(", ")),
                        )
                    })?,
            ),
            other => {
                return Err(Error::invalid_value(
                    at(self.discriminator),
                    format!("expected string, got {}", other.type_name()),
                ))
            }
        };

        let selected_attribute = selected.and_then(|v| v.attribute);
        for attribute in self.attributes() {
            let body = value.get(attribute);
            if Some(attribute) == selected_attribute {
                if body.is_null() {
                    return Err(Error::invalid_configuration(
                        format!(
                            "{} is required when {} is {}",
                            attribute,
                            self.discriminator,
                            selected.map(|v| v.name).unwrap_or_default()
                        ),
                        vec![at(attribute), at(self.discriminator)],
                    ));
                }
            } else if body.is_known() {
                let reason = match selected {
                    Some(v) => format!("{} must be null when {} is {}", attribute, self.discriminator, v.name),
                    None => format!("{} must be null when {} is null", attribute, self.discriminator),
                };
                return Err(Error::invalid_configuration(reason, vec![at(attribute), at(self.discriminator)]));
            }
        }

        Ok(selected)
    }

    /// Discriminator attribute declaration; its values are checked by
    /// [`BackendUnion::check`]
    pub fn discriminator_attribute(&self, description: &'static str) -> Attribute {
        Attribute::required(AttrType::String).describe(description)
    }
}

// =============================================================================
// Certificate Issuer Backends
// =============================================================================

/// Backends of the SCEP and ACME certificate issuers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertIssuerBackend {
    Digicert,
    Ident,
    MicrosoftCa,
    OktaCa,
    StaticChallenge,
}

impl CertIssuerBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            CertIssuerBackend::Digicert => "DIGICERT",
            CertIssuerBackend::Ident => "IDENT",
            CertIssuerBackend::MicrosoftCa => "MICROSOFT_CA",
            CertIssuerBackend::OktaCa => "OKTA_CA",
            CertIssuerBackend::StaticChallenge => "STATIC_CHALLENGE",
        }
    }

    pub fn attribute(self) -> &'static str {
        match self {
            CertIssuerBackend::Digicert => "digicert",
            CertIssuerBackend::Ident => "ident",
            CertIssuerBackend::MicrosoftCa => "microsoft_ca",
            CertIssuerBackend::OktaCa => "okta_ca",
            CertIssuerBackend::StaticChallenge => "static_challenge",
        }
    }

    pub fn variant(self) -> BackendVariant {
        BackendVariant {
            name: self.as_str(),
            attribute: Some(self.attribute()),
        }
    }

    fn body(self) -> Attribute {
        let block = match self {
            CertIssuerBackend::Digicert => Block::new()
                .attr(
                    "api_base_url",
                    Attribute::optional(AttrType::String)
                        .describe("DigiCert API base URL.")
                        .default("https://one.digicert.com/"),
                )
                .attr(
                    "api_token",
                    Attribute::required(AttrType::String)
                        .describe("DigiCert API token.")
                        .sensitive(),
                )
                .attr("profile_guid", Attribute::required(AttrType::String).describe("Profile GUID."))
                .attr(
                    "business_unit_guid",
                    Attribute::required(AttrType::String).describe("Business unit GUID."),
                )
                .attr(
                    "seat_type",
                    Attribute::optional(AttrType::String)
                        .describe("Seat type.")
                        .default("DEVICE_SEAT")
                        .validate(Validator::OneOf(&["DEVICE_SEAT", "USER_SEAT"])),
                )
                .attr(
                    "seat_id_mapping",
                    Attribute::optional(AttrType::String)
                        .describe("Certificate attribute used as seat ID.")
                        .default("common_name"),
                )
                .attr(
                    "default_seat_email",
                    Attribute::optional(AttrType::String).describe("Default seat email address."),
                ),
            CertIssuerBackend::Ident => Block::new()
                .attr("url", Attribute::required(AttrType::String).describe("IDent URL."))
                .attr(
                    "bearer_token",
                    Attribute::required(AttrType::String)
                        .describe("IDent bearer token.")
                        .sensitive(),
                )
                .attr(
                    "request_timeout",
                    Attribute::optional(AttrType::Int)
                        .describe("IDent request timeout in seconds.")
                        .default(30)
                        .validate(Validator::IntBetween(1, 120)),
                )
                .attr(
                    "max_retries",
                    Attribute::optional(AttrType::Int)
                        .describe("IDent request max retries.")
                        .default(3)
                        .validate(Validator::IntBetween(1, 5)),
                ),
            CertIssuerBackend::MicrosoftCa | CertIssuerBackend::OktaCa => Block::new()
                .attr("url", Attribute::required(AttrType::String).describe("Challenge URL."))
                .attr("username", Attribute::required(AttrType::String).describe("Username."))
                .attr(
                    "password",
                    Attribute::required(AttrType::String).describe("Password.").sensitive(),
                ),
            CertIssuerBackend::StaticChallenge => Block::new().attr(
                "challenge",
                Attribute::required(AttrType::String)
                    .describe("Static challenge.")
                    .sensitive(),
            ),
        };
        let description = match self {
            CertIssuerBackend::Digicert => "DigiCert backend parameters.",
            CertIssuerBackend::Ident => "IDent backend parameters.",
            CertIssuerBackend::MicrosoftCa => "Microsoft CA backend parameters.",
            CertIssuerBackend::OktaCa => "Okta CA backend parameters.",
            CertIssuerBackend::StaticChallenge => "Static challenge backend parameters.",
        };
        Attribute::optional(block.into_type()).describe(description)
    }
}

pub const ACME_ISSUER_BACKENDS: &[CertIssuerBackend] = &[
    CertIssuerBackend::Ident,
    CertIssuerBackend::MicrosoftCa,
    CertIssuerBackend::OktaCa,
    CertIssuerBackend::StaticChallenge,
];

pub const SCEP_ISSUER_BACKENDS: &[CertIssuerBackend] = &[
    CertIssuerBackend::Digicert,
    CertIssuerBackend::Ident,
    CertIssuerBackend::MicrosoftCa,
    CertIssuerBackend::OktaCa,
    CertIssuerBackend::StaticChallenge,
];

/// Backend union over a subset of the certificate issuer backends
pub fn cert_issuer_union(backends: &[CertIssuerBackend]) -> BackendUnion {
    BackendUnion::new("backend", backends.iter().map(|b| b.variant()).collect())
}

/// Discriminator plus backend body attributes
pub fn cert_issuer_backend_block(backends: &[CertIssuerBackend]) -> Block {
    let union = cert_issuer_union(backends);
    let mut block = Block::new().attr("backend", union.discriminator_attribute("Certificate issuer backend."));
    for backend in backends {
        block = block.attr(backend.attribute(), backend.body());
    }
    block
}

// =============================================================================
// Repository Backends
// =============================================================================

/// Backends of the Monolith repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryBackend {
    S3,
    Azure,
    Virtual,
}

impl RepositoryBackend {
    pub const ALL: &'static [RepositoryBackend] =
        &[RepositoryBackend::Azure, RepositoryBackend::S3, RepositoryBackend::Virtual];

    pub fn as_str(self) -> &'static str {
        match self {
            RepositoryBackend::S3 => "S3",
            RepositoryBackend::Azure => "AZURE",
            RepositoryBackend::Virtual => "VIRTUAL",
        }
    }

    pub fn variant(self) -> BackendVariant {
        BackendVariant {
            name: self.as_str(),
            attribute: match self {
                RepositoryBackend::S3 => Some("s3"),
                RepositoryBackend::Azure => Some("azure"),
                RepositoryBackend::Virtual => None,
            },
        }
    }
}

pub fn repository_union() -> BackendUnion {
    BackendUnion::new(
        "backend",
        RepositoryBackend::ALL.iter().map(|b| b.variant()).collect(),
    )
}

pub fn repository_backend_block() -> Block {
    let s3 = Block::new()
        .attr("bucket", Attribute::required(AttrType::String).describe("Name of the S3 bucket."))
        .attr("region_name", Attribute::optional(AttrType::String).describe("Name of the S3 bucket region.").default(""))
        .attr("prefix", Attribute::optional(AttrType::String).describe("Prefix of the Munki repository in the bucket.").default(""))
        .attr("access_key_id", Attribute::optional(AttrType::String).describe("AWS access key ID.").default(""))
        .attr(
            "secret_access_key",
            Attribute::optional(AttrType::String)
                .describe("AWS secret access key.")
                .sensitive()
                .default(""),
        )
        .attr("assume_role_arn", Attribute::optional(AttrType::String).describe("ARN of the IAM role to assume.").default(""))
        .attr(
            "signature_version",
            Attribute::optional(AttrType::String).describe("S3 signature version.").default(""),
        )
        .attr("endpoint_url", Attribute::optional(AttrType::String).describe("S3 endpoint URL.").default(""))
        .attr(
            "cloudfront_domain",
            Attribute::optional(AttrType::String).describe("CloudFront domain.").default(""),
        )
        .attr(
            "cloudfront_key_id",
            Attribute::optional(AttrType::String).describe("CloudFront key ID.").default(""),
        )
        .attr(
            "cloudfront_privkey_pem",
            Attribute::optional(AttrType::String)
                .describe("CloudFront private key in PEM form.")
                .sensitive()
                .default(""),
        );
    let azure = Block::new()
        .attr("storage_account", Attribute::required(AttrType::String).describe("Azure storage account."))
        .attr("container", Attribute::required(AttrType::String).describe("Azure blob container."))
        .attr("prefix", Attribute::optional(AttrType::String).describe("Prefix of the Munki repository in the container.").default(""))
        .attr("client_id", Attribute::optional(AttrType::String).describe("Azure client ID.").default(""))
        .attr("tenant_id", Attribute::optional(AttrType::String).describe("Azure tenant ID.").default(""))
        .attr(
            "client_secret",
            Attribute::optional(AttrType::String)
                .describe("Azure client secret.")
                .sensitive()
                .default(""),
        );

    let union = repository_union();
    Block::new()
        .attr("backend", union.discriminator_attribute("Repository backend."))
        .attr("azure", Attribute::optional(azure.into_type()).describe("Azure backend parameters."))
        .attr("s3", Attribute::optional(s3.into_type()).describe("S3 backend parameters."))
}

// =============================================================================
// Probe Filters
// =============================================================================

pub const INVENTORY_PLATFORMS: &[&str] = &["ANDROID", "IOS", "IPADOS", "LINUX", "MACOS", "TVOS", "WINDOWS"];
pub const INVENTORY_TYPES: &[&str] = &["DESKTOP", "EC2", "LAPTOP", "MOBILE", "SERVER", "TABLET", "TV", "VM"];

/// Inventory, metadata and payload filter families of a probe.
///
/// The payload filters are an OR of ANDs: every inner set is a conjunction
/// of predicate rows, the outer list is the disjunction.
pub fn probe_filters() -> Block {
    let inventory_filter = Block::new()
        .attr(
            "meta_business_unit_ids",
            Attribute::optional(AttrType::int_set())
                .describe("The IDs of the meta business units.")
                .wire_name("meta_business_units")
                .nullable_empty(),
        )
        .attr(
            "tag_ids",
            Attribute::optional(AttrType::int_set())
                .describe("The IDs of the tags.")
                .wire_name("tags")
                .nullable_empty(),
        )
        .attr(
            "platforms",
            Attribute::optional(AttrType::string_set())
                .describe("The platforms.")
                .nullable_empty()
                .validate(Validator::elements(Validator::OneOf(INVENTORY_PLATFORMS))),
        )
        .attr(
            "types",
            Attribute::optional(AttrType::string_set())
                .describe("The machine types.")
                .nullable_empty()
                .validate(Validator::elements(Validator::OneOf(INVENTORY_TYPES))),
        );
    let metadata_filter = Block::new()
        .attr(
            "event_types",
            Attribute::optional(AttrType::string_set())
                .describe("The event types.")
                .nullable_empty(),
        )
        .attr(
            "event_tags",
            Attribute::optional(AttrType::string_set())
                .describe("The event tags.")
                .nullable_empty(),
        )
        .attr(
            "event_routing_keys",
            Attribute::optional(AttrType::string_set())
                .describe("The event routing keys.")
                .nullable_empty(),
        );
    let payload_predicate = Block::new()
        .attr("attribute", Attribute::required(AttrType::String).describe("Payload attribute."))
        .attr(
            "operator",
            Attribute::required(AttrType::String)
                .describe("Comparison operator.")
                .validate(Validator::OneOf(&["IN", "NOT_IN"])),
        )
        .attr(
            "values",
            Attribute::required(AttrType::string_set())
                .describe("Values to compare the payload attribute with.")
                .validate(Validator::LengthAtLeast(1)),
        );

    Block::new()
        .attr(
            "inventory_filters",
            Attribute::optional(AttrType::set_of(inventory_filter.into_type()))
                .describe("Inventory filters. Machines matching any of the filters are selected.")
                .default(Value::empty_set()),
        )
        .attr(
            "metadata_filters",
            Attribute::optional(AttrType::set_of(metadata_filter.into_type()))
                .describe("Metadata filters. Events matching any of the filters are selected.")
                .default(Value::empty_set()),
        )
        .attr(
            "payload_filters",
            Attribute::optional(AttrType::list_of(AttrType::set_of(payload_predicate.into_type())))
                .describe("Payload filters. An event is selected if all the predicates of any of the filters match.")
                .default(Value::List(Vec::new()))
                .validate(Validator::elements(Validator::LengthAtLeast(1))),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::composite::{decode_block, encode_block};
    use assert_matches::assert_matches;
    use serde_json::{json, Value as Json};

    fn issuer(backend: Value, ident: Value, microsoft_ca: Value) -> Value {
        Value::object([
            ("backend", backend),
            ("ident", ident),
            ("microsoft_ca", microsoft_ca),
            ("okta_ca", Value::Null),
            ("static_challenge", Value::Null),
        ])
    }

    fn ident() -> Value {
        Value::object([
            ("url", Value::from("https://ident.example.com")),
            ("bearer_token", Value::from("tok")),
            ("request_timeout", Value::Int(30)),
            ("max_retries", Value::Int(3)),
        ])
    }

    #[test]
    fn test_exactly_one_backend() {
        let union = cert_issuer_union(ACME_ISSUER_BACKENDS);
        let root = AttributePath::root();

        let ok = issuer(Value::from("IDENT"), ident(), Value::Null);
        assert_eq!(union.check(&ok, &root).unwrap(), Some(CertIssuerBackend::Ident.variant()));

        let missing = issuer(Value::from("MICROSOFT_CA"), Value::Null, Value::Null);
        assert_matches!(union.check(&missing, &root), Err(Error::InvalidConfiguration { .. }));

        let two = issuer(Value::from("IDENT"), ident(), Value::object([("url", Value::from("u"))]));
        let err = union.check(&two, &root).unwrap_err();
        assert_eq!(err.to_string(), "microsoft_ca must be null when backend is IDENT");

        let provisioned = issuer(Value::Null, Value::Null, Value::Null);
        assert_eq!(union.check(&provisioned, &root).unwrap(), None);

        let pending = issuer(Value::Unknown, ident(), ident());
        assert_eq!(union.check(&pending, &root).unwrap(), None);

        let digicert = issuer(Value::from("DIGICERT"), Value::Null, Value::Null);
        assert_matches!(union.check(&digicert, &root), Err(Error::InvalidAttributeValue { .. }));
    }

    #[test]
    fn test_virtual_repository_has_no_body() {
        let union = repository_union();
        let value = Value::object([
            ("backend", Value::from("VIRTUAL")),
            ("azure", Value::Null),
            ("s3", Value::Null),
        ]);
        let selected = union.check(&value, &AttributePath::root()).unwrap().unwrap();
        assert_eq!(selected.attribute, None);

        let value = Value::object([
            ("backend", Value::from("VIRTUAL")),
            ("azure", Value::Null),
            ("s3", Value::object([("bucket", Value::from("b"))])),
        ]);
        assert!(union.check(&value, &AttributePath::root()).is_err());
    }

    #[test]
    fn test_event_filter_set_empty_inner_sets_decode_as_null() {
        let attr = event_filter_set("Event filters.");
        let block = Block::new().attr("event_filters", attr);
        let wire = json!({
            "event_filters": {
                "included_event_filters": [{"tags": [], "event_type": ["zentral_login"], "routing_key": []}],
                "excluded_event_filters": [],
            }
        });
        let decoded = decode_block(&block, &wire, &Value::Null, &AttributePath::root()).unwrap();
        let filters = decoded.get("event_filters");
        assert!(filters.get("excluded_event_filters").is_null());

        let included = filters.get("included_event_filters").elements();
        assert_eq!(included.len(), 1);
        assert!(included[0].get("tags").is_null());
        assert!(included[0].get("routing_key").is_null());
        assert_eq!(included[0].get("event_type"), &Value::string_set(["zentral_login"]));
    }

    #[test]
    fn test_payload_filters_keep_or_of_ands() {
        let block = probe_filters();
        let predicate = |attribute: &str, values: &[&str]| {
            Value::object([
                ("attribute", Value::from(attribute)),
                ("operator", Value::from("IN")),
                ("values", Value::string_set(values.iter().copied())),
            ])
        };
        let conjunction_a: Value = Value::Set(
            [predicate("user", &["root"]), predicate("action", &["sudo"])]
                .into_iter()
                .collect(),
        );
        let conjunction_b: Value = Value::Set([predicate("user", &["admin"])].into_iter().collect());
        let value = Value::object([
            ("inventory_filters", Value::empty_set()),
            ("metadata_filters", Value::empty_set()),
            ("payload_filters", Value::List(vec![conjunction_a, conjunction_b])),
        ]);

        let wire = Json::Object(encode_block(&block, &value, &AttributePath::root()).unwrap());
        let payload = wire["payload_filters"].as_array().unwrap();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0].as_array().unwrap().len(), 2);
        assert_eq!(payload[1].as_array().unwrap().len(), 1);

        let decoded = decode_block(&block, &wire, &value, &AttributePath::root()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_artifact_version_base_wire_names() {
        let block = artifact_version_base();
        assert_eq!(block.get("artifact_id").unwrap().wire_field("artifact_id"), "artifact");
        assert_eq!(block.get("excluded_tag_ids").unwrap().wire_field("excluded_tag_ids"), "excluded_tags");
        assert!(block.get("macos_max_version").is_some());
        assert!(block.get("tvos").is_some());
    }
}
