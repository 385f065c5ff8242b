//! MDM settings: FileVault and recovery password configurations, SCEP
//! configurations, certificate issuers, software update enforcements and
//! push certificates

use super::mdm_artifacts::APPLE_PLATFORMS;
use super::{EntityDef, Lookup};
use crate::client::KeyKind;
use crate::schema::{self, AttrType, Attribute, Block, Validator};
use crate::translate::records::{
    self, cert_issuer_backend_block, cert_issuer_union, BackendUnion, BackendVariant, ACME_ISSUER_BACKENDS,
    SCEP_ISSUER_BACKENDS,
};
use crate::translate::{BackendCodec, SoftwareUpdateEnforcementCodec};

pub fn entities() -> Vec<EntityDef> {
    vec![
        filevault_config(),
        recovery_password_config(),
        scep_config(),
        scep_issuer(),
        acme_issuer(),
        software_update_enforcement(),
        push_certificate(),
    ]
}

fn filevault_config() -> EntityDef {
    EntityDef::resource(
        "mdm_filevault_config",
        "MDM FileVault configuration",
        "/mdm/filevault_configs/",
        KeyKind::Int,
    )
    .describe("Manages MDM FileVault configurations.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the configuration."))
            .attr(
                "escrow_location_display_name",
                Attribute::required(AttrType::String)
                    .describe("Name of the organization displayed as the recovery key escrow location."),
            )
            .attr(
                "at_login_only",
                Attribute::optional(AttrType::Bool)
                    .describe("Only prompt the user to enable FileVault at login.")
                    .default(false),
            )
            .attr(
                "bypass_attempts",
                Attribute::optional(AttrType::Int)
                    .describe("Number of times the user can bypass enabling FileVault. -1 disables the bypass.")
                    .default(-1)
                    .validate(Validator::IntBetween(-1, 9999)),
            )
            .attr(
                "show_recovery_key",
                Attribute::optional(AttrType::Bool)
                    .describe("Show the personal recovery key to the user.")
                    .default(false),
            )
            .attr(
                "destroy_key_on_standby",
                Attribute::optional(AttrType::Bool)
                    .describe("Destroy the FileVault key when the Mac goes into standby.")
                    .default(false),
            )
            .attr(
                "prk_rotation_interval_days",
                Attribute::optional(AttrType::Int)
                    .describe("Number of days after which the personal recovery key is rotated. 0 disables it.")
                    .default(0)
                    .validate(Validator::IntBetween(0, 365)),
            ),
    )
    .data_source(Lookup::id_or_name())
}

fn recovery_password_config() -> EntityDef {
    EntityDef::resource(
        "mdm_recovery_password_config",
        "MDM recovery password configuration",
        "/mdm/recovery_password_configs/",
        KeyKind::Int,
    )
    .describe("Manages MDM recovery password configurations.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the configuration."))
            .attr(
                "dynamic_password",
                Attribute::optional(AttrType::Bool)
                    .describe("Generate a unique password per device.")
                    .default(true),
            )
            .attr(
                "static_password",
                Attribute::optional(AttrType::String)
                    .describe("Password used for every device when dynamic_password is false.")
                    .sensitive()
                    .validate(Validator::LengthAtLeast(8)),
            )
            .attr(
                "rotation_interval_days",
                Attribute::optional(AttrType::Int)
                    .describe("Number of days after which the password is rotated. 0 disables it.")
                    .default(0)
                    .validate(Validator::IntBetween(0, 365)),
            )
            .attr(
                "rotate_firmware_password",
                Attribute::optional(AttrType::Bool)
                    .describe("Rotate the firmware password too.")
                    .default(false),
            ),
    )
    .data_source(Lookup::id_or_name())
}

fn scep_config_union() -> BackendUnion {
    BackendUnion::new(
        "challenge_type",
        vec![
            BackendVariant {
                name: "STATIC",
                attribute: Some("static_challenge"),
            },
            BackendVariant {
                name: "MICROSOFT_CA",
                attribute: Some("microsoft_ca_challenge"),
            },
            BackendVariant {
                name: "OKTA_CA",
                attribute: Some("okta_ca_challenge"),
            },
        ],
    )
}

fn scep_config() -> EntityDef {
    let union = scep_config_union();
    let ca_challenge = || {
        Block::new()
            .attr("url", Attribute::required(AttrType::String).describe("URL of the challenge endpoint."))
            .attr("username", Attribute::required(AttrType::String).describe("Username."))
            .attr(
                "password",
                Attribute::required(AttrType::String)
                    .describe("Password.")
                    .sensitive(),
            )
            .into_type()
    };
    EntityDef::resource("mdm_scep_config", "MDM SCEP configuration", "/mdm/scep_configs/", KeyKind::Int)
        .describe("Manages MDM SCEP configurations.")
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the configuration."))
                .attr("url", Attribute::required(AttrType::String).describe("URL of the SCEP server."))
                .attr(
                    "key_usage",
                    Attribute::optional(AttrType::Int)
                        .describe("A bitmask: 1 is signing, 4 is encryption, 5 is both.")
                        .default(0)
                        .validate(Validator::IntOneOf(&[0, 1, 4, 5])),
                )
                .attr(
                    "key_is_extractable",
                    Attribute::optional(AttrType::Bool)
                        .describe("The private key can be extracted from the keychain.")
                        .default(false),
                )
                .attr(
                    "keysize",
                    Attribute::optional(AttrType::Int)
                        .describe("Size of the RSA key.")
                        .default(2048)
                        .validate(Validator::IntOneOf(&[1024, 2048, 4096])),
                )
                .attr(
                    "allow_all_apps_access",
                    Attribute::optional(AttrType::Bool)
                        .describe("All the apps can access the private key.")
                        .default(false),
                )
                .attr(
                    "challenge_type",
                    union.discriminator_attribute("Type of the SCEP challenge: STATIC, MICROSOFT_CA or OKTA_CA."),
                )
                .attr(
                    "static_challenge",
                    Attribute::optional(
                        Block::new()
                            .attr(
                                "challenge",
                                Attribute::required(AttrType::String)
                                    .describe("Static challenge.")
                                    .sensitive(),
                            )
                            .into_type(),
                    )
                    .describe("Static challenge parameters.")
                    .wire_name("static_challenge_kwargs"),
                )
                .attr(
                    "microsoft_ca_challenge",
                    Attribute::optional(ca_challenge())
                        .describe("Microsoft CA challenge parameters.")
                        .wire_name("microsoft_ca_challenge_kwargs"),
                )
                .attr(
                    "okta_ca_challenge",
                    Attribute::optional(ca_challenge())
                        .describe("Okta CA challenge parameters.")
                        .wire_name("okta_ca_challenge_kwargs"),
                ),
        )
        .codec(BackendCodec::new(union))
        .data_source(Lookup::id_or_name())
}

fn scep_issuer() -> EntityDef {
    EntityDef::resource("mdm_scep_issuer", "MDM SCEP issuer", "/mdm/scep_issuers/", KeyKind::Uuid)
        .describe("Manages MDM SCEP certificate issuers.")
        .block(
            Block::new()
                .attr("id", schema::uuid_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the issuer."))
                .attr(
                    "description",
                    Attribute::optional(AttrType::String)
                        .describe("Description of the issuer.")
                        .default(""),
                )
                .attr("url", Attribute::required(AttrType::String).describe("URL of the SCEP server."))
                .attr(
                    "key_usage",
                    Attribute::optional(AttrType::Int)
                        .describe("A bitmask: 1 is signing, 4 is encryption, 5 is both.")
                        .default(0)
                        .validate(Validator::IntOneOf(&[0, 1, 4, 5])),
                )
                .attr(
                    "key_size",
                    Attribute::optional(AttrType::Int)
                        .describe("Size of the RSA key.")
                        .default(2048)
                        .validate(Validator::IntOneOf(&[1024, 2048, 4096])),
                )
                .attr(
                    "provisioning_uid",
                    Attribute::computed(AttrType::String)
                        .describe("UID of the provisioned issuer. Null for the issuers managed here.")
                        .read_only(),
                )
                .merge(cert_issuer_backend_block(SCEP_ISSUER_BACKENDS)),
        )
        .codec(BackendCodec::new(cert_issuer_union(SCEP_ISSUER_BACKENDS)))
        .data_source(Lookup::id_or_name())
}

fn acme_issuer() -> EntityDef {
    EntityDef::resource("mdm_acme_issuer", "MDM ACME issuer", "/mdm/acme_issuers/", KeyKind::Uuid)
        .describe("Manages MDM ACME certificate issuers.")
        .block(
            Block::new()
                .attr("id", schema::uuid_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the issuer."))
                .attr(
                    "description",
                    Attribute::optional(AttrType::String)
                        .describe("Description of the issuer.")
                        .default(""),
                )
                .attr(
                    "directory_url",
                    Attribute::required(AttrType::String).describe("URL of the ACME directory."),
                )
                .attr(
                    "key_size",
                    Attribute::optional(AttrType::Int)
                        .describe("Size of the key.")
                        .default(384)
                        .validate(Validator::IntOneOf(&[256, 384, 2048, 4096])),
                )
                .attr(
                    "key_type",
                    Attribute::optional(AttrType::String)
                        .describe("Type of the key: ECSECPrimeRandom or RSA.")
                        .default("ECSECPrimeRandom")
                        .validate(Validator::OneOf(&["ECSECPrimeRandom", "RSA"])),
                )
                .attr(
                    "usage_flags",
                    Attribute::optional(AttrType::Int)
                        .describe("A bitmask: 1 is signing, 4 is encryption, 5 is both.")
                        .default(1)
                        .validate(Validator::IntBetween(1, 5)),
                )
                .attr(
                    "extended_key_usage",
                    schema::string_set("OIDs of the extended key usages."),
                )
                .attr(
                    "hardware_bound",
                    Attribute::optional(AttrType::Bool)
                        .describe("The private key is bound to the device Secure Enclave.")
                        .default(false),
                )
                .attr(
                    "attest",
                    Attribute::optional(AttrType::Bool)
                        .describe("Provide a device attestation.")
                        .default(false),
                )
                .attr(
                    "provisioning_uid",
                    Attribute::computed(AttrType::String)
                        .describe("UID of the provisioned issuer. Null for the issuers managed here.")
                        .read_only(),
                )
                .merge(cert_issuer_backend_block(ACME_ISSUER_BACKENDS)),
        )
        .codec(BackendCodec::new(cert_issuer_union(ACME_ISSUER_BACKENDS)))
        .data_source(Lookup::id_or_name())
}

fn software_update_enforcement() -> EntityDef {
    let version = |description| {
        Attribute::optional(AttrType::String)
            .describe(description)
            .default("")
    };
    EntityDef::resource(
        "mdm_software_update_enforcement",
        "MDM software update enforcement",
        "/mdm/software_update_enforcements/",
        KeyKind::Int,
    )
    .describe("Manages MDM software update enforcements.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the enforcement."))
            .attr("details_url", version("URL of a web page with details about the enforcement."))
            .attr(
                "platforms",
                Attribute::required(AttrType::string_set())
                    .describe("Platforms of the enforcement.")
                    .validate(Validator::LengthAtLeast(1))
                    .validate(Validator::elements(Validator::OneOf(APPLE_PLATFORMS))),
            )
            .attr("tag_ids", schema::tag_ids("IDs of the tags the enforcement is scoped to.").wire_name("tags"))
            .attr("os_version", version("Target OS version of a one time enforcement."))
            .attr("build_version", version("Target build version of a one time enforcement."))
            .attr(
                "local_datetime",
                Attribute::optional(AttrType::String).describe("Local date and time of a one time enforcement."),
            )
            .attr("max_os_version", version("Maximum OS version of a latest enforcement."))
            .attr(
                "delay_days",
                Attribute::optional_computed(AttrType::Int)
                    .describe("Days after the release of an update before it is enforced. Defaults to 14 for a latest enforcement.")
                    .validate(Validator::IntBetween(0, 120)),
            )
            .attr(
                "local_time",
                Attribute::optional_computed(AttrType::String)
                    .describe("Local time of a latest enforcement. Defaults to 09:30:00.")
                    .validate(Validator::TimeOfDay),
            ),
    )
    .codec(SoftwareUpdateEnforcementCodec)
    .data_source(Lookup::id_or_name())
}

fn push_certificate() -> EntityDef {
    EntityDef::read_only(
        "mdm_push_certificate",
        "MDM push certificate",
        "/mdm/push_certificates/",
        KeyKind::Int,
    )
    .describe("Allows details of a MDM push certificate to be retrieved by its ID or its name.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the push certificate."))
            .attr(
                "provisioning_uid",
                Attribute::computed(AttrType::String).describe("UID of the provisioned push certificate."),
            )
            .attr("topic", Attribute::computed(AttrType::String).describe("APNS topic."))
            .attr(
                "not_before",
                Attribute::computed(AttrType::String).describe("Start of the certificate validity."),
            )
            .attr(
                "not_after",
                Attribute::computed(AttrType::String).describe("End of the certificate validity."),
            )
            .attr(
                "certificate",
                Attribute::computed(AttrType::String).describe("Certificate in PEM form."),
            ),
    )
    .data_source(Lookup::id_or_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::Value;
    use crate::error::Diagnostics;

    #[test]
    fn test_scep_config_challenge_is_exclusive() {
        let def = scep_config();
        let mut config = def.block.null_object();
        config.set("challenge_type", Value::from("STATIC"));
        config.set(
            "static_challenge",
            Value::object([("challenge", Value::from("s3cr3t"))]),
        );
        let mut diags = Diagnostics::new();
        def.codec.validate(&config, &mut diags);
        assert!(diags.is_empty(), "{:?}", diags);

        config.set(
            "okta_ca_challenge",
            Value::object([
                ("url", Value::from("https://okta.example.com")),
                ("username", Value::from("u")),
                ("password", Value::from("p")),
            ]),
        );
        let mut diags = Diagnostics::new();
        def.codec.validate(&config, &mut diags);
        assert!(diags.has_errors());

        config.set("okta_ca_challenge", Value::Null);
        config.set("name", Value::from("Default"));
        config.set("url", Value::from("https://scep.example.com"));
        let record = def.codec.encode(&def.block, &config).unwrap();
        assert_eq!(record["static_challenge_kwargs"]["challenge"], "s3cr3t");
        assert!(record["okta_ca_challenge_kwargs"].is_null());
    }

    #[test]
    fn test_digicert_is_scep_only() {
        let scep = scep_issuer();
        let acme = acme_issuer();
        assert!(scep.block.get("digicert").is_some());
        assert!(acme.block.get("digicert").is_none());
        assert!(records::ACME_ISSUER_BACKENDS.len() < records::SCEP_ISSUER_BACKENDS.len());
    }
}
