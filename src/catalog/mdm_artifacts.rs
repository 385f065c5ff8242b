//! MDM artifacts, artifact versions and blueprints
//!
//! Every artifact version variant shares the base shape from
//! [`records::artifact_version_base`] and adds its own payload fields.

use super::{EntityDef, Lookup};
use crate::client::KeyKind;
use crate::schema::{self, AttrType, Attribute, Block, Validator};
use crate::translate::records;
use crate::translate::DeclarationCodec;

pub const ARTIFACT_TYPES: &[&str] = &[
    "Activation",
    "Asset",
    "Cert Asset",
    "Configuration",
    "Data Asset",
    "Enterprise App",
    "Manual Configuration",
    "Profile",
    "Provisioning Profile",
    "Store App",
];

pub const APPLE_PLATFORMS: &[&str] = &["iOS", "iPadOS", "macOS", "tvOS"];

const COLLECTION_OPTIONS: &[&str] = &["NO", "MANAGED_ONLY", "ALL"];

pub fn entities() -> Vec<EntityDef> {
    vec![
        artifact(),
        profile(),
        declaration(),
        enterprise_app(),
        store_app(),
        provisioning_profile(),
        data_asset(),
        cert_asset(),
        blueprint(),
        blueprint_artifact(),
    ]
}

fn artifact() -> EntityDef {
    EntityDef::resource("mdm_artifact", "MDM artifact", "/mdm/artifacts/", KeyKind::Uuid)
        .describe("Manages MDM artifacts.")
        .block(
            Block::new()
                .attr("id", schema::uuid_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the artifact."))
                .attr(
                    "type",
                    Attribute::required(AttrType::String)
                        .describe("Type of the artifact.")
                        .validate(Validator::OneOf(ARTIFACT_TYPES))
                        .requires_replace(),
                )
                .attr(
                    "channel",
                    Attribute::required(AttrType::String)
                        .describe("Channel of the artifact.")
                        .validate(Validator::OneOf(&["Device", "User"]))
                        .requires_replace(),
                )
                .attr(
                    "platforms",
                    Attribute::required(AttrType::string_set())
                        .describe("Platforms of the artifact.")
                        .validate(Validator::LengthAtLeast(1))
                        .validate(Validator::elements(Validator::OneOf(APPLE_PLATFORMS))),
                )
                .attr(
                    "install_during_setup_assistant",
                    Attribute::optional(AttrType::Bool)
                        .describe("Install the artifact during the setup assistant.")
                        .default(false),
                )
                .attr(
                    "auto_update",
                    Attribute::optional(AttrType::Bool)
                        .describe("Automatically install new versions of the artifact.")
                        .default(true),
                )
                .attr(
                    "reinstall_interval",
                    Attribute::optional(AttrType::Int)
                        .describe("Number of days after which the artifact is reinstalled. 0 disables it.")
                        .default(0)
                        .validate(Validator::IntBetween(0, 366)),
                )
                .attr(
                    "reinstall_on_os_update",
                    Attribute::optional(AttrType::String)
                        .describe("Reinstall the artifact after an OS update.")
                        .default("No")
                        .validate(Validator::OneOf(&["No", "Major", "Minor", "Patch"])),
                )
                .attr(
                    "requires",
                    schema::string_set("IDs of the artifacts required by this artifact."),
                ),
        )
}

fn artifact_version(
    name: &'static str,
    kind: &'static str,
    path: &'static str,
    description: &'static str,
    payload: Block,
) -> EntityDef {
    EntityDef::resource(name, kind, path, KeyKind::Uuid)
        .describe(description)
        .block(records::artifact_version_base().merge(payload))
}

fn profile() -> EntityDef {
    artifact_version(
        "mdm_profile",
        "MDM profile",
        "/mdm/profiles/",
        "Manages MDM configuration profile artifact versions.",
        Block::new().attr(
            "source",
            Attribute::required(AttrType::String)
                .describe("Base64 encoded source of the configuration profile.")
                .validate(Validator::LengthAtLeast(1)),
        ),
    )
}

fn declaration() -> EntityDef {
    artifact_version(
        "mdm_declaration",
        "MDM declaration",
        "/mdm/declarations/",
        "Manages MDM declaration artifact versions.",
        Block::new().attr(
            "source",
            Attribute::required(AttrType::String)
                .describe("JSON source of the declaration.")
                .validate(Validator::Json),
        ),
    )
    .codec(DeclarationCodec)
}

fn enterprise_app() -> EntityDef {
    artifact_version(
        "mdm_enterprise_app",
        "MDM enterprise app",
        "/mdm/enterprise_apps/",
        "Manages MDM enterprise app artifact versions.",
        Block::new()
            .attr(
                "package_uri",
                Attribute::required(AttrType::String).describe("URI of the package. s3:// and https:// URIs are supported."),
            )
            .attr(
                "package_sha256",
                Attribute::required(AttrType::String)
                    .describe("SHA256 of the package.")
                    .validate(Validator::LengthAtLeast(64)),
            )
            .attr(
                "ios_app",
                Attribute::optional(AttrType::Bool)
                    .describe("Install the iOS app on Apple Silicon Macs.")
                    .default(false),
            )
            .attr(
                "configuration",
                Attribute::optional(AttrType::String).describe("Managed app configuration, as a plist."),
            )
            .attr(
                "remove_on_unenroll",
                Attribute::optional(AttrType::Bool)
                    .describe("Remove the app when the device is unenrolled.")
                    .default(true),
            ),
    )
}

fn store_app() -> EntityDef {
    artifact_version(
        "mdm_store_app",
        "MDM store app",
        "/mdm/store_apps/",
        "Manages MDM store app artifact versions.",
        Block::new()
            .attr(
                "location_asset_id",
                Attribute::required(AttrType::Int)
                    .describe("ID of the location asset.")
                    .wire_name("location_asset"),
            )
            .attr("associated_domains", schema::string_set("Associated domains."))
            .attr(
                "associated_domains_enable_direct_downloads",
                Attribute::optional(AttrType::Bool)
                    .describe("Enable direct downloads for the associated domains.")
                    .default(false),
            )
            .attr(
                "configuration",
                Attribute::optional(AttrType::String).describe("Managed app configuration, as a plist."),
            )
            .attr(
                "content_filter_uuid",
                Attribute::optional(AttrType::String).describe("UUID of the content filter payload."),
            )
            .attr(
                "dns_proxy_uuid",
                Attribute::optional(AttrType::String).describe("UUID of the DNS proxy payload."),
            )
            .attr("vpn_uuid", Attribute::optional(AttrType::String).describe("UUID of the VPN payload."))
            .attr(
                "prevent_backup",
                Attribute::optional(AttrType::Bool)
                    .describe("Prevent the backup of the app data.")
                    .default(false),
            )
            .attr(
                "removable",
                Attribute::optional(AttrType::Bool)
                    .describe("Allow the user to remove the app.")
                    .default(false),
            )
            .attr(
                "remove_on_unenroll",
                Attribute::optional(AttrType::Bool)
                    .describe("Remove the app when the device is unenrolled.")
                    .default(true),
            ),
    )
}

fn provisioning_profile() -> EntityDef {
    artifact_version(
        "mdm_provisioning_profile",
        "MDM provisioning profile",
        "/mdm/provisioning_profiles/",
        "Manages MDM provisioning profile artifact versions.",
        Block::new().attr(
            "source",
            Attribute::required(AttrType::String)
                .describe("Base64 encoded source of the provisioning profile.")
                .validate(Validator::LengthAtLeast(1)),
        ),
    )
}

fn data_asset() -> EntityDef {
    artifact_version(
        "mdm_data_asset",
        "MDM data asset",
        "/mdm/data_assets/",
        "Manages MDM data asset artifact versions.",
        Block::new()
            .attr(
                "type",
                Attribute::required(AttrType::String)
                    .describe("Type of the data asset.")
                    .validate(Validator::OneOf(&["JSON", "PLIST", "ZIP"])),
            )
            .attr(
                "file_uri",
                Attribute::required(AttrType::String).describe("URI of the data asset file."),
            )
            .attr(
                "file_sha256",
                Attribute::required(AttrType::String)
                    .describe("SHA256 of the data asset file.")
                    .validate(Validator::LengthAtLeast(64)),
            ),
    )
}

fn cert_asset() -> EntityDef {
    let subject = Block::new()
        .attr(
            "type",
            Attribute::required(AttrType::String)
                .describe("Type of the RDN.")
                .validate(Validator::OneOf(&["C", "CN", "DC", "L", "O", "OU", "ST", "UID"])),
        )
        .attr("value", Attribute::required(AttrType::String).describe("Value of the RDN."));
    let subject_alt_name = Block::new()
        .attr("rfc822_name", Attribute::optional(AttrType::String).describe("RFC 822 name."))
        .attr(
            "uniform_resource_identifier",
            Attribute::optional(AttrType::String).describe("Uniform resource identifier."),
        )
        .attr("dns_name", Attribute::optional(AttrType::String).describe("DNS name."))
        .attr(
            "user_principal_name",
            Attribute::optional(AttrType::String).describe("User principal name."),
        );

    artifact_version(
        "mdm_cert_asset",
        "MDM certificate asset",
        "/mdm/cert_assets/",
        "Manages MDM certificate asset artifact versions.",
        Block::new()
            .attr(
                "acme_issuer_id",
                Attribute::optional(AttrType::String)
                    .describe("ID of the ACME issuer.")
                    .wire_name("acme_issuer")
                    .validate(Validator::ConflictsWith(&["scep_issuer_id"])),
            )
            .attr(
                "scep_issuer_id",
                Attribute::optional(AttrType::String)
                    .describe("ID of the SCEP issuer.")
                    .wire_name("scep_issuer"),
            )
            .attr(
                "subject",
                Attribute::required(AttrType::list_of(subject.into_type()))
                    .describe("Subject of the certificate, as a list of RDNs.")
                    .validate(Validator::LengthAtLeast(1)),
            )
            .attr(
                "subject_alt_name",
                Attribute::optional(subject_alt_name.into_type()).describe("Subject alternative name."),
            )
            .attr(
                "accessible",
                Attribute::optional(AttrType::String)
                    .describe("Keychain accessibility of the certificate.")
                    .default("Default")
                    .validate(Validator::OneOf(&["Default", "AfterFirstUnlock", "AfterFirstUnlockThisDeviceOnly"])),
            ),
    )
}

fn blueprint() -> EntityDef {
    EntityDef::resource("mdm_blueprint", "MDM blueprint", "/mdm/blueprints/", KeyKind::Int)
        .describe("Manages MDM blueprints.")
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the blueprint."))
                .attr(
                    "inventory_interval",
                    Attribute::optional(AttrType::Int)
                        .describe("In seconds, the minimum interval between two inventory collections.")
                        .default(86400)
                        .validate(Validator::IntBetween(14400, 604800)),
                )
                .attr(
                    "collect_apps",
                    Attribute::optional(AttrType::String)
                        .describe("Possible values: NO, MANAGED_ONLY, ALL.")
                        .default("NO")
                        .validate(Validator::OneOf(COLLECTION_OPTIONS)),
                )
                .attr(
                    "collect_certificates",
                    Attribute::optional(AttrType::String)
                        .describe("Possible values: NO, MANAGED_ONLY, ALL.")
                        .default("NO")
                        .validate(Validator::OneOf(COLLECTION_OPTIONS)),
                )
                .attr(
                    "collect_profiles",
                    Attribute::optional(AttrType::String)
                        .describe("Possible values: NO, MANAGED_ONLY, ALL.")
                        .default("NO")
                        .validate(Validator::OneOf(COLLECTION_OPTIONS)),
                )
                .attr(
                    "legacy_profiles_via_ddm",
                    Attribute::optional(AttrType::Bool)
                        .describe("Deliver the legacy profiles via declarative device management.")
                        .default(true),
                )
                .attr(
                    "filevault_config_id",
                    Attribute::optional(AttrType::Int)
                        .describe("ID of the FileVault configuration.")
                        .wire_name("filevault_config"),
                )
                .attr(
                    "recovery_password_config_id",
                    Attribute::optional(AttrType::Int)
                        .describe("ID of the recovery password configuration.")
                        .wire_name("recovery_password_config"),
                )
                .attr(
                    "software_update_enforcement_ids",
                    schema::tag_ids("IDs of the software update enforcements.")
                        .wire_name("software_update_enforcements"),
                ),
        )
        .data_source(Lookup::id_or_name())
}

fn blueprint_artifact() -> EntityDef {
    EntityDef::resource(
        "mdm_blueprint_artifact",
        "MDM blueprint artifact",
        "/mdm/blueprint_artifacts/",
        KeyKind::Int,
    )
    .describe("Manages MDM blueprint artifacts.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr(
                "blueprint_id",
                Attribute::required(AttrType::Int)
                    .describe("ID of the blueprint.")
                    .wire_name("blueprint")
                    .requires_replace(),
            )
            .attr(
                "artifact_id",
                Attribute::required(AttrType::String)
                    .describe("ID of the artifact.")
                    .wire_name("artifact")
                    .requires_replace(),
            )
            .merge(records::platform_flags())
            .merge(records::sharding())
            .attr(
                "excluded_tag_ids",
                schema::tag_ids("Machines tagged with one of these tags will not be included.")
                    .wire_name("excluded_tags"),
            )
            .attr("tag_shards", records::tag_shards()),
    )
}
