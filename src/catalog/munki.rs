//! Munki configurations, enrollments and script checks

use super::{EntityDef, Lookup};
use crate::client::KeyKind;
use crate::domain::value::Value;
use crate::schema::{self, AttrType, Attribute, Block, Validator};
use crate::translate::records;

pub const SCRIPT_CHECK_TYPES: &[&str] = &["ZSH_BOOL", "ZSH_INT", "ZSH_STR"];

pub fn entities() -> Vec<EntityDef> {
    vec![configuration(), enrollment(), script_check()]
}

fn configuration() -> EntityDef {
    EntityDef::resource(
        "munki_configuration",
        "Munki configuration",
        "/munki/configurations/",
        KeyKind::Int,
    )
    .describe("Manages Munki configurations.")
    .versioned()
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the configuration."))
            .attr(
                "description",
                Attribute::optional(AttrType::String)
                    .describe("Description of the configuration.")
                    .default(""),
            )
            .attr(
                "inventory_apps_full_information_shard",
                Attribute::optional(AttrType::Int)
                    .describe("Percentage of machines sending the full application information.")
                    .default(100)
                    .validate(Validator::IntBetween(0, 100)),
            )
            .attr(
                "principal_user_detection_sources",
                Attribute::optional(AttrType::string_list())
                    .describe("Ordered list of the principal user detection sources.")
                    .default(Value::List(Vec::new()))
                    .validate(Validator::elements(Validator::OneOf(&["company_portal", "google_chrome", "logged_in_user"]))),
            )
            .attr(
                "principal_user_detection_domains",
                schema::string_set("Domains used to filter the principal user detection results."),
            )
            .attr(
                "collected_condition_keys",
                schema::string_set("Munki conditions collected as machine extra facts."),
            )
            .attr(
                "managed_installs_sync_interval_days",
                Attribute::optional(AttrType::Int)
                    .describe("Interval in days between full managed installs syncs.")
                    .default(7)
                    .validate(Validator::IntBetween(1, 90)),
            )
            .attr(
                "script_checks_run_interval_seconds",
                Attribute::optional(AttrType::Int)
                    .describe("Interval in seconds between script check runs.")
                    .default(86400)
                    .validate(Validator::IntBetween(3600, 604800)),
            )
            .attr(
                "auto_reinstall_incidents",
                Attribute::optional(AttrType::Bool)
                    .describe("Open incidents for packages reinstalled automatically.")
                    .default(false),
            )
            .attr(
                "auto_failed_install_incidents",
                Attribute::optional(AttrType::Bool)
                    .describe("Open incidents for failed package installs.")
                    .default(false),
            )
            .attr("version", schema::version()),
    )
    .data_source(Lookup::id_or_name())
}

fn enrollment() -> EntityDef {
    EntityDef::resource("munki_enrollment", "Munki enrollment", "/munki/enrollments/", KeyKind::Int)
        .describe("Manages Munki enrollments.")
        .versioned()
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr(
                    "configuration_id",
                    Attribute::required(AttrType::Int)
                        .describe("ID of the Munki configuration.")
                        .wire_name("configuration"),
                )
                .attr("enrollment_secret", records::enrollment_secret())
                .attr(
                    "package_url",
                    Attribute::computed(AttrType::String)
                        .describe("Download URL of the enrollment package.")
                        .read_only(),
                )
                .attr("version", schema::version()),
        )
}

fn script_check() -> EntityDef {
    EntityDef::resource(
        "munki_script_check",
        "Munki script check",
        "/munki/script_checks/",
        KeyKind::Int,
    )
    .describe("Manages Munki script checks.")
    .versioned()
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the script check."))
            .attr(
                "description",
                Attribute::optional(AttrType::String)
                    .describe("Description of the script check.")
                    .default(""),
            )
            .attr(
                "type",
                Attribute::optional(AttrType::String)
                    .describe("Type of the script check: ZSH_BOOL, ZSH_INT or ZSH_STR.")
                    .default("ZSH_STR")
                    .validate(Validator::OneOf(SCRIPT_CHECK_TYPES)),
            )
            .attr(
                "source",
                Attribute::required(AttrType::String).describe("Source of the script check."),
            )
            .attr(
                "expected_result",
                Attribute::required(AttrType::String).describe("Expected result of the script check."),
            )
            .attr(
                "arch_amd64",
                Attribute::optional(AttrType::Bool)
                    .describe("Run the script check on Intel machines.")
                    .default(true),
            )
            .attr(
                "arch_arm64",
                Attribute::optional(AttrType::Bool)
                    .describe("Run the script check on Apple Silicon machines.")
                    .default(true),
            )
            .attr(
                "min_os_version",
                Attribute::optional(AttrType::String)
                    .describe("Minimum OS version (inclusive).")
                    .default(""),
            )
            .attr(
                "max_os_version",
                Attribute::optional(AttrType::String)
                    .describe("Maximum OS version (exclusive).")
                    .default(""),
            )
            .attr(
                "tag_ids",
                schema::tag_ids("The script check is only run on machines tagged with one of these tags.").wire_name("tags"),
            )
            .attr(
                "excluded_tag_ids",
                schema::tag_ids("The script check is not run on machines tagged with one of these tags.")
                    .wire_name("excluded_tags"),
            )
            .attr("version", schema::version()),
    )
    .data_source(Lookup::id_or_name())
}
