//! Santa configurations, enrollments and rules

use super::{EntityDef, Lookup};
use crate::client::KeyKind;
use crate::schema::{self, AttrType, Attribute, Block, EnumMap, Validator};
use crate::translate::records;
use crate::translate::SantaRuleCodec;

pub static CLIENT_MODES: EnumMap = EnumMap {
    name: "Santa client mode",
    pairs: &[("MONITOR", 1), ("LOCKDOWN", 2)],
};

/// Rule policies; 4 (REMOVE) is never exposed
pub static RULE_POLICIES: EnumMap = EnumMap {
    name: "Santa rule policy",
    pairs: &[
        ("ALLOWLIST", 1),
        ("BLOCKLIST", 2),
        ("SILENT_BLOCKLIST", 3),
        ("ALLOWLIST_COMPILER", 5),
        ("CEL", 6),
    ],
};

const CLIENT_MODE_NAMES: &[&str] = &["MONITOR", "LOCKDOWN"];
const RULE_POLICY_NAMES: &[&str] = &["ALLOWLIST", "BLOCKLIST", "SILENT_BLOCKLIST", "ALLOWLIST_COMPILER", "CEL"];

pub const TARGET_TYPES: &[&str] = &["BINARY", "BUNDLE", "CDHASH", "CERTIFICATE", "SIGNINGID", "TEAMID"];

pub fn entities() -> Vec<EntityDef> {
    vec![configuration(), enrollment(), rule()]
}

fn configuration() -> EntityDef {
    EntityDef::resource(
        "santa_configuration",
        "Santa configuration",
        "/santa/configurations/",
        KeyKind::Int,
    )
    .describe("Manages Santa configurations.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the configuration."))
            .attr(
                "client_mode",
                Attribute::optional(AttrType::String)
                    .describe("Client mode of the configuration: MONITOR or LOCKDOWN.")
                    .default("MONITOR")
                    .validate(Validator::OneOf(CLIENT_MODE_NAMES))
                    .enum_map(&CLIENT_MODES),
            )
            .attr(
                "client_certificate_auth",
                Attribute::optional(AttrType::Bool)
                    .describe("Authenticate the clients with TLS certificates.")
                    .bool_default(false),
            )
            .attr(
                "batch_size",
                Attribute::optional(AttrType::Int)
                    .describe("Number of events uploaded in a single request.")
                    .default(50)
                    .validate(Validator::IntBetween(5, 100)),
            )
            .attr(
                "full_sync_interval",
                Attribute::optional(AttrType::Int)
                    .describe("Full sync interval in seconds.")
                    .default(600)
                    .validate(Validator::IntBetween(60, 86400)),
            )
            .attr(
                "enable_bundles",
                Attribute::optional(AttrType::Bool)
                    .describe("Compute bundle hashes.")
                    .bool_default(false),
            )
            .attr(
                "enable_transitive_rules",
                Attribute::optional(AttrType::Bool)
                    .describe("Enable the transitive rules.")
                    .bool_default(false),
            )
            .attr(
                "allowed_path_regex",
                Attribute::optional(AttrType::String)
                    .describe("Matching binaries are allowed to run.")
                    .default(""),
            )
            .attr(
                "blocked_path_regex",
                Attribute::optional(AttrType::String)
                    .describe("Matching binaries are blocked.")
                    .default(""),
            )
            .attr(
                "block_usb_mount",
                Attribute::optional(AttrType::Bool)
                    .describe("Block the USB mass storage devices.")
                    .bool_default(false),
            )
            .attr(
                "remount_usb_mode",
                schema::string_set("Mount options forced on the USB mass storage devices."),
            )
            .attr(
                "allow_unknown_shard",
                Attribute::optional(AttrType::Int)
                    .describe("Percentage of machines allowed to run unknown binaries in lockdown mode.")
                    .default(100)
                    .validate(Validator::IntBetween(0, 100)),
            )
            .attr(
                "enable_all_event_upload_shard",
                Attribute::optional(AttrType::Int)
                    .describe("Percentage of machines uploading all the events.")
                    .default(0)
                    .validate(Validator::IntBetween(0, 100)),
            )
            .attr(
                "sync_incident_severity",
                Attribute::optional(AttrType::Int)
                    .describe("Severity of the sync incidents. 0 disables them.")
                    .default(0)
                    .validate(Validator::IntOneOf(&[0, 100, 200, 300])),
            )
            .attr(
                "voting_realm_id",
                Attribute::optional(AttrType::String)
                    .describe("UUID of the realm used for the ballots.")
                    .wire_name("voting_realm"),
            )
            .attr(
                "default_voting_weight",
                Attribute::optional(AttrType::Int)
                    .describe("Default voting weight.")
                    .default(0)
                    .validate(Validator::IntAtLeast(0)),
            )
            .attr(
                "default_ballot_target_types",
                schema::string_set("Target types the users can vote on by default.")
                    .validate(Validator::elements(Validator::OneOf(&["METABUNDLE", "SIGNINGID"]))),
            )
            .attr(
                "banned_threshold",
                Attribute::optional(AttrType::Int)
                    .describe("Ballot score at which a target is banned.")
                    .default(-26),
            )
            .attr(
                "partially_allowlisted_threshold",
                Attribute::optional(AttrType::Int)
                    .describe("Ballot score at which a target is allowlisted for the voters.")
                    .default(5),
            )
            .attr(
                "globally_allowlisted_threshold",
                Attribute::optional(AttrType::Int)
                    .describe("Ballot score at which a target is allowlisted for everyone.")
                    .default(50),
            ),
    )
    .data_source(Lookup::id_or_name())
}

fn enrollment() -> EntityDef {
    EntityDef::resource("santa_enrollment", "Santa enrollment", "/santa/enrollments/", KeyKind::Int)
        .describe("Manages Santa enrollments.")
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr(
                    "configuration_id",
                    Attribute::required(AttrType::Int)
                        .describe("ID of the Santa configuration.")
                        .wire_name("configuration"),
                )
                .attr("enrollment_secret", records::enrollment_secret()),
        )
}

fn rule() -> EntityDef {
    EntityDef::resource("santa_rule", "Santa rule", "/santa/rules/", KeyKind::Int)
        .describe("Manages Santa rules.")
        .versioned()
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr(
                    "configuration_id",
                    Attribute::required(AttrType::Int)
                        .describe("ID of the Santa configuration.")
                        .wire_name("configuration")
                        .requires_replace(),
                )
                .attr(
                    "policy",
                    Attribute::required(AttrType::String)
                        .describe("Policy of the rule.")
                        .validate(Validator::OneOf(RULE_POLICY_NAMES))
                        .enum_map(&RULE_POLICIES),
                )
                .attr(
                    "cel_expr",
                    Attribute::optional(AttrType::String)
                        .describe("CEL expression of a CEL rule.")
                        .default(""),
                )
                .attr(
                    "target_type",
                    Attribute::required(AttrType::String)
                        .describe("Type of the rule target.")
                        .validate(Validator::OneOf(TARGET_TYPES))
                        .requires_replace(),
                )
                .attr(
                    "target_identifier",
                    Attribute::required(AttrType::String)
                        .describe("Identifier of the rule target.")
                        .requires_replace(),
                )
                .attr(
                    "description",
                    Attribute::optional(AttrType::String)
                        .describe("Description of the rule. Only visible in Zentral.")
                        .default(""),
                )
                .attr(
                    "custom_message",
                    Attribute::optional(AttrType::String)
                        .describe("Custom message displayed when the rule blocks a binary.")
                        .default(""),
                )
                .attr(
                    "custom_url",
                    Attribute::optional(AttrType::String)
                        .describe("Custom URL displayed when the rule blocks a binary.")
                        .default(""),
                )
                .attr(
                    "primary_users",
                    schema::string_set("The rule is only applied to machines with one of these primary users."),
                )
                .attr(
                    "excluded_primary_users",
                    schema::string_set("The rule is not applied to machines with one of these primary users."),
                )
                .attr(
                    "serial_numbers",
                    schema::string_set("The rule is only applied to machines with one of these serial numbers."),
                )
                .attr(
                    "excluded_serial_numbers",
                    schema::string_set("The rule is not applied to machines with one of these serial numbers."),
                )
                .attr(
                    "tag_ids",
                    schema::tag_ids("The rule is only applied to machines tagged with one of these tags.")
                        .wire_name("tags"),
                )
                .attr(
                    "excluded_tag_ids",
                    schema::tag_ids("The rule is not applied to machines tagged with one of these tags.")
                        .wire_name("excluded_tags"),
                )
                .attr("version", schema::version()),
        )
        .codec(SantaRuleCodec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::Value;
    use crate::error::Error;
    use crate::translate::{EntityCodec, SchemaCodec};
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_policy_table_has_a_gap_at_four() {
        assert_eq!(RULE_POLICIES.to_wire("ALLOWLIST_COMPILER"), Some(5));
        assert_eq!(RULE_POLICIES.from_wire(4), None);
        assert_eq!(RULE_POLICIES.names(), RULE_POLICY_NAMES.to_vec());
        assert_eq!(CLIENT_MODES.names(), CLIENT_MODE_NAMES.to_vec());
    }

    #[test]
    fn test_unknown_remote_client_mode_is_an_error() {
        let def = configuration();
        let response = json!({"id": 1, "name": "Default", "client_mode": 3});
        let err = SchemaCodec
            .decode(&def.block, &response, &Value::Null)
            .unwrap_err();
        assert_matches!(err, Error::InvalidAttributeValue { .. });

        let response = json!({"id": 1, "name": "Default", "client_mode": 2});
        let state = SchemaCodec.decode(&def.block, &response, &Value::Null).unwrap();
        assert_eq!(state.get("client_mode"), &Value::from("LOCKDOWN"));
    }
}
