//! Osquery configurations, packs, queries, ATCs, file categories and
//! enrollments

use super::{EntityDef, Lookup};
use crate::client::KeyKind;
use crate::domain::value::Value;
use crate::schema::{self, AttrType, Attribute, Block, Validator};
use crate::translate::records;
use std::collections::BTreeMap;

pub const OSQUERY_PLATFORMS: &[&str] = &["darwin", "freebsd", "linux", "posix", "windows"];

pub fn entities() -> Vec<EntityDef> {
    vec![
        atc(),
        configuration(),
        configuration_pack(),
        enrollment(),
        file_category(),
        pack(),
        query(),
    ]
}

fn description(what: &'static str) -> Attribute {
    Attribute::optional(AttrType::String).describe(what).default("")
}

fn platforms(what: &'static str) -> Attribute {
    schema::string_set(what).validate(Validator::elements(Validator::OneOf(OSQUERY_PLATFORMS)))
}

fn atc() -> EntityDef {
    EntityDef::resource("osquery_atc", "Osquery ATC", "/osquery/atcs/", KeyKind::Int)
        .describe("Manages Osquery automatic table constructions.")
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the ATC."))
                .attr("description", description("Description of the ATC."))
                .attr(
                    "table_name",
                    Attribute::required(AttrType::String).describe("Name of the table exposed to osquery."),
                )
                .attr(
                    "query",
                    Attribute::required(AttrType::String).describe("Query used to fetch the ATC data."),
                )
                .attr(
                    "path",
                    Attribute::required(AttrType::String).describe("Path of the SQLite database."),
                )
                .attr(
                    "columns",
                    Attribute::required(AttrType::string_list())
                        .describe("Columns of the table.")
                        .validate(Validator::LengthAtLeast(1)),
                )
                .attr(
                    "platforms",
                    Attribute::required(AttrType::string_set())
                        .describe("Platforms of the ATC.")
                        .validate(Validator::LengthAtLeast(1))
                        .validate(Validator::elements(Validator::OneOf(OSQUERY_PLATFORMS))),
                ),
        )
        .data_source(Lookup::id_or_name())
}

fn configuration() -> EntityDef {
    EntityDef::resource(
        "osquery_configuration",
        "Osquery configuration",
        "/osquery/configurations/",
        KeyKind::Int,
    )
    .describe("Manages Osquery configurations.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the configuration."))
            .attr("description", description("Description of the configuration."))
            .attr(
                "inventory",
                Attribute::optional(AttrType::Bool)
                    .describe("Collect the inventory.")
                    .default(true),
            )
            .attr(
                "inventory_apps",
                Attribute::optional(AttrType::Bool)
                    .describe("Collect the installed applications.")
                    .default(false),
            )
            .attr(
                "inventory_ec2",
                Attribute::optional(AttrType::Bool)
                    .describe("Collect the EC2 metadata.")
                    .default(false),
            )
            .attr(
                "inventory_interval",
                Attribute::optional(AttrType::Int)
                    .describe("Inventory collection interval in seconds.")
                    .default(86400)
                    .validate(Validator::IntBetween(60, 172800)),
            )
            .attr(
                "options",
                Attribute::optional(AttrType::map_of(AttrType::String))
                    .describe("Osquery options.")
                    .default(Value::Map(BTreeMap::new())),
            )
            .attr(
                "atc_ids",
                schema::tag_ids("IDs of the automatic table constructions.").wire_name("automatic_table_constructions"),
            )
            .attr(
                "file_category_ids",
                schema::tag_ids("IDs of the file categories.").wire_name("file_categories"),
            ),
    )
    .data_source(Lookup::id_or_name())
}

fn configuration_pack() -> EntityDef {
    EntityDef::resource(
        "osquery_configuration_pack",
        "Osquery configuration pack",
        "/osquery/configuration_packs/",
        KeyKind::Int,
    )
    .describe("Manages Osquery configuration packs.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr(
                "configuration_id",
                Attribute::required(AttrType::Int)
                    .describe("ID of the Osquery configuration.")
                    .wire_name("configuration")
                    .requires_replace(),
            )
            .attr(
                "pack_id",
                Attribute::required(AttrType::Int)
                    .describe("ID of the Osquery pack.")
                    .wire_name("pack")
                    .requires_replace(),
            )
            .attr(
                "tag_ids",
                schema::tag_ids("The pack is only distributed to machines tagged with one of these tags.")
                    .wire_name("tags"),
            )
            .attr(
                "excluded_tag_ids",
                schema::tag_ids("The pack is not distributed to machines tagged with one of these tags.")
                    .wire_name("excluded_tags"),
            ),
    )
}

fn enrollment() -> EntityDef {
    EntityDef::resource(
        "osquery_enrollment",
        "Osquery enrollment",
        "/osquery/enrollments/",
        KeyKind::Int,
    )
    .describe("Manages Osquery enrollments.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr(
                "configuration_id",
                Attribute::required(AttrType::Int)
                    .describe("ID of the Osquery configuration.")
                    .wire_name("configuration"),
            )
            .attr(
                "osquery_release",
                Attribute::optional(AttrType::String)
                    .describe("Osquery release included in the enrollment packages.")
                    .default(""),
            )
            .attr("enrollment_secret", records::enrollment_secret()),
    )
}

fn file_category() -> EntityDef {
    EntityDef::resource(
        "osquery_file_category",
        "Osquery file category",
        "/osquery/file_categories/",
        KeyKind::Int,
    )
    .describe("Manages Osquery file categories.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the file category."))
            .attr("slug", Attribute::computed(AttrType::String).describe("Slug of the file category.").read_only())
            .attr("description", description("Description of the file category."))
            .attr("file_paths", schema::string_set("Paths of the files to monitor."))
            .attr("exclude_paths", schema::string_set("Paths to exclude."))
            .attr(
                "file_paths_queries",
                schema::string_set("Queries returning paths of the files to monitor."),
            )
            .attr(
                "access_monitoring",
                Attribute::optional(AttrType::Bool)
                    .describe("Monitor the file accesses.")
                    .default(false),
            ),
    )
    .data_source(Lookup::id_or_name())
}

fn pack() -> EntityDef {
    EntityDef::resource("osquery_pack", "Osquery pack", "/osquery/packs/", KeyKind::Int)
        .describe("Manages Osquery packs.")
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the pack."))
                .attr("slug", Attribute::computed(AttrType::String).describe("Slug of the pack.").read_only())
                .attr("description", description("Description of the pack."))
                .attr(
                    "discovery_queries",
                    Attribute::optional(AttrType::string_list())
                        .describe("Queries deciding if the pack runs on a machine.")
                        .default(Value::List(Vec::new())),
                )
                .attr(
                    "shard",
                    Attribute::optional(AttrType::Int)
                        .describe("Restrict the pack to a percentage of the machines.")
                        .validate(Validator::IntBetween(1, 100)),
                )
                .attr(
                    "event_routing_key",
                    Attribute::optional(AttrType::String)
                        .describe("Routing key added to the events of the pack queries.")
                        .default(""),
                ),
        )
        .data_source(Lookup::id_or_name())
}

fn query() -> EntityDef {
    let scheduling = Block::new()
        .attr(
            "pack_id",
            Attribute::required(AttrType::Int)
                .describe("ID of the pack the query is scheduled in.")
                .wire_name("pack"),
        )
        .attr(
            "interval",
            Attribute::required(AttrType::Int)
                .describe("Query frequency, in seconds.")
                .validate(Validator::IntBetween(10, 604800)),
        )
        .attr(
            "log_removed_actions",
            Attribute::optional(AttrType::Bool)
                .describe("Log the removed actions.")
                .default(true),
        )
        .attr(
            "snapshot_mode",
            Attribute::optional(AttrType::Bool)
                .describe("Run the query in snapshot mode.")
                .default(false),
        )
        .attr(
            "shard",
            Attribute::optional(AttrType::Int)
                .describe("Restrict the query to a percentage of the machines.")
                .validate(Validator::IntBetween(1, 100)),
        )
        .attr(
            "can_be_denylisted",
            Attribute::optional(AttrType::Bool)
                .describe("The query can be denylisted by the watchdog.")
                .default(true),
        );

    EntityDef::resource("osquery_query", "Osquery query", "/osquery/queries/", KeyKind::Int)
        .describe("Manages Osquery queries.")
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the query."))
                .attr("description", description("Description of the query."))
                .attr("sql", Attribute::required(AttrType::String).describe("SQL of the query."))
                .attr("platforms", platforms("Platforms of the query. Empty means all."))
                .attr(
                    "minimum_osquery_version",
                    Attribute::optional(AttrType::String).describe("Minimum osquery version."),
                )
                .attr(
                    "tag_id",
                    Attribute::optional(AttrType::Int)
                        .describe("ID of the tag applied to the machines the query returns results for.")
                        .wire_name("tag"),
                )
                .attr(
                    "compliance_check",
                    Attribute::optional(AttrType::Bool)
                        .describe("The query is a compliance check.")
                        .default(false),
                )
                .attr(
                    "scheduling",
                    Attribute::optional(scheduling.into_type()).describe("Scheduling of the query in a pack."),
                ),
        )
        .data_source(Lookup::id_or_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::plan_resource_change;
    use crate::translate::{decode_block, encode_block};
    use crate::error::AttributePath;
    use serde_json::json;

    #[test]
    fn test_query_scheduling_round_trip() {
        let def = query();
        let mut config = def.block.null_object();
        config.set("name", Value::from("Uptime"));
        config.set("sql", Value::from("SELECT * FROM uptime;"));
        config.set(
            "scheduling",
            Value::object([
                ("pack_id", Value::Int(7)),
                ("interval", Value::Int(3600)),
                ("log_removed_actions", Value::Null),
                ("snapshot_mode", Value::Bool(true)),
                ("shard", Value::Null),
                ("can_be_denylisted", Value::Null),
            ]),
        );
        let planned = plan_resource_change(&def.block, None, &config).planned;
        let scheduling = planned.get("scheduling");
        assert_eq!(scheduling.get("log_removed_actions"), &Value::Bool(true));
        assert_eq!(scheduling.get("can_be_denylisted"), &Value::Bool(true));

        let mut resolved = planned.clone();
        resolved.set("id", Value::Null);
        let record = encode_block(&def.block, &resolved, &AttributePath::root()).unwrap();
        assert_eq!(record["scheduling"]["pack"], json!(7));
        assert_eq!(record["platforms"], json!([]));

        let mut response = record.clone();
        response.insert("id".into(), json!(12));
        let state = decode_block(&def.block, &json!(response), &planned, &AttributePath::root()).unwrap();
        assert_eq!(state.get("id"), &Value::Int(12));
        assert_eq!(state.get("scheduling").get("pack_id"), &Value::Int(7));
        assert_eq!(state.get("tag_id"), &Value::Null);
    }

    #[test]
    fn test_configuration_options_default_to_empty_map() {
        let def = configuration();
        let mut config = def.block.null_object();
        config.set("name", Value::from("Default"));
        let planned = plan_resource_change(&def.block, None, &config).planned;
        assert_eq!(planned.get("options"), &Value::Map(BTreeMap::new()));
        assert_eq!(planned.get("inventory"), &Value::Bool(true));
    }
}
