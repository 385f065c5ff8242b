//! Inventory entities

use super::{EntityDef, Lookup};
use crate::client::KeyKind;
use crate::schema::{self, AttrType, Attribute, Block, Validator};
use crate::translate::records::INVENTORY_PLATFORMS;

pub fn entities() -> Vec<EntityDef> {
    vec![meta_business_unit(), tag(), taxonomy(), jmespath_check()]
}

fn meta_business_unit() -> EntityDef {
    EntityDef::resource(
        "meta_business_unit",
        "meta business unit",
        "/inventory/meta_business_units/",
        KeyKind::Int,
    )
    .describe("Manages meta business units.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr(
                "name",
                Attribute::required(AttrType::String).describe("Name of the meta business unit."),
            )
            .attr(
                "api_enrollment_enabled",
                Attribute::optional(AttrType::Bool)
                    .describe("Enables API enrollments.")
                    .bool_default(false),
            ),
    )
    .data_source(Lookup::id_or_name())
}

fn tag() -> EntityDef {
    EntityDef::resource("tag", "tag", "/inventory/tags/", KeyKind::Int)
        .describe("Manages tags.")
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr(
                    "taxonomy_id",
                    Attribute::optional(AttrType::Int)
                        .describe("ID of the tag taxonomy.")
                        .wire_name("taxonomy"),
                )
                .attr("name", Attribute::required(AttrType::String).describe("Name of the tag."))
                .attr(
                    "color",
                    Attribute::optional(AttrType::String)
                        .describe("Color of the tag, as an hexadecimal value.")
                        .default("0079bf")
                        .validate(Validator::LengthAtLeast(6)),
                ),
        )
        .data_source(Lookup::id_or_name())
}

fn taxonomy() -> EntityDef {
    EntityDef::resource("taxonomy", "taxonomy", "/inventory/taxonomies/", KeyKind::Int)
        .describe("Manages tag taxonomies.")
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the taxonomy.")),
        )
        .data_source(Lookup::id_or_name())
}

fn jmespath_check() -> EntityDef {
    EntityDef::resource(
        "jmespath_check",
        "JMESPath check",
        "/inventory/jmespath_checks/",
        KeyKind::Int,
    )
    .describe("Manages inventory JMESPath compliance checks.")
    .versioned()
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the compliance check."))
            .attr(
                "description",
                Attribute::optional(AttrType::String)
                    .describe("Description of the compliance check.")
                    .default(""),
            )
            .attr(
                "source_name",
                Attribute::required(AttrType::String).describe("Name of the inventory source."),
            )
            .attr(
                "platforms",
                Attribute::required(AttrType::string_set())
                    .describe("Platforms the compliance check applies to.")
                    .validate(Validator::LengthAtLeast(1))
                    .validate(Validator::elements(Validator::OneOf(INVENTORY_PLATFORMS))),
            )
            .attr(
                "tag_ids",
                schema::tag_ids("IDs of the tags used to scope the compliance check.").wire_name("tags"),
            )
            .attr(
                "jmespath_expression",
                Attribute::required(AttrType::String)
                    .describe("JMESPath expression evaluated against the inventory data.")
                    .validate(Validator::LengthAtLeast(1)),
            )
            .attr("version", schema::version()),
    )
    .data_source(Lookup::id_or_name())
}
