//! Google Workspace connections and group tag mappings

use super::{EntityDef, Lookup};
use crate::client::KeyKind;
use crate::schema::{self, AttrType, Attribute, Block, Validator};

pub fn entities() -> Vec<EntityDef> {
    vec![connection(), group_tag_mapping()]
}

fn connection() -> EntityDef {
    EntityDef::read_only(
        "gws_connection",
        "Google Workspace connection",
        "/google_workspace/connections/",
        KeyKind::Uuid,
    )
    .describe("Allows details of a Google Workspace connection to be retrieved by its ID or its name.")
    .block(
        Block::new()
            .attr("id", schema::uuid_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the connection.")),
    )
    .data_source(Lookup::id_or_name())
}

fn group_tag_mapping() -> EntityDef {
    EntityDef::resource(
        "gws_group_tag_mapping",
        "Google Workspace group tag mapping",
        "/google_workspace/group_tag_mappings/",
        KeyKind::Uuid,
    )
    .describe("Manages Google Workspace group to tag mappings.")
    .block(
        Block::new()
            .attr("id", schema::uuid_id())
            .attr(
                "group_email",
                Attribute::required(AttrType::String).describe("Email address of the Google group."),
            )
            .attr(
                "connection_id",
                Attribute::required(AttrType::String)
                    .describe("ID of the Google Workspace connection.")
                    .wire_name("connection")
                    .requires_replace(),
            )
            .attr(
                "tag_ids",
                Attribute::required(AttrType::int_set())
                    .describe("IDs of the tags applied to the members of the group.")
                    .wire_name("tags")
                    .validate(Validator::LengthAtLeast(1)),
            ),
    )
}
