//! Realms (identity providers), read-only

use super::{EntityDef, Lookup, LookupKey};
use crate::client::KeyKind;
use crate::schema::{self, AttrType, Attribute, Block};

pub fn entities() -> Vec<EntityDef> {
    vec![realm()]
}

fn realm() -> EntityDef {
    EntityDef::read_only("realm", "realm", "/realms/realms/", KeyKind::Uuid)
        .describe("Allows details of a realm to be retrieved by its UUID or its name.")
        .id_attribute("uuid")
        .block(
            Block::new()
                .attr("uuid", schema::uuid_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the realm."))
                .attr("backend", Attribute::computed(AttrType::String).describe("Realm backend."))
                .attr(
                    "enabled_for_login",
                    Attribute::computed(AttrType::Bool).describe("If the realm can be used to login."),
                )
                .attr(
                    "login_session_expiry",
                    Attribute::computed(AttrType::Int).describe("Login session expiry in seconds."),
                )
                .attr(
                    "user_portal",
                    Attribute::computed(AttrType::Bool).describe("If the user portal is enabled."),
                )
                .attr(
                    "scim_enabled",
                    Attribute::computed(AttrType::Bool).describe("If SCIM is enabled."),
                ),
        )
        .data_source(Lookup::OneOf(vec![LookupKey::Id, LookupKey::name()]))
}
