//! Monolith repositories, catalogs, conditions, manifests, sub manifests
//! and their bindings

use super::{EntityDef, Lookup};
use crate::client::KeyKind;
use crate::schema::{self, AttrType, Attribute, Block, Validator};
use crate::translate::records::{self, repository_backend_block, repository_union};
use crate::translate::BackendCodec;

pub const PKG_INFO_KEYS: &[&str] = &[
    "default_installs",
    "managed_installs",
    "managed_uninstalls",
    "optional_installs",
];

pub const ENROLLMENT_PACKAGE_BUILDERS: &[&str] = &[
    "zentral.contrib.munki.osx_package.builder.MunkiZentralEnrollPkgBuilder",
    "zentral.contrib.osquery.osx_package.builder.OsqueryZentralEnrollPkgBuilder",
    "zentral.contrib.santa.osx_package.builder.SantaZentralEnrollPkgBuilder",
];

pub fn entities() -> Vec<EntityDef> {
    vec![
        repository(),
        catalog(),
        condition(),
        enrollment(),
        manifest(),
        manifest_catalog(),
        manifest_enrollment_package(),
        manifest_sub_manifest(),
        sub_manifest(),
        sub_manifest_pkg_info(),
    ]
}

fn manifest_id() -> Attribute {
    Attribute::required(AttrType::Int)
        .describe("ID of the manifest.")
        .wire_name("manifest")
        .requires_replace()
}

fn repository() -> EntityDef {
    EntityDef::resource(
        "monolith_repository",
        "Monolith repository",
        "/monolith/repositories/",
        KeyKind::Int,
    )
    .describe("Manages Monolith repositories.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the repository."))
            .attr(
                "meta_business_unit_id",
                Attribute::optional(AttrType::Int)
                    .describe("ID of the meta business unit the repository is restricted to.")
                    .wire_name("meta_business_unit"),
            )
            .attr(
                "client_resources",
                schema::string_set("Client resources distributed with the repository."),
            )
            .merge(repository_backend_block()),
    )
    .codec(BackendCodec::new(repository_union()))
    .data_source(Lookup::id_or_name())
}

fn catalog() -> EntityDef {
    EntityDef::resource("monolith_catalog", "Monolith catalog", "/monolith/catalogs/", KeyKind::Int)
        .describe("Manages Monolith catalogs.")
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr(
                    "repository_id",
                    Attribute::required(AttrType::Int)
                        .describe("ID of the repository the catalog belongs to.")
                        .wire_name("repository")
                        .requires_replace(),
                )
                .attr("name", Attribute::required(AttrType::String).describe("Name of the catalog.")),
        )
        .data_source(Lookup::id_or_name())
}

fn condition() -> EntityDef {
    EntityDef::resource(
        "monolith_condition",
        "Monolith condition",
        "/monolith/conditions/",
        KeyKind::Int,
    )
    .describe("Manages Monolith conditions.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the condition."))
            .attr(
                "predicate",
                Attribute::required(AttrType::String).describe("Munki predicate of the condition."),
            ),
    )
    .data_source(Lookup::id_or_name())
}

fn enrollment() -> EntityDef {
    EntityDef::resource(
        "monolith_enrollment",
        "Monolith enrollment",
        "/monolith/enrollments/",
        KeyKind::Int,
    )
    .describe("Manages Monolith enrollments.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("manifest_id", manifest_id())
            .attr("enrollment_secret", records::enrollment_secret()),
    )
}

fn manifest() -> EntityDef {
    EntityDef::resource("monolith_manifest", "Monolith manifest", "/monolith/manifests/", KeyKind::Int)
        .describe("Manages Monolith manifests.")
        .versioned()
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the manifest."))
                .attr(
                    "meta_business_unit_id",
                    Attribute::required(AttrType::Int)
                        .describe("ID of the meta business unit.")
                        .wire_name("meta_business_unit"),
                )
                .attr("version", schema::version()),
        )
        .data_source(Lookup::id_or_name())
}

fn manifest_catalog() -> EntityDef {
    EntityDef::resource(
        "monolith_manifest_catalog",
        "Monolith manifest catalog",
        "/monolith/manifest_catalogs/",
        KeyKind::Int,
    )
    .describe("Manages Monolith manifest catalogs.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("manifest_id", manifest_id())
            .attr(
                "catalog_id",
                Attribute::required(AttrType::Int)
                    .describe("ID of the catalog.")
                    .wire_name("catalog")
                    .requires_replace(),
            )
            .attr(
                "tag_ids",
                schema::tag_ids("The catalog is only included for machines tagged with one of these tags.")
                    .wire_name("tags"),
            ),
    )
}

fn manifest_enrollment_package() -> EntityDef {
    EntityDef::resource(
        "monolith_manifest_enrollment_package",
        "Monolith manifest enrollment package",
        "/monolith/manifest_enrollment_packages/",
        KeyKind::Int,
    )
    .describe("Manages Monolith manifest enrollment packages.")
    .versioned()
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("manifest_id", manifest_id())
            .attr(
                "builder",
                Attribute::required(AttrType::String)
                    .describe("Builder of the enrollment package.")
                    .validate(Validator::OneOf(ENROLLMENT_PACKAGE_BUILDERS))
                    .requires_replace(),
            )
            .attr(
                "enrollment_id",
                Attribute::required(AttrType::Int)
                    .describe("ID of the agent enrollment.")
                    .wire_name("enrollment_pk")
                    .requires_replace(),
            )
            .attr(
                "tag_ids",
                schema::tag_ids("The package is only included for machines tagged with one of these tags.")
                    .wire_name("tags"),
            )
            .attr("version", schema::version()),
    )
}

fn manifest_sub_manifest() -> EntityDef {
    EntityDef::resource(
        "monolith_manifest_sub_manifest",
        "Monolith manifest sub manifest",
        "/monolith/manifest_sub_manifests/",
        KeyKind::Int,
    )
    .describe("Manages Monolith manifest sub manifests.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("manifest_id", manifest_id())
            .attr(
                "sub_manifest_id",
                Attribute::required(AttrType::Int)
                    .describe("ID of the sub manifest.")
                    .wire_name("sub_manifest")
                    .requires_replace(),
            )
            .attr(
                "tag_ids",
                schema::tag_ids("The sub manifest is only included for machines tagged with one of these tags.")
                    .wire_name("tags"),
            ),
    )
}

fn sub_manifest() -> EntityDef {
    EntityDef::resource(
        "monolith_sub_manifest",
        "Monolith sub manifest",
        "/monolith/sub_manifests/",
        KeyKind::Int,
    )
    .describe("Manages Monolith sub manifests.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the sub manifest."))
            .attr(
                "description",
                Attribute::optional(AttrType::String)
                    .describe("Description of the sub manifest.")
                    .default(""),
            )
            .attr(
                "meta_business_unit_id",
                Attribute::optional(AttrType::Int)
                    .describe("ID of the meta business unit the sub manifest is restricted to.")
                    .wire_name("meta_business_unit"),
            ),
    )
    .data_source(Lookup::id_or_name())
}

fn sub_manifest_pkg_info() -> EntityDef {
    EntityDef::resource(
        "monolith_sub_manifest_pkg_info",
        "Monolith sub manifest pkg info",
        "/monolith/sub_manifest_pkg_infos/",
        KeyKind::Int,
    )
    .describe("Manages Monolith sub manifest pkg infos.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr(
                "sub_manifest_id",
                Attribute::required(AttrType::Int)
                    .describe("ID of the sub manifest.")
                    .wire_name("sub_manifest")
                    .requires_replace(),
            )
            .attr(
                "key",
                Attribute::required(AttrType::String)
                    .describe("Munki key of the pkg info.")
                    .validate(Validator::OneOf(PKG_INFO_KEYS)),
            )
            .attr(
                "pkg_info_name",
                Attribute::required(AttrType::String)
                    .describe("Name of the pkg info.")
                    .requires_replace(),
            )
            .attr(
                "featured_item",
                Attribute::optional(AttrType::Bool)
                    .describe("Display the pkg info as a featured item in Managed Software Center.")
                    .default(false),
            )
            .attr(
                "condition_id",
                Attribute::optional(AttrType::Int)
                    .describe("ID of the condition.")
                    .wire_name("condition"),
            )
            .merge(records::sharding())
            .attr(
                "excluded_tag_ids",
                schema::tag_ids("Machines tagged with one of these tags will not receive the pkg info.")
                    .wire_name("excluded_tags"),
            )
            .attr("tag_shards", records::tag_shards()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::Value;
    use crate::error::Diagnostics;
    use serde_json::json;

    fn s3_repository() -> Value {
        let def = repository();
        let mut config = def.block.null_object();
        config.set("name", Value::from("Default"));
        config.set("backend", Value::from("S3"));
        config.set(
            "s3",
            Value::object([
                ("bucket", Value::from("munki")),
                ("region_name", Value::from("eu-central-1")),
                ("prefix", Value::from("")),
                ("access_key_id", Value::from("")),
                ("secret_access_key", Value::from("")),
                ("assume_role_arn", Value::from("")),
                ("signature_version", Value::from("")),
                ("endpoint_url", Value::from("")),
                ("cloudfront_domain", Value::from("")),
                ("cloudfront_key_id", Value::from("")),
                ("cloudfront_privkey_pem", Value::from("")),
            ]),
        );
        config.set("client_resources", Value::empty_set());
        config
    }

    #[test]
    fn test_repository_backend_must_match_body() {
        let def = repository();
        let config = s3_repository();
        let mut diags = Diagnostics::new();
        def.codec.validate(&config, &mut diags);
        assert!(diags.is_empty(), "{:?}", diags);

        let record = def.codec.encode(&def.block, &config).unwrap();
        assert_eq!(record["backend"], json!("S3"));
        assert_eq!(record["s3"]["bucket"], json!("munki"));
        assert!(record["azure"].is_null());

        let mut mismatched = config.clone();
        mismatched.set("backend", Value::from("AZURE"));
        let mut diags = Diagnostics::new();
        def.codec.validate(&mismatched, &mut diags);
        assert!(diags.has_errors());
        assert!(def.codec.encode(&def.block, &mismatched).is_err());
    }
}
