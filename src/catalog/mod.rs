//! Entity catalog
//!
//! One [`EntityDef`] per Zentral object the provider knows about: host kind
//! name, endpoint, key flavour, schema block, codec, and whether it is a
//! managed resource, a data source, or both. Data-source schemas are
//! derived from the resource block.

pub mod google_workspace;
pub mod inventory;
pub mod mdm_artifacts;
pub mod mdm_enrollments;
pub mod mdm_settings;
pub mod monolith;
pub mod munki;
pub mod osquery;
pub mod probes;
pub mod realms;
pub mod santa;
pub mod stores;

#[cfg(any(test, feature = "test-support"))]
use crate::client::{Collection, MemoryTransport};
use crate::client::KeyKind;
use crate::schema::{AttrType, Attribute, Block, Constraint, Direction, Role, Schema};
use crate::translate::{EntityCodec, SchemaCodec};
use indexmap::IndexMap;
use std::sync::Arc;

/// Prefix of every kind name exposed to the host
pub const TYPE_PREFIX: &str = "zentral_";

// =============================================================================
// Lookup
// =============================================================================

/// Identifier a data source can look a record up by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey {
    /// The primary key attribute
    Id,
    /// A unique field matched with a list filter
    Field {
        attribute: &'static str,
        query: &'static str,
    },
}

impl LookupKey {
    pub const fn field(attribute: &'static str, query: &'static str) -> Self {
        LookupKey::Field { attribute, query }
    }

    pub const fn name() -> Self {
        LookupKey::Field {
            attribute: "name",
            query: "name",
        }
    }
}

/// Identifier policy of a data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Exactly one identifier; dispatch follows declaration order
    OneOf(Vec<LookupKey>),
    /// Every identifier is required and they are matched together
    AllOf(Vec<LookupKey>),
}

impl Lookup {
    /// `{id, name}`, the most common policy
    pub fn id_or_name() -> Self {
        Lookup::OneOf(vec![LookupKey::Id, LookupKey::name()])
    }

    pub fn keys(&self) -> &[LookupKey] {
        match self {
            Lookup::OneOf(keys) | Lookup::AllOf(keys) => keys,
        }
    }
}

// =============================================================================
// Entity Definition
// =============================================================================

/// Everything the generic handlers need to know about one entity
#[derive(Debug, Clone)]
pub struct EntityDef {
    /// Kind name without the `zentral_` prefix
    pub name: &'static str,
    /// Human readable kind used in diagnostics, e.g. "Santa rule"
    pub kind: &'static str,
    /// Collection path relative to the API base URL
    pub path: &'static str,
    pub key: KeyKind,
    /// Attribute holding the primary key
    pub id_attribute: &'static str,
    /// The server keeps a `version` counter
    pub versioned: bool,
    pub description: &'static str,
    pub block: Block,
    pub codec: Arc<dyn EntityCodec>,
    /// Exposed as a managed resource
    pub resource: bool,
    /// Exposed as a data source with this identifier policy
    pub lookup: Option<Lookup>,
}

impl EntityDef {
    fn new(name: &'static str, kind: &'static str, path: &'static str, key: KeyKind, resource: bool) -> Self {
        Self {
            name,
            kind,
            path,
            key,
            id_attribute: "id",
            versioned: false,
            description: "",
            block: Block::new(),
            codec: Arc::new(SchemaCodec),
            resource,
            lookup: None,
        }
    }

    /// Managed resource
    pub fn resource(name: &'static str, kind: &'static str, path: &'static str, key: KeyKind) -> Self {
        Self::new(name, kind, path, key, true)
    }

    /// Read-only entity, only exposed as a data source
    pub fn read_only(name: &'static str, kind: &'static str, path: &'static str, key: KeyKind) -> Self {
        Self::new(name, kind, path, key, false)
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn block(mut self, block: Block) -> Self {
        self.block = block;
        self
    }

    pub fn codec(mut self, codec: impl EntityCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn versioned(mut self) -> Self {
        self.versioned = true;
        self
    }

    pub fn id_attribute(mut self, name: &'static str) -> Self {
        self.id_attribute = name;
        self
    }

    pub fn data_source(mut self, lookup: Lookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Kind name exposed to the host
    pub fn type_name(&self) -> String {
        format!("{}{}", TYPE_PREFIX, self.name)
    }

    pub fn resource_schema(&self) -> Schema {
        Schema::new(self.description, self.block.clone())
    }

    /// Attribute name of a lookup key
    pub fn lookup_attribute(&self, key: &LookupKey) -> &'static str {
        match key {
            LookupKey::Id => self.id_attribute,
            LookupKey::Field { attribute, .. } => attribute,
        }
    }

    /// Data-source schema derived from the resource block: identifiers are
    /// configurable, everything else is computed, defaults and validators
    /// are dropped, and local attributes disappear.
    pub fn data_source_schema(&self) -> Option<Schema> {
        let lookup = self.lookup.as_ref()?;
        let identifiers: Vec<&'static str> = lookup.keys().iter().map(|k| self.lookup_attribute(k)).collect();

        let mut block = Block::new();
        for (name, attr) in self.block.iter() {
            if matches!(attr.wire.direction, Direction::Local | Direction::WriteOnly) {
                continue;
            }
            let mut attr = computed_copy(attr);
            if identifiers.contains(&name) {
                attr.role = match lookup {
                    Lookup::OneOf(_) => Role::OptionalComputed,
                    Lookup::AllOf(_) => Role::Required,
                };
            }
            block = block.attr(name, attr);
        }
        if let Lookup::OneOf(_) = lookup {
            if identifiers.len() > 1 {
                block = block.constraint(Constraint::ExactlyOneOf(identifiers));
            }
        }

        let description = if self.description.is_empty() {
            self.kind
        } else {
            self.description
        };
        Some(Schema::new(description, block))
    }

    /// Memory transport collection for this entity
    #[cfg(any(test, feature = "test-support"))]
    pub fn collection(&self) -> Collection {
        let key_field = self
            .block
            .get(self.id_attribute)
            .and_then(|a| a.wire.name)
            .unwrap_or(self.id_attribute);
        let collection = match self.key {
            KeyKind::Int => Collection::int(),
            KeyKind::Uuid => Collection::uuid(),
        }
        .key_field(key_field);
        if self.versioned {
            collection.versioned()
        } else {
            collection
        }
    }
}

fn computed_copy(attr: &Attribute) -> Attribute {
    let ty = computed_type(&attr.ty);
    let mut copy = Attribute::computed(ty).describe(attr.description);
    copy.sensitive = attr.sensitive;
    copy.wire = attr.wire.clone();
    copy
}

fn computed_type(ty: &AttrType) -> AttrType {
    match ty {
        AttrType::Object(block) => {
            let mut computed = Block::new();
            for (name, attr) in block.iter() {
                computed = computed.attr(name, computed_copy(attr));
            }
            computed.into_type()
        }
        AttrType::List(element) => AttrType::list_of(computed_type(element)),
        AttrType::Set(element) => AttrType::set_of(computed_type(element)),
        AttrType::Map(element) => AttrType::map_of(computed_type(element)),
        scalar => scalar.clone(),
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Every entity, keyed by kind name without prefix
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entities: IndexMap<&'static str, Arc<EntityDef>>,
}

impl Catalog {
    /// The full Zentral catalog
    pub fn zentral() -> Self {
        let mut catalog = Self::default();
        for def in inventory::entities()
            .into_iter()
            .chain(realms::entities())
            .chain(google_workspace::entities())
            .chain(mdm_artifacts::entities())
            .chain(mdm_enrollments::entities())
            .chain(mdm_settings::entities())
            .chain(munki::entities())
            .chain(osquery::entities())
            .chain(santa::entities())
            .chain(monolith::entities())
            .chain(probes::entities())
            .chain(stores::entities())
        {
            catalog.insert(def);
        }
        catalog
    }

    pub fn insert(&mut self, def: EntityDef) {
        self.entities.insert(def.name, Arc::new(def));
    }

    /// Look an entity up by host kind name, with or without prefix
    pub fn get(&self, type_name: &str) -> Option<&Arc<EntityDef>> {
        let name = type_name.strip_prefix(TYPE_PREFIX).unwrap_or(type_name);
        self.entities.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntityDef>> {
        self.entities.values()
    }

    pub fn resources(&self) -> impl Iterator<Item = &Arc<EntityDef>> {
        self.iter().filter(|d| d.resource)
    }

    pub fn data_sources(&self) -> impl Iterator<Item = &Arc<EntityDef>> {
        self.iter().filter(|d| d.lookup.is_some())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Declare every collection on an in-process API
    #[cfg(any(test, feature = "test-support"))]
    pub fn register_collections(&self, transport: &MemoryTransport) {
        for def in self.iter() {
            transport.register(def.path, def.collection());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::Value;
    use crate::error::{AttributePath, Diagnostics};
    use crate::schema::validate_block;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_names_are_unique_and_prefixed() {
        let catalog = Catalog::zentral();
        let mut paths = HashSet::new();
        for def in catalog.iter() {
            assert!(def.type_name().starts_with("zentral_"));
            assert!(def.path.starts_with('/') && def.path.ends_with('/'), "{}", def.path);
            assert!(paths.insert(def.path), "duplicate path {}", def.path);
            assert!(def.block.get(def.id_attribute).is_some(), "{} has no id", def.name);
        }
        assert!(catalog.get("zentral_santa_rule").is_some());
        assert!(catalog.get("santa_rule").is_some());
        assert!(catalog.get("zentral_unknown").is_none());
    }

    #[test]
    fn test_catalog_covers_resources_and_data_sources() {
        let catalog = Catalog::zentral();
        let resources: HashSet<&str> = catalog.resources().map(|d| d.name).collect();
        let data_sources: HashSet<&str> = catalog.data_sources().map(|d| d.name).collect();

        for name in [
            "meta_business_unit",
            "tag",
            "taxonomy",
            "jmespath_check",
            "gws_group_tag_mapping",
            "mdm_artifact",
            "mdm_profile",
            "mdm_declaration",
            "mdm_enterprise_app",
            "mdm_store_app",
            "mdm_provisioning_profile",
            "mdm_data_asset",
            "mdm_cert_asset",
            "mdm_blueprint",
            "mdm_blueprint_artifact",
            "mdm_dep_enrollment",
            "mdm_ota_enrollment",
            "mdm_user_enrollment",
            "mdm_enrollment_custom_view",
            "mdm_filevault_config",
            "mdm_recovery_password_config",
            "mdm_scep_config",
            "mdm_scep_issuer",
            "mdm_acme_issuer",
            "mdm_software_update_enforcement",
            "munki_configuration",
            "munki_enrollment",
            "munki_script_check",
            "osquery_atc",
            "osquery_configuration",
            "osquery_configuration_pack",
            "osquery_enrollment",
            "osquery_file_category",
            "osquery_pack",
            "osquery_query",
            "santa_configuration",
            "santa_enrollment",
            "santa_rule",
            "monolith_catalog",
            "monolith_condition",
            "monolith_enrollment",
            "monolith_manifest",
            "monolith_manifest_catalog",
            "monolith_manifest_enrollment_package",
            "monolith_manifest_sub_manifest",
            "monolith_repository",
            "monolith_sub_manifest",
            "monolith_sub_manifest_pkg_info",
            "probe",
            "probe_action",
            "store",
        ] {
            assert!(resources.contains(name), "missing resource {}", name);
        }

        for name in [
            "meta_business_unit",
            "tag",
            "taxonomy",
            "jmespath_check",
            "realm",
            "gws_connection",
            "mdm_acme_issuer",
            "mdm_scep_issuer",
            "mdm_blueprint",
            "mdm_dep_virtual_server",
            "mdm_push_certificate",
            "mdm_location",
            "mdm_location_asset",
            "mdm_filevault_config",
            "mdm_recovery_password_config",
            "mdm_scep_config",
            "mdm_software_update_enforcement",
            "munki_configuration",
            "munki_script_check",
            "osquery_atc",
            "osquery_configuration",
            "osquery_file_category",
            "osquery_pack",
            "osquery_query",
            "santa_configuration",
            "monolith_catalog",
            "monolith_condition",
            "monolith_manifest",
            "monolith_repository",
            "monolith_sub_manifest",
            "probe_action",
            "store",
        ] {
            assert!(data_sources.contains(name), "missing data source {}", name);
        }
        assert!(!resources.contains("realm"));
    }

    #[test]
    fn test_data_source_schema_is_derived() {
        let catalog = Catalog::zentral();
        let def = catalog.get("santa_configuration").unwrap();
        let schema = def.data_source_schema().unwrap();

        assert_eq!(schema.attribute("id").unwrap().role, Role::OptionalComputed);
        assert_eq!(schema.attribute("name").unwrap().role, Role::OptionalComputed);
        let client_mode = schema.attribute("client_mode").unwrap();
        assert_eq!(client_mode.role, Role::Computed);
        assert!(client_mode.default.is_none());
        assert!(client_mode.validators.is_empty());
        assert!(client_mode.wire.enum_map.is_some());
    }

    #[test]
    fn test_every_data_source_schema_validates_a_single_identifier() {
        let catalog = Catalog::zentral();
        for def in catalog.data_sources() {
            let schema = def.data_source_schema().unwrap();
            let lookup = def.lookup.as_ref().unwrap();
            let mut config = schema.block.null_object();
            for key in lookup.keys() {
                let attribute = def.lookup_attribute(key);
                let value = match schema.attribute(attribute).map(|a| &a.ty) {
                    Some(AttrType::Int) => Value::Int(1),
                    _ => Value::from("x"),
                };
                config.set(attribute, value);
                if let Lookup::OneOf(_) = lookup {
                    break;
                }
            }
            let mut diags = Diagnostics::new();
            validate_block(&schema.block, &config, &AttributePath::root(), &mut diags);
            assert!(diags.is_empty(), "{}: {:?}", def.name, diags);
        }
    }

    #[test]
    fn test_collections_follow_entity_keys() {
        let catalog = Catalog::zentral();
        for def in catalog.iter() {
            let collection = def.collection();
            assert_eq!(collection.key, def.key, "{}", def.name);
            assert_eq!(collection.versioned, def.versioned, "{}", def.name);
        }
        assert_eq!(catalog.get("store").unwrap().key, KeyKind::Uuid);
        assert_eq!(catalog.get("santa_rule").unwrap().key, KeyKind::Int);
    }
}
