//! MDM enrollments, their custom views, and the read-only Apple business
//! objects they reference (DEP virtual servers, locations, location assets)

use super::{EntityDef, Lookup, LookupKey};
use crate::client::KeyKind;
use crate::schema::{self, AttrType, Attribute, Block, Constraint, Validator};
use crate::translate::records;
use crate::translate::CustomViewCodec;

pub fn entities() -> Vec<EntityDef> {
    vec![
        dep_virtual_server(),
        location(),
        location_asset(),
        dep_enrollment(),
        ota_enrollment(),
        user_enrollment(),
        enrollment_custom_view(),
    ]
}

// =============================================================================
// Read-only
// =============================================================================

fn dep_virtual_server() -> EntityDef {
    EntityDef::read_only(
        "mdm_dep_virtual_server",
        "MDM DEP virtual server",
        "/mdm/dep_virtual_servers/",
        KeyKind::Int,
    )
    .describe("Allows details of a MDM DEP virtual server to be retrieved by its ID or its name.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the DEP virtual server."))
            .attr("uuid", Attribute::computed(AttrType::String).describe("UUID of the DEP virtual server."))
            .attr(
                "organization",
                Attribute::computed(AttrType::String).describe("Name of the organization."),
            ),
    )
    .data_source(Lookup::id_or_name())
}

fn location() -> EntityDef {
    EntityDef::read_only("mdm_location", "MDM location", "/mdm/locations/", KeyKind::Int)
        .describe("Allows details of a MDM apps and books location to be retrieved by its ID, its MDM info ID or its name.")
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr(
                    "mdm_info_id",
                    Attribute::optional(AttrType::String).describe("MDM info ID of the location."),
                )
                .attr("name", Attribute::required(AttrType::String).describe("Name of the location."))
                .attr(
                    "organization_name",
                    Attribute::computed(AttrType::String).describe("Name of the organization."),
                ),
        )
        .data_source(Lookup::OneOf(vec![
            LookupKey::Id,
            LookupKey::field("mdm_info_id", "mdm_info_id"),
            LookupKey::name(),
        ]))
}

fn location_asset() -> EntityDef {
    EntityDef::read_only(
        "mdm_location_asset",
        "MDM location asset",
        "/mdm/location_assets/",
        KeyKind::Int,
    )
    .describe("Allows details of a MDM location asset to be retrieved by its location ID, adam ID and pricing param.")
    .block(
        Block::new()
            .attr("id", schema::int_id())
            .attr(
                "location_id",
                Attribute::required(AttrType::Int)
                    .describe("ID of the location.")
                    .wire_name("location"),
            )
            .attr("adam_id", Attribute::required(AttrType::String).describe("Adam ID of the asset."))
            .attr(
                "pricing_param",
                Attribute::required(AttrType::String).describe("Pricing param of the asset."),
            ),
    )
    .data_source(Lookup::AllOf(vec![
        LookupKey::field("location_id", "location"),
        LookupKey::field("adam_id", "adam_id"),
        LookupKey::field("pricing_param", "pricing_param"),
    ]))
}

// =============================================================================
// Enrollments
// =============================================================================

/// Name, display name and secret shared by the three enrollment flavours
fn enrollment_base() -> Block {
    Block::new()
        .attr("id", schema::int_id())
        .attr("name", Attribute::required(AttrType::String).describe("Name of the enrollment."))
        .attr(
            "display_name",
            Attribute::required(AttrType::String).describe("Name displayed to the users during the enrollment."),
        )
        .attr("enrollment_secret", records::enrollment_secret())
        .attr(
            "push_certificate_id",
            Attribute::required(AttrType::Int)
                .describe("ID of the MDM push certificate.")
                .wire_name("push_certificate"),
        )
        .attr(
            "blueprint_id",
            Attribute::optional(AttrType::Int)
                .describe("ID of the MDM blueprint.")
                .wire_name("blueprint"),
        )
        .attr(
            "acme_issuer_id",
            Attribute::optional(AttrType::String)
                .describe("ID of the ACME issuer.")
                .wire_name("acme_issuer"),
        )
        .attr(
            "scep_issuer_id",
            Attribute::required(AttrType::String)
                .describe("ID of the SCEP issuer.")
                .wire_name("scep_issuer"),
        )
}

fn dep_enrollment() -> EntityDef {
    let os_version = |description| {
        Attribute::optional(AttrType::String)
            .describe(description)
            .default("")
    };
    EntityDef::resource(
        "mdm_dep_enrollment",
        "MDM DEP enrollment",
        "/mdm/dep_enrollments/",
        KeyKind::Int,
    )
    .describe("Manages MDM DEP enrollments.")
    .block(
        enrollment_base()
            .attr(
                "virtual_server_id",
                Attribute::required(AttrType::Int)
                    .describe("ID of the DEP virtual server.")
                    .wire_name("virtual_server")
                    .requires_replace(),
            )
            .attr(
                "uuid",
                Attribute::computed(AttrType::String)
                    .describe("UUID of the DEP profile.")
                    .use_state_for_unknown()
                    .read_only(),
            )
            .attr(
                "realm_uuid",
                Attribute::optional(AttrType::String)
                    .describe("UUID of the realm used to authenticate the users.")
                    .wire_name("realm"),
            )
            .attr(
                "use_realm_user",
                Attribute::optional(AttrType::Bool)
                    .describe("Use the realm user to create the local account.")
                    .default(false),
            )
            .attr(
                "username_pattern",
                Attribute::optional(AttrType::String)
                    .describe("Pattern used to build the username of the local account.")
                    .default("")
                    .validate(Validator::OneOf(&["", "$REALM_USER.DEVICE_USERNAME", "$REALM_USER.EMAIL_PREFIX"])),
            )
            .attr(
                "realm_user_is_admin",
                Attribute::optional(AttrType::Bool)
                    .describe("The local account of the realm user is an admin.")
                    .default(true),
            )
            .attr(
                "admin_full_name",
                Attribute::optional(AttrType::String).describe("Full name of the admin account."),
            )
            .attr(
                "admin_short_name",
                Attribute::optional(AttrType::String).describe("Short name of the admin account."),
            )
            .attr(
                "hidden_admin",
                Attribute::optional(AttrType::Bool)
                    .describe("Hide the admin account.")
                    .default(true),
            )
            .attr(
                "admin_password_complexity",
                Attribute::optional(AttrType::Int)
                    .describe("Complexity of the generated admin password.")
                    .default(3)
                    .validate(Validator::IntBetween(1, 3)),
            )
            .attr(
                "admin_password_rotation_delay",
                Attribute::optional(AttrType::Int)
                    .describe("Delay, in minutes, after which the admin password is rotated. 0 disables it.")
                    .default(60)
                    .validate(Validator::IntBetween(0, 10080)),
            )
            .attr(
                "allow_pairing",
                Attribute::optional(AttrType::Bool)
                    .describe("Allow pairing.")
                    .default(false),
            )
            .attr(
                "auto_advance_setup",
                Attribute::optional(AttrType::Bool)
                    .describe("Automatically advance through the setup assistant.")
                    .default(false),
            )
            .attr(
                "await_device_configured",
                Attribute::optional(AttrType::Bool)
                    .describe("Hold the device in the setup assistant until it is configured.")
                    .default(false),
            )
            .attr(
                "department",
                Attribute::optional(AttrType::String)
                    .describe("Department displayed during the setup assistant.")
                    .default(""),
            )
            .attr(
                "is_mandatory",
                Attribute::optional(AttrType::Bool)
                    .describe("The user cannot skip the enrollment.")
                    .default(true),
            )
            .attr(
                "is_mdm_removable",
                Attribute::optional(AttrType::Bool)
                    .describe("The user can remove the MDM profile.")
                    .default(false),
            )
            .attr(
                "is_multi_user",
                Attribute::optional(AttrType::Bool)
                    .describe("Shared iPad mode.")
                    .default(true),
            )
            .attr(
                "is_supervised",
                Attribute::optional(AttrType::Bool)
                    .describe("The devices are supervised.")
                    .default(true),
            )
            .attr(
                "language",
                Attribute::optional(AttrType::String)
                    .describe("Language of the setup assistant.")
                    .default(""),
            )
            .attr(
                "org_magic",
                Attribute::optional(AttrType::String)
                    .describe("Organization magic string.")
                    .default(""),
            )
            .attr(
                "region",
                Attribute::optional(AttrType::String)
                    .describe("Region of the setup assistant.")
                    .default(""),
            )
            .attr("skip_setup_items", schema::string_set("Setup assistant panes to skip."))
            .attr(
                "support_email_address",
                Attribute::optional(AttrType::String)
                    .describe("Support email address.")
                    .default(""),
            )
            .attr(
                "support_phone_number",
                Attribute::optional(AttrType::String)
                    .describe("Support phone number.")
                    .default(""),
            )
            .attr(
                "include_tls_certificates",
                Attribute::optional(AttrType::Bool)
                    .describe("Include the TLS certificates in the enrollment profile.")
                    .default(false),
            )
            .attr("ios_max_version", os_version("Maximum iOS version allowed to enroll."))
            .attr("ios_min_version", os_version("Minimum iOS version required to enroll."))
            .attr("macos_max_version", os_version("Maximum macOS version allowed to enroll."))
            .attr("macos_min_version", os_version("Minimum macOS version required to enroll.")),
    )
}

fn ota_enrollment() -> EntityDef {
    EntityDef::resource(
        "mdm_ota_enrollment",
        "MDM OTA enrollment",
        "/mdm/ota_enrollments/",
        KeyKind::Int,
    )
    .describe("Manages MDM over-the-air enrollments.")
    .block(
        enrollment_base().attr(
            "realm_uuid",
            Attribute::optional(AttrType::String)
                .describe("UUID of the realm used to authenticate the users.")
                .wire_name("realm"),
        ),
    )
}

fn user_enrollment() -> EntityDef {
    EntityDef::resource(
        "mdm_user_enrollment",
        "MDM user enrollment",
        "/mdm/user_enrollments/",
        KeyKind::Int,
    )
    .describe("Manages MDM user enrollments.")
    .block(
        enrollment_base().attr(
            "realm_uuid",
            Attribute::required(AttrType::String)
                .describe("UUID of the realm used to authenticate the users.")
                .wire_name("realm"),
        ),
    )
}

fn enrollment_custom_view() -> EntityDef {
    EntityDef::resource(
        "mdm_enrollment_custom_view",
        "MDM enrollment custom view",
        "/mdm/enrollment_custom_views/",
        KeyKind::Uuid,
    )
    .describe("Manages MDM enrollment custom views.")
    .block(
        Block::new()
            .attr("id", schema::uuid_id())
            .attr("name", Attribute::required(AttrType::String).describe("Name of the custom view."))
            .attr(
                "description",
                Attribute::optional(AttrType::String)
                    .describe("Description of the custom view.")
                    .default(""),
            )
            .attr(
                "html",
                Attribute::optional_computed(AttrType::String).describe("HTML template of the custom view."),
            )
            .attr(
                "html_file",
                Attribute::optional(AttrType::String)
                    .describe("Path to a file containing the HTML template of the custom view.")
                    .local(),
            )
            .attr(
                "requires_authentication",
                Attribute::optional(AttrType::Bool)
                    .describe("The view requires an authenticated user.")
                    .default(false),
            )
            .constraint(Constraint::ExactlyOneOf(vec!["html", "html_file"])),
    )
    .codec(CustomViewCodec)
}
