//! Event stores

use super::{EntityDef, Lookup};
use crate::client::KeyKind;
use crate::domain::value::Value;
use crate::schema::{self, AttrType, Attribute, Block, Validator};
use crate::translate::records::{self, BackendUnion, BackendVariant};
use crate::translate::BackendCodec;

pub fn entities() -> Vec<EntityDef> {
    vec![store()]
}

pub fn store_union() -> BackendUnion {
    BackendUnion::new(
        "backend",
        vec![
            BackendVariant {
                name: "HTTP",
                attribute: Some("http"),
            },
            BackendVariant {
                name: "SPLUNK",
                attribute: Some("splunk"),
            },
        ],
    )
}

fn http_backend() -> Block {
    Block::new()
        .attr(
            "endpoint_url",
            Attribute::required(AttrType::String).describe("URL the events are posted to."),
        )
        .attr(
            "verify_tls",
            Attribute::optional(AttrType::Bool)
                .describe("Verify the TLS certificate of the endpoint.")
                .default(true),
        )
        .attr(
            "username",
            Attribute::optional(AttrType::String).describe("Username for the basic authentication."),
        )
        .attr(
            "password",
            Attribute::optional(AttrType::String)
                .describe("Password for the basic authentication.")
                .sensitive(),
        )
        .attr("headers", records::http_headers("HTTP headers added to the requests."))
        .attr(
            "concurrency",
            Attribute::optional(AttrType::Int)
                .describe("Number of concurrent requests.")
                .default(1)
                .validate(Validator::IntBetween(1, 20)),
        )
        .attr(
            "request_timeout",
            Attribute::optional(AttrType::Int)
                .describe("Request timeout in seconds.")
                .default(120)
                .validate(Validator::IntBetween(1, 600)),
        )
        .attr(
            "max_retries",
            Attribute::optional(AttrType::Int)
                .describe("Maximum number of retries.")
                .default(3)
                .validate(Validator::IntBetween(1, 5)),
        )
}

fn splunk_backend() -> Block {
    Block::new()
        // HEC
        .attr("hec_url", Attribute::required(AttrType::String).describe("HTTP event collector URL."))
        .attr(
            "hec_token",
            Attribute::required(AttrType::String)
                .describe("HTTP event collector token.")
                .sensitive(),
        )
        .attr(
            "hec_extra_headers",
            records::http_headers("Extra headers added to the HTTP event collector requests."),
        )
        .attr(
            "hec_request_timeout",
            Attribute::optional(AttrType::Int)
                .describe("HTTP event collector request timeout in seconds.")
                .default(300)
                .validate(Validator::IntBetween(1, 3600)),
        )
        .attr("hec_index", Attribute::optional(AttrType::String).describe("Index of the events."))
        .attr("hec_source", Attribute::optional(AttrType::String).describe("Source of the events."))
        .attr(
            "computer_name_as_host_sources",
            Attribute::optional(AttrType::string_list())
                .describe("Inventory sources used to get the computer name used as host.")
                .default(Value::List(Vec::new())),
        )
        .attr(
            "custom_host_field",
            Attribute::optional(AttrType::String).describe("Event field used as host."),
        )
        .attr(
            "serial_number_field",
            Attribute::optional(AttrType::String)
                .describe("Name of the serial number field.")
                .default("machine_serial_number"),
        )
        .attr(
            "batch_size",
            Attribute::optional(AttrType::Int)
                .describe("Number of events sent in a single request.")
                .default(1)
                .validate(Validator::IntBetween(1, 100)),
        )
        .attr(
            "verify_tls",
            Attribute::optional(AttrType::Bool)
                .describe("Verify the TLS certificates.")
                .default(true),
        )
        // Search
        .attr(
            "search_app_url",
            Attribute::optional(AttrType::String).describe("Splunk search app URL."),
        )
        .attr("search_url", Attribute::optional(AttrType::String).describe("Splunk search API URL."))
        .attr(
            "search_token",
            Attribute::optional(AttrType::String)
                .describe("Splunk search API token.")
                .sensitive(),
        )
        .attr(
            "search_extra_headers",
            records::http_headers("Extra headers added to the search requests."),
        )
        .attr(
            "search_index",
            Attribute::optional(AttrType::String).describe("Index used in the search queries."),
        )
        .attr(
            "search_source",
            Attribute::optional(AttrType::String).describe("Source used in the search queries."),
        )
        .attr(
            "search_timeout",
            Attribute::optional(AttrType::Int)
                .describe("Search request timeout in seconds.")
                .default(300)
                .validate(Validator::IntBetween(1, 3600)),
        )
}

fn store() -> EntityDef {
    let union = store_union();
    EntityDef::resource("store", "store", "/stores/stores/", KeyKind::Uuid)
        .describe("Manages event stores.")
        .block(
            Block::new()
                .attr("id", schema::uuid_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the store."))
                .attr(
                    "description",
                    Attribute::optional(AttrType::String)
                        .describe("Description of the store.")
                        .default(""),
                )
                .attr(
                    "admin_console",
                    Attribute::optional(AttrType::Bool)
                        .describe("The store is used in the admin console.")
                        .default(false),
                )
                .attr(
                    "event_filters",
                    records::event_filter_set("Filters selecting the events sent to the store."),
                )
                .attr(
                    "events_url_authorized_role_ids",
                    schema::tag_ids("IDs of the roles allowed to see the store event links.")
                        .wire_name("events_url_authorized_roles"),
                )
                .attr("backend", union.discriminator_attribute("Backend of the store: HTTP or SPLUNK."))
                .attr(
                    "http",
                    Attribute::optional(http_backend().into_type()).describe("HTTP backend parameters."),
                )
                .attr(
                    "splunk",
                    Attribute::optional(splunk_backend().into_type()).describe("Splunk backend parameters."),
                ),
        )
        .codec(BackendCodec::new(union))
        .data_source(Lookup::id_or_name())
}
