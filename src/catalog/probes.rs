//! Probes and probe actions

use super::{EntityDef, Lookup};
use crate::client::KeyKind;
use crate::schema::{self, AttrType, Attribute, Block, Validator};
use crate::translate::records::{self, BackendUnion, BackendVariant};
use crate::translate::BackendCodec;

pub const INCIDENT_SEVERITIES: &[i64] = &[100, 200, 300];

pub fn entities() -> Vec<EntityDef> {
    vec![probe(), probe_action()]
}

fn probe() -> EntityDef {
    EntityDef::resource("probe", "probe", "/probes/probes/", KeyKind::Int)
        .describe("Manages probes.")
        .block(
            Block::new()
                .attr("id", schema::int_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the probe."))
                .attr(
                    "description",
                    Attribute::optional(AttrType::String)
                        .describe("Description of the probe.")
                        .default(""),
                )
                .attr(
                    "active",
                    Attribute::optional(AttrType::Bool)
                        .describe("If the probe is active.")
                        .default(true),
                )
                .merge(records::probe_filters())
                .attr(
                    "incident_severity",
                    Attribute::optional(AttrType::Int)
                        .describe("Severity of the incidents opened by the probe. Null disables them.")
                        .validate(Validator::IntOneOf(INCIDENT_SEVERITIES)),
                )
                .attr(
                    "action_ids",
                    schema::string_set("IDs of the actions triggered by the probe.").wire_name("actions"),
                ),
        )
}

pub fn probe_action_union() -> BackendUnion {
    BackendUnion::new(
        "backend",
        vec![
            BackendVariant {
                name: "HTTP_POST",
                attribute: Some("http_post"),
            },
            BackendVariant {
                name: "SLACK_INCOMING_WEBHOOK",
                attribute: Some("slack_incoming_webhook"),
            },
        ],
    )
}

fn probe_action() -> EntityDef {
    let union = probe_action_union();
    let http_post = Block::new()
        .attr("url", Attribute::required(AttrType::String).describe("URL the events are posted to."))
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
            "cel_transformation",
            Attribute::optional(AttrType::String).describe("CEL expression used to transform the events."),
        );
    let slack = Block::new().attr(
        "url",
        Attribute::required(AttrType::String)
            .describe("Slack incoming webhook URL.")
            .sensitive(),
    );

    EntityDef::resource("probe_action", "probe action", "/probes/actions/", KeyKind::Uuid)
        .describe("Manages probe actions.")
        .block(
            Block::new()
                .attr("id", schema::uuid_id())
                .attr("name", Attribute::required(AttrType::String).describe("Name of the action."))
                .attr(
                    "description",
                    Attribute::optional(AttrType::String)
                        .describe("Description of the action.")
                        .default(""),
                )
                .attr(
                    "backend",
                    union.discriminator_attribute("Backend of the action: HTTP_POST or SLACK_INCOMING_WEBHOOK."),
                )
                .attr(
                    "http_post",
                    Attribute::optional(http_post.into_type()).describe("HTTP POST backend parameters."),
                )
                .attr(
                    "slack_incoming_webhook",
                    Attribute::optional(slack.into_type()).describe("Slack incoming webhook backend parameters."),
                ),
        )
        .codec(BackendCodec::new(union))
        .data_source(Lookup::id_or_name())
}
