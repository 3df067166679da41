//! End-to-end compile runs over small documents.

use asyncgen_core::{
    compile_bundle, compile_document, render, CompileError, CompileOptions, Document,
    EntityOptions, InMemoryProvider, ObjectKind, ProtocolRegistry, RenderedModel, Renderer,
};
use serde_json::{json, Value};

fn doc(value: Value) -> Document {
    Document::from_value(value).unwrap()
}

fn compile(value: Value) -> Result<RenderedModel, CompileError> {
    compile_with(value, &CompileOptions::default())
}

fn compile_with(value: Value, options: &CompileOptions) -> Result<RenderedModel, CompileError> {
    let out = compile_document(&doc(value), options, &ProtocolRegistry::default())?;
    Ok(render(&out.model))
}

fn identities(model: &RenderedModel) -> Vec<&str> {
    model
        .declarations
        .iter()
        .map(|d| d.identity.as_str())
        .collect()
}

fn use_of(identity: &str) -> Value {
    json!({ "$use": identity })
}

// ── Resolution ───────────────────────────────────────────────────────

#[test]
fn forward_reference_into_components() {
    let model = compile(json!({
        "channels": {
            "user/signedup": {
                "subscribe": { "message": { "$ref": "#/components/messages/UserSignedUp" } }
            }
        },
        "components": {
            "messages": {
                "UserSignedUp": { "payload": { "type": "string" } }
            }
        }
    }))
    .unwrap();

    let channel = model.declaration("#/channels/user~1signedup").unwrap();
    assert_eq!(channel.kind, "channel");
    assert_eq!(channel.definition["name"], "user/signedup");
    assert_eq!(
        channel.definition["subscribe"]["message"],
        use_of("#/components/messages/UserSignedUp")
    );
    assert!(model
        .declaration("#/components/messages/UserSignedUp")
        .is_some());
}

#[test]
fn reference_chain_resolves_to_the_end() {
    let model = compile(json!({
        "channels": {
            "a": { "publish": { "message": { "$ref": "#/components/messages/alias" } } }
        },
        "components": {
            "messages": {
                "alias": { "$ref": "#/components/messages/real" },
                "real": { "name": "Real" }
            }
        }
    }))
    .unwrap();

    let channel = model.declaration("#/channels/a").unwrap();
    assert_eq!(
        channel.definition["publish"]["message"],
        use_of("#/components/messages/real")
    );
}

#[test]
fn reference_cycle_is_reported_with_its_chain() {
    let err = compile(json!({
        "components": {
            "messages": {
                "a": { "$ref": "#/components/messages/b" },
                "b": { "$ref": "#/components/messages/a" }
            }
        }
    }))
    .unwrap_err();

    match err {
        CompileError::ReferenceCycle { path, chain } => {
            assert_eq!(path, "#/components/messages/a");
            assert_eq!(
                chain,
                [
                    "#/components/messages/b",
                    "#/components/messages/a",
                    "#/components/messages/b"
                ]
            );
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[test]
fn dangling_reference_names_the_referring_location() {
    let err = compile(json!({
        "channels": {
            "a": { "publish": { "message": { "$ref": "#/components/messages/missing" } } }
        }
    }))
    .unwrap_err();

    assert_eq!(err.pass(), 3);
    assert_eq!(
        err,
        CompileError::UnresolvedReference {
            path: "#/channels/a/publish/message".to_owned(),
            reference: "#/components/messages/missing".to_owned(),
        }
    );
}

#[test]
fn malformed_reference_fails_the_walk() {
    let err = compile(json!({
        "components": { "messages": { "m": { "$ref": "#components/messages/x" } } }
    }))
    .unwrap_err();
    assert!(matches!(err, CompileError::MalformedReference { .. }));
    assert_eq!(err.path(), "#/components/messages/m");
}

// ── Rendering ────────────────────────────────────────────────────────

#[test]
fn shared_message_is_declared_once_and_used_everywhere() {
    let model = compile(json!({
        "channels": {
            "a": { "publish": { "message": { "$ref": "#/components/messages/shared" } } },
            "b": { "subscribe": { "message": { "$ref": "#/components/messages/shared" } } }
        },
        "components": {
            "messages": { "shared": { "payload": { "type": "integer" } } }
        }
    }))
    .unwrap();

    let declared = identities(&model)
        .into_iter()
        .filter(|id| *id == "#/components/messages/shared")
        .count();
    assert_eq!(declared, 1);

    let a = model.declaration("#/channels/a").unwrap();
    let b = model.declaration("#/channels/b").unwrap();
    assert_eq!(a.definition["publish"]["message"], use_of("#/components/messages/shared"));
    assert_eq!(b.definition["subscribe"]["message"], use_of("#/components/messages/shared"));
}

#[test]
fn message_index_lists_messages_in_registration_order() {
    let model = compile(json!({
        "channels": {
            "a": { "publish": { "message": { "payload": { "type": "string" } } } }
        },
        "components": {
            "messages": {
                "first": {},
                "second": {},
                "skipped": { "x-ignore": true }
            }
        }
    }))
    .unwrap();

    let index = model.declaration("#/$messages").unwrap();
    assert_eq!(index.kind, "message_index");
    assert_eq!(
        index.definition["messages"],
        json!([
            use_of("#/channels/a/publish/message"),
            use_of("#/components/messages/first"),
            use_of("#/components/messages/second"),
        ])
    );
}

#[test]
fn inline_schemas_are_rendered_in_place() {
    let model = compile(json!({
        "components": {
            "messages": {
                "lightMeasured": {
                    "payload": {
                        "type": "object",
                        "required": ["lumens"],
                        "properties": {
                            "lumens": { "type": "integer", "minimum": 0 },
                            "sentAt": { "$ref": "#/components/schemas/sentAt" }
                        }
                    }
                }
            },
            "schemas": {
                "sentAt": { "type": "string", "format": "date-time" }
            }
        }
    }))
    .unwrap();

    let message = model.declaration("#/components/messages/lightMeasured").unwrap();
    let fields = &message.definition["payload"]["type"]["object"];
    assert_eq!(fields["lumens"]["required"], true);
    assert_eq!(fields["lumens"]["type"]["type"]["simple"], "integer");
    assert_eq!(fields["sentAt"]["type"], use_of("#/components/schemas/sentAt"));
    assert!(model.declaration("#/components/schemas/sentAt").is_some());
}

#[test]
fn ignored_entities_render_nothing() {
    let model = compile(json!({
        "servers": {
            "dev": { "url": "localhost:9092", "protocol": "kafka", "x-ignore": true }
        },
        "channels": {
            "hidden": { "x-ignore": true, "publish": { "message": { "$ref": "#/nowhere/x" } } },
            "shown": { "publish": { "message": { "x-ignore": true } } }
        }
    }))
    .unwrap();

    assert!(model.declaration("#/servers/dev").is_none());
    assert!(model.declaration("#/channels/hidden").is_none());
    assert!(model.protocols.is_empty());
    let shown = model.declaration("#/channels/shown").unwrap();
    assert_eq!(shown.definition["publish"]["message"], Value::Null);
}

#[test]
fn render_counts_definitions_and_usages() {
    let model = compile(json!({
        "channels": {
            "a": { "publish": { "message": { "$ref": "#/components/messages/m" } } },
            "b": { "publish": { "message": { "$ref": "#/components/messages/m" } } }
        },
        "components": { "messages": { "m": {} } }
    }))
    .unwrap();

    // Two channels, one message, the message index.
    assert_eq!(model.definitions_rendered, model.declarations.len());
    assert_eq!(model.declarations.len(), 4);
    assert!(model.usages_rendered >= 3);
}

fn count_uses(fragment: &Value, identity: &str) -> usize {
    match fragment {
        Value::Object(map) if map.len() == 1 && map.get("$use") == Some(&json!(identity)) => 1,
        Value::Object(map) => map.values().map(|v| count_uses(v, identity)).sum(),
        Value::Array(items) => items.iter().map(|v| count_uses(v, identity)).sum(),
        _ => 0,
    }
}

#[test]
fn shared_message_has_one_definition_and_one_use_per_site() {
    let model = compile(json!({
        "channels": {
            "a": { "publish": { "message": { "$ref": "#/components/messages/m" } } },
            "b": { "publish": { "message": { "$ref": "#/components/messages/m" } } },
            "c": { "subscribe": { "message": { "$ref": "#/components/messages/m" } } }
        },
        "components": { "messages": { "m": {} } }
    }))
    .unwrap();

    let definitions = identities(&model)
        .into_iter()
        .filter(|id| *id == "#/components/messages/m")
        .count();
    assert_eq!(definitions, 1);

    // Three channels plus the message index.
    let uses: usize = model
        .declarations
        .iter()
        .map(|d| count_uses(&d.definition, "#/components/messages/m"))
        .sum();
    assert_eq!(uses, 4);
}

// ── Servers and protocols ────────────────────────────────────────────

#[test]
fn servers_bind_active_channels_and_collect_protocols() {
    let model = compile(json!({
        "servers": {
            "prod": { "url": "broker:9092", "protocol": "kafka" },
            "edge": { "url": "mqtt://edge", "protocol": "mqtt" }
        },
        "channels": {
            "events": { "servers": ["prod"] },
            "telemetry": {}
        }
    }))
    .unwrap();

    assert_eq!(model.protocols, ["kafka", "mqtt"]);

    let prod = model.declaration("#/servers/prod").unwrap();
    assert_eq!(
        prod.definition["channels"],
        json!([use_of("#/channels/events"), use_of("#/channels/telemetry")])
    );
    assert_eq!(prod.definition["protocolServer"]["protocol"], "kafka");

    let edge = model.declaration("#/servers/edge").unwrap();
    assert_eq!(edge.definition["channels"], json!([use_of("#/channels/telemetry")]));

    let telemetry = model.declaration("#/channels/telemetry").unwrap();
    let protocols: Vec<&Value> = telemetry.definition["protocolChannels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| &p["protocol"])
        .collect();
    assert_eq!(protocols, [&json!("kafka"), &json!("mqtt")]);

    let names: Vec<&str> = model.active_channels.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["events", "telemetry"]);
}

#[test]
fn server_reference_declares_the_component_server() {
    let model = compile(json!({
        "servers": { "prod": { "$ref": "#/components/servers/kafkaProd" } },
        "components": {
            "servers": {
                "kafkaProd": { "url": "broker:9092", "protocol": "kafka" },
                "unused": { "url": "broker:9093", "protocol": "kafka" }
            }
        }
    }))
    .unwrap();

    let ids = identities(&model);
    assert!(ids.contains(&"#/components/servers/kafkaProd"));
    assert!(!ids.contains(&"#/components/servers/unused"));
}

#[test]
fn unknown_protocol_is_a_warning() {
    let out = compile_document(
        &doc(json!({
            "servers": { "x": { "url": "nats://x", "protocol": "nats" } },
            "channels": {
                "c": { "bindings": { "nats": { "queue": "q" } } }
            }
        })),
        &CompileOptions::default(),
        &ProtocolRegistry::default(),
    )
    .unwrap();

    assert_eq!(out.diagnostics.len(), 2);
    assert_eq!(out.diagnostics[0].path, "#/servers/x");
    assert_eq!(out.diagnostics[0].protocol.as_deref(), Some("nats"));
    assert_eq!(out.diagnostics[1].path, "#/channels/c/bindings");

    let model = render(&out.model);
    let server = model.declaration("#/servers/x").unwrap();
    assert_eq!(server.definition["protocolServer"], Value::Null);
    assert!(model.protocols.is_empty());
}

#[test]
fn server_variable_default_outside_enum_only_warns() {
    let out = compile_document(
        &doc(json!({
            "servers": {
                "prod": {
                    "url": "{host}:9092",
                    "protocol": "kafka",
                    "variables": { "host": { "enum": ["a", "b"], "default": "c" } }
                }
            }
        })),
        &CompileOptions::default(),
        &ProtocolRegistry::default(),
    )
    .unwrap();

    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].path, "#/servers/prod/variables/host");

    let model = render(&out.model);
    let prod = model.declaration("#/servers/prod").unwrap();
    let host = &prod.definition["variables"]["host"];
    assert_eq!(host["default"], "c");
    assert_eq!(host["enum"], json!(["a", "b"]));
}

// ── Bindings ─────────────────────────────────────────────────────────

#[test]
fn channel_bindings_are_decoded_by_the_protocol_builder() {
    let model = compile(json!({
        "channels": {
            "orders": { "bindings": { "kafka": { "topic": "orders.v1", "partitions": 3 } } }
        }
    }))
    .unwrap();

    let channel = model.declaration("#/channels/orders").unwrap();
    let bindings = &channel.definition["bindings"];
    assert_eq!(bindings["bindingsKind"], "channel");
    assert_eq!(bindings["values"]["kafka"]["topic"], "orders.v1");
    assert_eq!(bindings["values"]["kafka"]["partitions"], 3);
}

#[test]
fn invalid_binding_payload_is_a_binding_error() {
    let err = compile(json!({
        "channels": {
            "orders": { "bindings": { "kafka": { "partitions": "three" } } }
        }
    }))
    .unwrap_err();
    assert_eq!(err.protocol(), Some("kafka"));
    assert_eq!(err.path(), "#/channels/orders/bindings");
}

#[test]
fn component_bindings_are_declared() {
    let model = compile(json!({
        "channels": {
            "orders": {
                "publish": { "bindings": { "$ref": "#/components/operationBindings/grouped" } }
            }
        },
        "components": {
            "operationBindings": {
                "grouped": { "kafka": { "groupId": { "type": "string" } } }
            }
        }
    }))
    .unwrap();

    let bindings = model
        .declaration("#/components/operationBindings/grouped")
        .unwrap();
    assert_eq!(bindings.definition["schemas"]["kafka"]["groupId"]["type"], "string");
    let channel = model.declaration("#/channels/orders").unwrap();
    assert_eq!(
        channel.definition["publish"]["bindings"],
        use_of("#/components/operationBindings/grouped")
    );
}

// ── Messages and correlation ids ─────────────────────────────────────

#[test]
fn content_type_falls_back_to_the_document_default() {
    let model = compile(json!({
        "defaultContentType": "application/json",
        "components": {
            "messages": {
                "plain": {},
                "binary": { "contentType": "application/octet-stream" }
            }
        }
    }))
    .unwrap();

    let plain = model.declaration("#/components/messages/plain").unwrap();
    let binary = model.declaration("#/components/messages/binary").unwrap();
    assert_eq!(plain.definition["contentType"], "application/json");
    assert_eq!(binary.definition["contentType"], "application/octet-stream");
    let index = model.declaration("#/$messages").unwrap();
    assert_eq!(index.definition["defaultContentType"], "application/json");
}

#[test]
fn correlation_id_location_is_split_into_field_and_path() {
    let model = compile(json!({
        "components": {
            "messages": {
                "m": { "correlationId": { "location": "$message.header#/meta/corr~1id" } }
            }
        }
    }))
    .unwrap();

    let message = model.declaration("#/components/messages/m").unwrap();
    let corr = &message.definition["correlationId"];
    assert_eq!(corr["field"], "headers");
    assert_eq!(corr["path"], json!(["meta", "corr/id"]));
}

#[test]
fn correlation_id_without_fragment_is_rejected() {
    let err = compile(json!({
        "components": {
            "correlationIds": { "broken": { "location": "$message.header" } }
        }
    }))
    .unwrap_err();
    assert_eq!(
        err,
        CompileError::Structural {
            path: "#/components/correlationIds/broken".to_owned(),
            message: "no fragment part in location".to_owned(),
        }
    );
}

// ── Options ──────────────────────────────────────────────────────────

#[test]
fn allow_list_turns_other_servers_into_placeholders() {
    let options = CompileOptions {
        servers: EntityOptions::allowing(["prod"]),
        ..CompileOptions::default()
    };
    let model = compile_with(
        json!({
            "servers": {
                "prod": { "url": "a", "protocol": "kafka" },
                "dev": { "url": "b", "protocol": "amqp" }
            }
        }),
        &options,
    )
    .unwrap();

    assert!(model.declaration("#/servers/prod").is_some());
    assert!(model.declaration("#/servers/dev").is_none());
    assert_eq!(model.protocols, ["kafka"]);
}

#[test]
fn disabled_messages_skip_the_index() {
    let options = CompileOptions {
        messages: EntityOptions::disabled(),
        ..CompileOptions::default()
    };
    let out = compile_document(
        &doc(json!({ "components": { "messages": { "m": {} } } })),
        &options,
        &ProtocolRegistry::default(),
    )
    .unwrap();

    assert!(out.model.lookup("#/$messages").is_none());
    let m = out.model.lookup("#/components/messages/m").unwrap();
    assert!(m.is_placeholder());
    assert_eq!(m.kind(), ObjectKind::Message);
}

#[test]
fn message_allow_list_applies_to_referenced_messages() {
    let options = CompileOptions {
        messages: EntityOptions::allowing(["lightMeasured"]),
        ..CompileOptions::default()
    };
    let model = compile_with(
        json!({
            "channels": {
                "light": {
                    "publish": { "message": { "$ref": "#/components/messages/lightMeasured" } },
                    "subscribe": { "message": { "$ref": "#/components/messages/debugDump" } }
                }
            },
            "components": {
                "messages": {
                    "lightMeasured": { "payload": { "type": "integer" } },
                    "debugDump": {}
                }
            }
        }),
        &options,
    )
    .unwrap();

    let channel = model.declaration("#/channels/light").unwrap();
    assert_eq!(
        channel.definition["publish"]["message"],
        use_of("#/components/messages/lightMeasured")
    );
    assert_eq!(channel.definition["subscribe"]["message"], Value::Null);
    assert!(model.declaration("#/components/messages/lightMeasured").is_some());
    assert!(model.declaration("#/components/messages/debugDump").is_none());
}

// ── Multiple documents ───────────────────────────────────────────────

#[test]
fn external_documents_are_loaded_on_demand() {
    let provider = InMemoryProvider::new()
        .with_document(
            "api.json",
            json!({
                "channels": {
                    "a": { "publish": { "message": { "$ref": "common.json#/components/messages/shared" } } }
                }
            })
            .to_string(),
        )
        .with_document(
            "common.json",
            json!({
                "components": {
                    "messages": {
                        "shared": { "payload": { "$ref": "#/components/schemas/body" } }
                    },
                    "schemas": { "body": { "type": "string" } }
                }
            })
            .to_string(),
        );

    let out = compile_bundle(
        &provider,
        "api.json",
        &CompileOptions::default(),
        &ProtocolRegistry::default(),
    )
    .unwrap();
    let model = render(&out.model);

    let channel = model.declaration("#/channels/a").unwrap();
    assert_eq!(
        channel.definition["publish"]["message"],
        use_of("common.json#/components/messages/shared")
    );
    let shared = model
        .declaration("common.json#/components/messages/shared")
        .unwrap();
    assert_eq!(
        shared.definition["payload"],
        use_of("common.json#/components/schemas/body")
    );
}

#[test]
fn missing_external_document_is_a_load_error() {
    let provider = InMemoryProvider::new().with_document(
        "api.json",
        json!({
            "components": { "messages": { "m": { "$ref": "gone.json#/components/messages/x" } } }
        })
        .to_string(),
    );

    let err = compile_bundle(
        &provider,
        "api.json",
        &CompileOptions::default(),
        &ProtocolRegistry::default(),
    )
    .unwrap_err();
    match err {
        CompileError::Load { path, document, .. } => {
            assert_eq!(document, "gone.json");
            assert_eq!(path, "#/components/messages/m");
        }
        other => panic!("expected a load error, got {other:?}"),
    }
}


#[test]
fn external_servers_are_neither_declared_nor_counted() {
    let provider = InMemoryProvider::new()
        .with_document(
            "api.json",
            json!({
                "channels": {
                    "a": { "publish": { "message": { "$ref": "common.json#/components/messages/m" } } }
                }
            })
            .to_string(),
        )
        .with_document(
            "common.json",
            json!({
                "servers": { "ext": { "url": "amqp://ext", "protocol": "amqp" } },
                "components": { "messages": { "m": {} } }
            })
            .to_string(),
        );

    let out = compile_bundle(
        &provider,
        "api.json",
        &CompileOptions::default(),
        &ProtocolRegistry::default(),
    )
    .unwrap();
    let model = render(&out.model);

    assert!(model.protocols.is_empty());
    assert!(model.declaration("common.json#/servers/ext").is_none());
    assert!(model.declaration("common.json#/components/messages/m").is_some());
}
