//! Benchmark for the value translation layer
//!
//! Plan, encode and decode of the largest catalog entries.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use serde_json::{json, Value as Json};
use std::sync::Arc;
use zentral_provider::schema::plan_resource_change;
use zentral_provider::{Catalog, EntityDef, Value};

fn entity(type_name: &str) -> Arc<EntityDef> {
    Catalog::zentral()
        .get(type_name)
        .cloned()
        .expect("catalog entity")
}

fn santa_rule() -> (Arc<EntityDef>, Value) {
    let def = entity("zentral_santa_rule");
    let mut config = def.block.null_object();
    config.set("configuration_id", Value::Int(1));
    config.set("policy", Value::from("BLOCKLIST"));
    config.set("target_type", Value::from("SIGNINGID"));
    config.set("target_identifier", Value::from("platform:com.apple.curl"));
    config.set("primary_users", Value::string_set(["un", "deux"]));
    config.set("serial_numbers", Value::string_set((0..100).map(|i| format!("C02{:06}", i))));
    config.set("tag_ids", Value::int_set(1..20));
    let planned = plan_resource_change(&def.block, None, &config).planned;
    (def, planned)
}

fn http_store() -> (Arc<EntityDef>, Value) {
    let def = entity("zentral_store");
    let mut config = def.block.null_object();
    config.set("name", Value::from("HTTP"));
    config.set("backend", Value::from("HTTP"));
    config.set(
        "http",
        Value::object([
            ("endpoint_url", Value::from("https://events.example.com/post")),
            ("username", Value::from("yolo")),
            ("password", Value::from("fomo")),
        ]),
    );
    let planned = plan_resource_change(&def.block, None, &config).planned;
    (def, planned)
}

fn response(def: &EntityDef, planned: &Value, id: Json) -> Json {
    let mut record = def.codec.encode(&def.block, planned).expect("encode");
    record.insert("id".into(), id);
    if def.versioned {
        record.insert("version".into(), json!(1));
    }
    Json::Object(record)
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate");
    group.throughput(Throughput::Elements(1));

    let (rule, rule_plan) = santa_rule();
    group.bench_function("encode_santa_rule", |b| {
        b.iter(|| rule.codec.encode(&rule.block, black_box(&rule_plan)))
    });

    let (store, store_plan) = http_store();
    group.bench_function("encode_store", |b| {
        b.iter(|| store.codec.encode(&store.block, black_box(&store_plan)))
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate");
    group.throughput(Throughput::Elements(1));

    let (rule, rule_plan) = santa_rule();
    let rule_response = response(&rule, &rule_plan, json!(12));
    group.bench_function("decode_santa_rule", |b| {
        b.iter(|| rule.codec.decode(&rule.block, black_box(&rule_response), &rule_plan))
    });

    let (store, store_plan) = http_store();
    let store_response = response(&store, &store_plan, json!("2b1c3a86-8b74-4b1e-b1c4-8c0b3f3d9e11"));
    group.bench_function("decode_store", |b| {
        b.iter(|| store.codec.decode(&store.block, black_box(&store_response), &store_plan))
    });

    group.finish();
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate");
    group.throughput(Throughput::Elements(1));

    let (rule, rule_plan) = santa_rule();
    group.bench_function("plan_santa_rule_update", |b| {
        let mut prior = rule_plan.clone();
        prior.set("id", Value::Int(12));
        prior.set("version", Value::Int(1));
        b.iter(|| plan_resource_change(&rule.block, Some(&prior), black_box(&rule_plan)))
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_plan);
criterion_main!(benches);
