//! Engine semantics over in-memory stores.

use relata_engine::{EngineError, EntityEngine};
use relata_graph::GraphStore;
use relata_model::KindSpec;
use relata_store::DocumentStore;
use serde_json::json;
use std::sync::Arc;

fn nodes_engine() -> EntityEngine {
    let documents = Arc::new(DocumentStore::open_in_memory().unwrap());
    documents.ensure_table("nodes").unwrap();
    let graph = Arc::new(GraphStore::open_in_memory().unwrap());
    EntityEngine::new(KindSpec::new("nodes"), documents, graph)
}

#[test]
fn create_then_get_roundtrips_modulo_server_fields() {
    let engine = nodes_engine();
    let created = engine.create(r#"{"name":"a","rank":3}"#).unwrap();
    assert!(!created.id.is_empty());

    let loaded = engine.get_by_id(&created.id).unwrap();
    assert_eq!(loaded.id, created.id);
    assert_eq!(loaded.extended, created.extended);
}

#[test]
fn create_never_trusts_a_client_id() {
    let engine = nodes_engine();
    let created = engine.create(r#"{"id":"client-chosen","name":"a"}"#).unwrap();
    assert_ne!(created.id, "client-chosen");
}

#[test]
fn malformed_body_short_circuits_before_the_store() {
    let engine = nodes_engine();
    let err = engine.create("{not json").unwrap_err();

    match &err {
        EngineError::Decode { body, .. } => assert_eq!(body, "{not json"),
        other => panic!("expected decode error, got {other:?}"),
    }
    assert!(err.is_client_error());
    assert!(engine.get_all().unwrap().is_empty());
}

#[test]
fn replace_then_get_returns_the_latest_payload() {
    let engine = nodes_engine();
    let created = engine.create(r#"{"name":"a"}"#).unwrap();

    engine.replace(&created.id, r#"{"name":"b"}"#).unwrap();
    let loaded = engine.get_by_id(&created.id).unwrap();
    assert_eq!(loaded.get("name"), Some(&json!("b")));
}

#[test]
fn patch_is_a_full_overwrite() {
    // documented semantics: no field-level merge - omitted fields are wiped
    let engine = nodes_engine();
    let created = engine.create(r#"{"name":"a","rank":1}"#).unwrap();

    engine.patch(&created.id, r#"{"name":"b"}"#).unwrap();
    let loaded = engine.get_by_id(&created.id).unwrap();
    assert_eq!(loaded.get("name"), Some(&json!("b")));
    assert_eq!(loaded.get("rank"), None);
}

#[test]
fn timestamps_are_monotonic_across_writes() {
    let engine = nodes_engine();
    let created = engine.create(r#"{"name":"a"}"#).unwrap();
    let replaced = engine.replace(&created.id, r#"{"name":"b"}"#).unwrap();
    assert!(replaced.timestamp >= created.timestamp);
}

#[test]
fn delete_returns_the_prior_state() {
    let engine = nodes_engine();
    let created = engine.create(r#"{"name":"a"}"#).unwrap();

    let prior = engine.delete(&created.id).unwrap();
    assert_eq!(prior.get("name"), Some(&json!("a")));

    let err = engine.get_by_id(&created.id).unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[test]
fn missing_id_is_not_found() {
    let engine = nodes_engine();
    let err = engine.get_by_id("nope").unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
    assert!(err.is_client_error());
}

#[test]
fn link_projection_carries_instance_and_properties() {
    let engine = nodes_engine();
    let a = engine.create(r#"{"name":"a"}"#).unwrap();
    let b = engine.create(r#"{"name":"b"}"#).unwrap();

    let annotated = engine
        .link_create(&a.id, &b.id, "ref", r#"{"weight":2}"#, &engine)
        .unwrap();
    let instance = annotated.get("instance").unwrap().as_str().unwrap().to_string();
    assert!(!instance.is_empty());

    let linked = engine.get_all_links(&a.id, &engine).unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].id, b.id);
    assert_eq!(linked[0].get("instance"), Some(&json!(instance)));
    assert_eq!(linked[0].get("weight"), Some(&json!(2)));
    assert!(linked[0].get("edge").is_some());
}

#[test]
fn link_projection_reflects_current_target_state() {
    let engine = nodes_engine();
    let a = engine.create(r#"{"name":"a"}"#).unwrap();
    let b = engine.create(r#"{"name":"b"}"#).unwrap();
    engine.link_create(&a.id, &b.id, "ref", "", &engine).unwrap();

    engine.replace(&b.id, r#"{"name":"renamed"}"#).unwrap();

    let linked = engine.get_all_links(&a.id, &engine).unwrap();
    assert_eq!(linked[0].get("name"), Some(&json!("renamed")));
}

#[test]
fn update_link_churns_the_instance() {
    let engine = nodes_engine();
    let a = engine.create(r#"{"name":"a"}"#).unwrap();
    let b = engine.create(r#"{"name":"b"}"#).unwrap();

    let created = engine.link_create(&a.id, &b.id, "ref", "", &engine).unwrap();
    let first = created.get("instance").unwrap().as_str().unwrap().to_string();

    // logically the same relationship, addressed by its instance - but
    // the delete+recreate design mints a new handle on every update
    let updated = engine
        .link_update(&a.id, &b.id, "ref", r#"{"weight":9}"#, &first, &engine)
        .unwrap();
    let second = updated.get("instance").unwrap().as_str().unwrap().to_string();
    assert_ne!(first, second);

    let linked = engine.get_all_links(&a.id, &engine).unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].get("instance"), Some(&json!(second)));
    assert_eq!(linked[0].get("weight"), Some(&json!(9)));
}

#[test]
fn delete_link_removes_exactly_the_addressed_edge() {
    let engine = nodes_engine();
    let a = engine.create(r#"{"name":"a"}"#).unwrap();
    let b = engine.create(r#"{"name":"b"}"#).unwrap();

    let first = engine
        .link_create(&a.id, &b.id, "ref", "", &engine)
        .unwrap()
        .get("instance")
        .unwrap()
        .as_str()
        .unwrap()
        .to_string();
    let second = engine
        .link_create(&a.id, &b.id, "ref", "", &engine)
        .unwrap()
        .get("instance")
        .unwrap()
        .as_str()
        .unwrap()
        .to_string();

    let removed = engine.delete_link(&first).unwrap();
    assert_eq!(removed.unwrap().instance, first);

    // the other edge between the same pair survives
    let linked = engine.get_all_links(&a.id, &engine).unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].get("instance"), Some(&json!(second)));
}

#[test]
fn link_delete_requires_both_endpoints() {
    let engine = nodes_engine();
    let a = engine.create(r#"{"name":"a"}"#).unwrap();
    let b = engine.create(r#"{"name":"b"}"#).unwrap();

    let instance = engine
        .link_create(&a.id, &b.id, "ref", "", &engine)
        .unwrap()
        .get("instance")
        .unwrap()
        .as_str()
        .unwrap()
        .to_string();

    let err = engine
        .link_delete("nope", &b.id, &instance, &engine)
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));

    let removed = engine.link_delete(&a.id, &b.id, &instance, &engine).unwrap();
    assert_eq!(removed.unwrap().instance, instance);
    assert!(engine.get_all_links(&a.id, &engine).unwrap().is_empty());
}

#[test]
fn delete_link_is_a_noop_for_unknown_instances() {
    let engine = nodes_engine();
    assert!(engine.delete_link("missing").unwrap().is_none());
}

#[test]
fn dangling_link_targets_are_skipped() {
    let engine = nodes_engine();
    let a = engine.create(r#"{"name":"a"}"#).unwrap();
    let b = engine.create(r#"{"name":"b"}"#).unwrap();
    engine.link_create(&a.id, &b.id, "ref", "", &engine).unwrap();

    // no cross-store transaction: deleting the entity leaves the edge
    engine.delete(&b.id).unwrap();

    let linked = engine.get_all_links(&a.id, &engine).unwrap();
    assert!(linked.is_empty());
}

#[test]
fn tasks_dispatch_by_name() {
    let engine = nodes_engine();
    engine.register_task("echo", |body| Ok(json!({ "echo": body })));

    let result = engine.run_task("echo", "payload").unwrap();
    assert_eq!(result, json!({ "echo": "payload" }));

    let err = engine.run_task("missing", "").unwrap_err();
    assert!(matches!(err, EngineError::TaskNotFound { .. }));
    assert!(err.is_client_error());
}

#[test]
fn nodes_scenario_end_to_end() {
    let engine = nodes_engine();

    // POST /api/nodes {"name":"a"} -> 201 {id:U1, name:"a"}
    let u1 = engine.create(r#"{"name":"a"}"#).unwrap();
    // GET /api/nodes/U1 -> 200 {id:U1, name:"a"}
    let loaded = engine.get_by_id(&u1.id).unwrap();
    assert_eq!(loaded.get("name"), Some(&json!("a")));

    let u2 = engine.create(r#"{"name":"z"}"#).unwrap();

    // POST /api/nodes/U1/ref/U2 -> instance I1
    let annotated = engine.link_create(&u1.id, &u2.id, "ref", "", &engine).unwrap();
    let i1 = annotated.get("instance").unwrap().as_str().unwrap().to_string();

    // GET /api/nodes/U1/ref -> [U2 with instance I1]
    let linked = engine.get_all_links(&u1.id, &engine).unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].id, u2.id);
    assert_eq!(linked[0].get("instance"), Some(&json!(i1)));

    // DELETE instance I1, then the listing is empty
    engine.delete_link(&i1).unwrap();
    assert!(engine.get_all_links(&u1.id, &engine).unwrap().is_empty());
}
