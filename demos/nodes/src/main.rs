//! Bootable relata demo.
//!
//! Registers a "nodes" entity kind, boots the application container
//! against two file-backed stores and walks one relationship through its
//! lifecycle: create two nodes, link them, list the link, replace it,
//! delete it.
//!
//! Run with: cargo run -p nodes_demo -- --document-db ./documents.db

use clap::Parser;
use relata_container::Container;
use relata_engine::beans::{
    DocumentStoreBean, EngineBean, GraphStoreBean, RegistryBean, DOCUMENT_STORE, GRAPH_STORE,
    KIND_REGISTRY,
};
use relata_engine::Settings;
use relata_model::{KindRegistry, KindSpec};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Demo application over the relata engine.
#[derive(Parser)]
#[command(name = "nodes_demo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path of the SQLite document store, created if absent
    #[arg(long, default_value = "./documents.db")]
    document_db: PathBuf,

    /// Path of the quad log, created if absent
    #[arg(long, default_value = "./links.db")]
    graph_db: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let settings = Settings::new()
        .document_path(cli.document_db)
        .graph_path(cli.graph_db);

    let mut registry = KindRegistry::new();
    registry.register(KindSpec::new("nodes"))?;

    let mut container = Container::new();
    container.register(KIND_REGISTRY, RegistryBean::new(registry))?;
    container.register(DOCUMENT_STORE, DocumentStoreBean::new(&settings.document_path))?;
    container.register(GRAPH_STORE, GraphStoreBean::new(&settings.graph_path))?;
    container.register(
        EngineBean::bean_name("nodes"),
        EngineBean::new("nodes").with_link("ref"),
    )?;
    container.boot()?;

    let engine = container
        .with_bean::<EngineBean, _>(&EngineBean::bean_name("nodes"), |b| b.engine())?
        .ok_or("nodes engine was not built")?;

    let table = container
        .with_bean::<EngineBean, _>(&EngineBean::bean_name("nodes"), |b| b.route_table())?;
    println!("routes:");
    for route in table.routes() {
        println!("  {} {}", route.method, route.path);
    }

    let a = engine.create(r#"{"name":"a"}"#)?;
    let b = engine.create(r#"{"name":"b"}"#)?;
    println!("created: {}", serde_json::to_string(&a)?);
    println!("created: {}", serde_json::to_string(&b)?);

    let annotated = engine.link_create(&a.id, &b.id, "ref", r#"{"weight":1}"#, &engine)?;
    let instance = annotated
        .get("instance")
        .and_then(|v| v.as_str())
        .ok_or("link was not annotated with an instance")?
        .to_string();
    println!("linked {} -> {} as {}", a.id, b.id, instance);

    let linked = engine.get_all_links(&a.id, &engine)?;
    println!("links of {}: {}", a.id, serde_json::to_string(&linked)?);

    let replaced = engine.link_update(&a.id, &b.id, "ref", r#"{"weight":2}"#, &instance, &engine)?;
    let fresh = replaced
        .get("instance")
        .and_then(|v| v.as_str())
        .ok_or("replaced link was not annotated")?
        .to_string();
    println!("replaced {instance} with {fresh}");

    engine.delete_link(&fresh)?;
    let remaining = engine.get_all_links(&a.id, &engine)?;
    println!("links after delete: {}", serde_json::to_string(&remaining)?);

    Ok(())
}
