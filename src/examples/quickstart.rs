//! Minimal OortDb client example
//!
//! Connects to a local deployment, loads two documents and runs one
//! similarity query.
//!
//! Run with: cargo run --example quickstart

use anyhow::Result;
use serde_json::json;

use oortdb_rs::{ApiImpl, Client, DocumentBatch, FindOptions, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    println!("OortDb Quickstart\n");

    let settings = Settings {
        api_impl: ApiImpl::Rest,
        server_host: "localhost".to_string(),
        server_port: Some(8000),
        server_ssl: false,
    };
    let client = Client::new(settings)?;

    println!("ping: {}", client.ping().await?);
    println!("✅ Connected\n");

    let cluster = client.get_or_create_cluster("quickstart").await?;

    cluster
        .add(
            DocumentBatch::new(["doc-1", "doc-2"])
                .with_documents([
                    "Rust is a systems programming language focused on safety and speed.",
                    "Vector databases retrieve data by semantic similarity.",
                ])
                .with_metadatas([
                    [("topic".to_string(), json!("rust"))].into(),
                    [("topic".to_string(), json!("databases"))].into(),
                ]),
        )
        .await?;
    println!("📝 Added {} documents", cluster.count().await?);

    let results = cluster
        .find(FindOptions::texts(["how does similarity search work?"]).n_results(2))
        .await?;

    println!("🔍 Matches:");
    for hit in results.flatten_first() {
        println!(
            "  {} (distance {:.4}): {:?}",
            hit.id, hit.distance, hit.document
        );
    }

    client.delete_cluster("quickstart").await?;
    Ok(())
}
