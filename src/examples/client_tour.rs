//! OortDb remote client tour
//!
//! Exercises the full client surface against a hosted OortDb deployment:
//! waitlist signup, cluster lifecycle, document mutation, similarity search
//! and image ingestion. Each routine deletes the cluster it used so the
//! tour can be re-run against the same deployment.
//!
//! Run with: cargo run --example client_tour

use std::time::Instant;

use anyhow::Result;
use serde_json::json;
use uuid::Uuid;

use oortdb_rs::{
    ApiImpl, Client, ClientError, DocumentBatch, FindOptions, Metadata, Settings, UpdateBatch,
    Where, WhereDocument,
};

fn source(value: &str) -> Metadata {
    [("source".to_string(), json!(value))].into()
}

/// Email waitlist signup
async fn check_waitlist(client: &Client) -> Result<()> {
    let message = client.join_waitlist("example@gmail.com").await?;
    println!(">> {}", message);
    Ok(())
}

/// Create a cluster under a fresh name, then delete it
async fn create_and_delete(client: &Client) -> Result<()> {
    let name = Uuid::new_v4().to_string();
    println!("{}", name);

    let cluster = client.create_cluster(&name).await?;
    println!("cluster size {} mb", cluster.size_mb());

    client.delete_cluster(&name).await?;
    println!(">> create and delete done\n");
    Ok(())
}

/// Create, add and read back
async fn create_add_get(client: &Client) -> Result<()> {
    let cluster = client.get_or_create_cluster("testing").await?;

    cluster
        .add(
            DocumentBatch::new([Uuid::new_v4().to_string(), Uuid::new_v4().to_string()])
                .with_documents(["This is document1", "This is document2"])
                .with_metadatas([source("google"), source("notion")]),
        )
        .await?;

    println!("count of docs: {}", cluster.count().await?);

    let first = cluster.peek(1).await?;
    if !first.is_empty() {
        println!("got first record: {}", first.ids[0]);
    }

    client.delete_cluster("testing").await?;
    println!(">> create_add_get done\n");
    Ok(())
}

/// Create, add and query by text with metadata and content filters
async fn create_add_find(client: &Client) -> Result<()> {
    let cluster = client.get_or_create_cluster("testing").await?;

    cluster
        .add(
            DocumentBatch::new([
                Uuid::new_v4().to_string(),
                Uuid::new_v4().to_string(),
                Uuid::new_v4().to_string(),
            ])
            .with_documents(["This is document", "This is a note", "This is text"])
            .with_metadatas([source("notion"), source("notion"), source("google-doc")]),
        )
        .await?;

    let results = cluster
        .find(
            FindOptions::texts(["This"])
                .n_results(5)
                .where_metadata(Where::eq("source", "notion"))
                .where_document(WhereDocument::contains("is")),
        )
        .await?;

    for hit in results.flatten_first() {
        println!(
            "  {} (distance {:.4}): {:?}",
            hit.id, hit.distance, hit.document
        );
    }

    client.delete_cluster("testing").await?;
    println!(">> create_add_find done\n");
    Ok(())
}

/// Create, add raw embeddings and query by embedding
async fn create_add_find_embeddings(client: &Client) -> Result<()> {
    let cluster = client.get_or_create_cluster("testing_embeddings").await?;

    let embeddings = (0..8)
        .map(|n| {
            if n % 2 == 0 {
                vec![1.1, 2.3, 3.2]
            } else {
                vec![4.5, 6.9, 4.4]
            }
        })
        .collect::<Vec<_>>();
    let metadatas = (1..=8)
        .map(|n| {
            [
                ("uri".to_string(), json!(format!("img{}.png", n))),
                (
                    "style".to_string(),
                    json!(if n == 2 { "style2" } else { "style1" }),
                ),
            ]
            .into()
        })
        .collect::<Vec<Metadata>>();
    let documents = (1..=8).map(|n| format!("doc{}", n)).collect::<Vec<_>>();
    let ids = (1..=8).map(|n| format!("id{}", n)).collect::<Vec<_>>();

    let batch = DocumentBatch::new(ids)
        .with_documents(documents)
        .with_embeddings(embeddings)
        .with_metadatas(metadatas);

    // The fixed ids may survive an aborted earlier run; that is recoverable
    match cluster.add(batch).await {
        Ok(()) => {}
        Err(ClientError::Conflict { kind, name }) => {
            println!("add skipped, {} already exists: {}", kind, name);
        }
        Err(err) => return Err(err.into()),
    }

    let results = cluster
        .find(FindOptions::embeddings([vec![1.1, 2.3, 3.2]]).n_results(5))
        .await?;
    println!("find result: {} matches", results.flatten_first().len());

    client.delete_cluster("testing_embeddings").await?;
    println!(">> create_add_find_embeddings done\n");
    Ok(())
}

/// Create, rename, then patch metadata in place
async fn create_add_modify_update(client: &Client) -> Result<()> {
    let mut cluster = client.get_or_create_cluster("testing").await?;

    println!("Before: {}", cluster.name());
    match cluster.modify("new_testing").await {
        Ok(()) => {}
        Err(ClientError::Conflict { name, .. }) => {
            println!("rename skipped, name taken: {}", name);
        }
        Err(err) => return Err(err.into()),
    }
    println!("After: {}", cluster.name());

    cluster
        .add(
            DocumentBatch::new(["id1", "id2"])
                .with_documents(["This is document1", "This is document2"])
                .with_metadatas([source("notion"), source("google")]),
        )
        .await?;

    let ids = vec!["id1".to_string()];
    println!("Before update:");
    println!("{:?}", cluster.get(&ids).await?.metadatas);

    cluster
        .update(UpdateBatch::new(["id1"]).with_metadatas([source("google")]))
        .await?;

    println!("After update:");
    println!("{:?}", cluster.get(&ids).await?.metadatas);

    client.delete_cluster(cluster.name()).await?;
    println!(">> create_add_modify_update done\n");
    Ok(())
}

/// Insert, then insert-or-replace by id
async fn create_upsert(client: &Client) -> Result<()> {
    let cluster = client.get_or_create_cluster("testing").await?;

    match cluster
        .add(
            DocumentBatch::new(["id1", "id2"])
                .with_documents(["This is document1", "This is document2"])
                .with_metadatas([source("notion"), source("google")]),
        )
        .await
    {
        Ok(()) => {}
        Err(ClientError::Conflict { name, .. }) => {
            println!("add skipped, id exists: {}", name);
        }
        Err(err) => return Err(err.into()),
    }

    cluster
        .upsert(
            DocumentBatch::new(["id1", "id3"])
                .with_documents(["This is a replacement", "This is a new record"])
                .with_metadatas([source("notion"), source("google")]),
        )
        .await?;

    println!("Count of documents: {}", cluster.count().await?);

    client.delete_cluster("testing").await?;
    println!(">> create_upsert done\n");
    Ok(())
}

/// Upload images, then query by a stored embedding
async fn add_image_find(client: &Client) -> Result<()> {
    let cluster = client.get_or_create_cluster("image_add_test").await?;

    for path in ["images/sample.jpg", "images/sample.png"] {
        match cluster.add_image(path).await {
            Ok(response) => println!(
                "uploaded {} ({} embedding values)",
                response.id,
                response.embeddings.map(|e| e.len()).unwrap_or(0)
            ),
            // A missing local file should not abort the tour
            Err(ClientError::Io(err)) => {
                println!("skipping {}: {}", path, err);
            }
            Err(err) => return Err(err.into()),
        }
    }

    println!("count of images: {}", cluster.count().await?);

    let first = cluster.peek(1).await?;
    if let Some(embedding) = first.embeddings.as_ref().and_then(|all| all.first()) {
        let results = cluster
            .find(FindOptions::embeddings([embedding.clone()]).n_results(5))
            .await?;
        for hit in results.flatten_first() {
            println!("  {} (distance {:.4})", hit.id, hit.distance);
        }
    }

    client.delete_cluster("image_add_test").await?;
    println!(">> add_image_find done\n");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("oortdb_rs=info")),
        )
        .init();

    let started = Instant::now();

    let settings = Settings::new(ApiImpl::Rest, "api.oortdb.io");
    let client = Client::new(settings)?;

    println!("ping: {}", client.ping().await?);
    println!("version: {}", client.version().await?.version);

    check_waitlist(&client).await?;
    create_and_delete(&client).await?;
    create_add_get(&client).await?;
    create_add_find(&client).await?;
    create_add_find_embeddings(&client).await?;
    create_add_modify_update(&client).await?;
    create_upsert(&client).await?;
    add_image_find(&client).await?;

    println!(
        "Total execution time: {:.2} seconds",
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
