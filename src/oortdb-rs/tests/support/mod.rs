//! In-process double for the OortDb backend.
//!
//! Implements the `Api` contract over a mutex-guarded record store so the
//! client surface can be exercised without a deployment. Similarity is a
//! linear scan with cosine distance over a deterministic embedding stub;
//! this is a contract double, not a search engine.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use oortdb_rs::{
    Api, ClientError, ClusterInfo, DocumentBatch, FindOptions, GetResult, ImageAddResponse,
    Metadata, QueryResult, Result, UpdateBatch, VersionInfo,
};

pub struct MemoryApi {
    clusters: Mutex<Vec<MemCluster>>,
}

struct MemCluster {
    id: String,
    name: String,
    records: Vec<MemRecord>,
}

#[derive(Clone)]
struct MemRecord {
    id: String,
    document: Option<String>,
    embedding: Option<Vec<f32>>,
    metadata: Option<Metadata>,
}

impl MemoryApi {
    pub fn new() -> Self {
        Self {
            clusters: Mutex::new(Vec::new()),
        }
    }
}

impl Default for MemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Api for MemoryApi {
    async fn ping(&self) -> Result<String> {
        Ok("pong".to_string())
    }

    async fn version(&self) -> Result<VersionInfo> {
        Ok(VersionInfo {
            version: "0.0.0-double".to_string(),
            build: None,
        })
    }

    async fn join_waitlist(&self, email: &str) -> Result<String> {
        Ok(format!("{} added to the waitlist", email))
    }

    async fn create_cluster(&self, name: &str, get_or_create: bool) -> Result<ClusterInfo> {
        let mut clusters = self.clusters.lock().unwrap();
        if let Some(existing) = clusters.iter().find(|cluster| cluster.name == name) {
            if get_or_create {
                return Ok(info_of(existing));
            }
            return Err(ClientError::Conflict {
                kind: "cluster",
                name: name.to_string(),
            });
        }

        let cluster = MemCluster {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            records: Vec::new(),
        };
        let info = info_of(&cluster);
        clusters.push(cluster);
        Ok(info)
    }

    async fn get_cluster(&self, name: &str) -> Result<ClusterInfo> {
        let clusters = self.clusters.lock().unwrap();
        clusters
            .iter()
            .find(|cluster| cluster.name == name)
            .map(info_of)
            .ok_or_else(|| ClientError::NotFound {
                kind: "cluster",
                name: name.to_string(),
            })
    }

    async fn delete_cluster(&self, name: &str) -> Result<()> {
        let mut clusters = self.clusters.lock().unwrap();
        clusters.retain(|cluster| cluster.name != name);
        Ok(())
    }

    async fn rename_cluster(&self, cluster_id: &str, new_name: &str) -> Result<ClusterInfo> {
        let mut clusters = self.clusters.lock().unwrap();
        if clusters
            .iter()
            .any(|cluster| cluster.name == new_name && cluster.id != cluster_id)
        {
            return Err(ClientError::Conflict {
                kind: "cluster",
                name: new_name.to_string(),
            });
        }

        let cluster = find_by_id_mut(&mut clusters, cluster_id)?;
        cluster.name = new_name.to_string();
        Ok(info_of(cluster))
    }

    async fn add(&self, cluster_id: &str, batch: &DocumentBatch) -> Result<()> {
        let mut clusters = self.clusters.lock().unwrap();
        let cluster = find_by_id_mut(&mut clusters, cluster_id)?;

        for id in &batch.ids {
            if cluster.records.iter().any(|record| &record.id == id) {
                return Err(ClientError::Conflict {
                    kind: "document",
                    name: id.clone(),
                });
            }
        }
        cluster.records.extend(rows(batch));
        Ok(())
    }

    async fn upsert(&self, cluster_id: &str, batch: &DocumentBatch) -> Result<()> {
        let mut clusters = self.clusters.lock().unwrap();
        let cluster = find_by_id_mut(&mut clusters, cluster_id)?;

        for row in rows(batch) {
            match cluster
                .records
                .iter_mut()
                .find(|record| record.id == row.id)
            {
                Some(existing) => *existing = row,
                None => cluster.records.push(row),
            }
        }
        Ok(())
    }

    async fn update(&self, cluster_id: &str, batch: &UpdateBatch) -> Result<()> {
        let mut clusters = self.clusters.lock().unwrap();
        let cluster = find_by_id_mut(&mut clusters, cluster_id)?;

        for (row, id) in batch.ids.iter().enumerate() {
            let record = cluster
                .records
                .iter_mut()
                .find(|record| &record.id == id)
                .ok_or_else(|| ClientError::NotFound {
                    kind: "document",
                    name: id.clone(),
                })?;

            if let Some(documents) = &batch.documents {
                record.document = documents.get(row).cloned();
            }
            if let Some(embeddings) = &batch.embeddings {
                record.embedding = embeddings.get(row).cloned();
            }
            if let Some(metadatas) = &batch.metadatas {
                record.metadata = metadatas.get(row).cloned();
            }
        }
        Ok(())
    }

    async fn get(&self, cluster_id: &str, ids: &[String]) -> Result<GetResult> {
        let clusters = self.clusters.lock().unwrap();
        let cluster = find_by_id(&clusters, cluster_id)?;

        let mut result = GetResult::default();
        for id in ids {
            if let Some(record) = cluster.records.iter().find(|record| &record.id == id) {
                result.ids.push(record.id.clone());
                result.documents.push(record.document.clone());
                result.metadatas.push(record.metadata.clone());
            }
        }
        Ok(result)
    }

    async fn peek(&self, cluster_id: &str, limit: usize) -> Result<GetResult> {
        let clusters = self.clusters.lock().unwrap();
        let cluster = find_by_id(&clusters, cluster_id)?;

        let mut result = GetResult::default();
        let mut embeddings = Vec::new();
        for record in cluster.records.iter().take(limit) {
            result.ids.push(record.id.clone());
            result.documents.push(record.document.clone());
            result.metadatas.push(record.metadata.clone());
            embeddings.push(embedding_of(record));
        }
        result.embeddings = Some(embeddings);
        Ok(result)
    }

    async fn count(&self, cluster_id: &str) -> Result<u64> {
        let clusters = self.clusters.lock().unwrap();
        let cluster = find_by_id(&clusters, cluster_id)?;
        Ok(cluster.records.len() as u64)
    }

    async fn query(&self, cluster_id: &str, options: &FindOptions) -> Result<QueryResult> {
        let clusters = self.clusters.lock().unwrap();
        let cluster = find_by_id(&clusters, cluster_id)?;

        let query_vectors: Vec<Vec<f32>> = if let Some(embeddings) = &options.query_embeddings {
            embeddings.clone()
        } else if let Some(texts) = &options.query_texts {
            texts.iter().map(|text| embed_text(text)).collect()
        } else {
            return Err(ClientError::Validation(
                "query requires texts or embeddings".to_string(),
            ));
        };

        let mut result = QueryResult::default();
        for query in &query_vectors {
            let mut scored: Vec<(f32, &MemRecord)> = cluster
                .records
                .iter()
                .filter(|record| {
                    let metadata_ok = options.where_metadata.as_ref().is_none_or(|filter| {
                        record
                            .metadata
                            .as_ref()
                            .is_some_and(|metadata| filter.matches(metadata))
                    });
                    let document_ok = options.where_document.as_ref().is_none_or(|filter| {
                        record
                            .document
                            .as_deref()
                            .is_some_and(|document| filter.matches(document))
                    });
                    metadata_ok && document_ok
                })
                .map(|record| (cosine_distance(query, &embedding_of(record)), record))
                .collect();

            scored.sort_by(|a, b| a.0.total_cmp(&b.0));
            scored.truncate(options.n_results);

            result
                .ids
                .push(scored.iter().map(|(_, record)| record.id.clone()).collect());
            result.documents.push(
                scored
                    .iter()
                    .map(|(_, record)| record.document.clone())
                    .collect(),
            );
            result.metadatas.push(
                scored
                    .iter()
                    .map(|(_, record)| record.metadata.clone())
                    .collect(),
            );
            result
                .distances
                .push(scored.iter().map(|(distance, _)| *distance).collect());
        }
        Ok(result)
    }

    async fn add_image(
        &self,
        cluster_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ImageAddResponse> {
        let mut clusters = self.clusters.lock().unwrap();
        let cluster = find_by_id_mut(&mut clusters, cluster_id)?;

        let embedding = embed_bytes(&bytes);
        let id = Uuid::new_v4().to_string();
        cluster.records.push(MemRecord {
            id: id.clone(),
            document: None,
            embedding: Some(embedding.clone()),
            metadata: Some([("file_name".to_string(), serde_json::json!(file_name))].into()),
        });

        Ok(ImageAddResponse {
            id,
            embeddings: Some(embedding),
            extra: Metadata::new(),
        })
    }
}

fn info_of(cluster: &MemCluster) -> ClusterInfo {
    ClusterInfo {
        id: cluster.id.clone(),
        name: cluster.name.clone(),
        size_mb: 0.0,
        document_count: cluster.records.len() as i64,
        created_at: Utc::now(),
    }
}

fn rows(batch: &DocumentBatch) -> Vec<MemRecord> {
    batch
        .ids
        .iter()
        .enumerate()
        .map(|(row, id)| MemRecord {
            id: id.clone(),
            document: batch
                .documents
                .as_ref()
                .and_then(|documents| documents.get(row))
                .cloned(),
            embedding: batch
                .embeddings
                .as_ref()
                .and_then(|embeddings| embeddings.get(row))
                .cloned(),
            metadata: batch
                .metadatas
                .as_ref()
                .and_then(|metadatas| metadatas.get(row))
                .cloned(),
        })
        .collect()
}

fn find_by_id<'a>(clusters: &'a [MemCluster], cluster_id: &str) -> Result<&'a MemCluster> {
    clusters
        .iter()
        .find(|cluster| cluster.id == cluster_id)
        .ok_or_else(|| ClientError::NotFound {
            kind: "cluster",
            name: cluster_id.to_string(),
        })
}

fn find_by_id_mut<'a>(
    clusters: &'a mut [MemCluster],
    cluster_id: &str,
) -> Result<&'a mut MemCluster> {
    clusters
        .iter_mut()
        .find(|cluster| cluster.id == cluster_id)
        .ok_or_else(|| ClientError::NotFound {
            kind: "cluster",
            name: cluster_id.to_string(),
        })
}

fn embedding_of(record: &MemRecord) -> Vec<f32> {
    record
        .embedding
        .clone()
        .or_else(|| record.document.as_deref().map(embed_text))
        .unwrap_or_default()
}

pub fn embed_text(text: &str) -> Vec<f32> {
    embed_bytes(text.as_bytes())
}

fn embed_bytes(bytes: &[u8]) -> Vec<f32> {
    let mut vector = vec![0.0f32; 8];
    for (position, byte) in bytes.iter().enumerate() {
        vector[position % 8] += f32::from(*byte) / 255.0;
    }
    vector
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}
