use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use oortdb_core::models::ValidationError;
use oortdb_core::{
    ClusterInfo, DocumentBatch, GetResult, ImageAddResponse, QueryResult, UpdateBatch, VersionInfo,
    Where, WhereDocument,
};

use crate::Result;

/// Options for a similarity query.
///
/// Exactly one of `query_texts` / `query_embeddings` must be set; the
/// service embeds query texts itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_texts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_embeddings: Option<Vec<Vec<f32>>>,
    pub n_results: usize,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_metadata: Option<Where>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_document: Option<WhereDocument>,
}

impl FindOptions {
    pub fn texts(texts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            query_texts: Some(texts.into_iter().map(Into::into).collect()),
            n_results: 10,
            ..Self::default()
        }
    }

    pub fn embeddings(embeddings: impl IntoIterator<Item = Vec<f32>>) -> Self {
        Self {
            query_embeddings: Some(embeddings.into_iter().collect()),
            n_results: 10,
            ..Self::default()
        }
    }

    pub fn n_results(mut self, n_results: usize) -> Self {
        self.n_results = n_results;
        self
    }

    pub fn where_metadata(mut self, filter: Where) -> Self {
        self.where_metadata = Some(filter);
        self
    }

    pub fn where_document(mut self, filter: WhereDocument) -> Self {
        self.where_document = Some(filter);
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        match (&self.query_texts, &self.query_embeddings) {
            (Some(texts), None) if !texts.is_empty() => {}
            (None, Some(embeddings)) if !embeddings.is_empty() => {}
            _ => return Err(ValidationError::AmbiguousQuery),
        }
        if self.n_results == 0 {
            return Err(ValidationError::ZeroResults);
        }
        if let Some(filter) = &self.where_metadata {
            filter.validate()?;
        }
        if let Some(filter) = &self.where_document {
            filter.validate()?;
        }
        Ok(())
    }
}

/// Backend contract for the OortDb API.
///
/// [`crate::Client`] and [`crate::Cluster`] delegate every remote call
/// through this trait, so a test double can stand in for the REST backend.
#[async_trait]
pub trait Api: Send + Sync {
    async fn ping(&self) -> Result<String>;
    async fn version(&self) -> Result<VersionInfo>;
    async fn join_waitlist(&self, email: &str) -> Result<String>;

    async fn create_cluster(&self, name: &str, get_or_create: bool) -> Result<ClusterInfo>;
    async fn get_cluster(&self, name: &str) -> Result<ClusterInfo>;
    async fn delete_cluster(&self, name: &str) -> Result<()>;
    async fn rename_cluster(&self, cluster_id: &str, new_name: &str) -> Result<ClusterInfo>;

    async fn add(&self, cluster_id: &str, batch: &DocumentBatch) -> Result<()>;
    async fn upsert(&self, cluster_id: &str, batch: &DocumentBatch) -> Result<()>;
    async fn update(&self, cluster_id: &str, batch: &UpdateBatch) -> Result<()>;
    async fn get(&self, cluster_id: &str, ids: &[String]) -> Result<GetResult>;
    async fn peek(&self, cluster_id: &str, limit: usize) -> Result<GetResult>;
    async fn count(&self, cluster_id: &str) -> Result<u64>;
    async fn query(&self, cluster_id: &str, options: &FindOptions) -> Result<QueryResult>;
    async fn add_image(
        &self,
        cluster_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ImageAddResponse>;
}
