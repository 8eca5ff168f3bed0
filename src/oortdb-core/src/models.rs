use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Metadata attached to a document record
pub type Metadata = HashMap<String, serde_json::Value>;

/// Client-side contract violations, raised before any network call
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("batch must contain at least one id")]
    EmptyBatch,

    #[error("duplicate id in batch: {0}")]
    DuplicateId(String),

    #[error("{column} has {got} entries, expected {expected}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("batch requires documents or embeddings")]
    MissingContent,

    #[error("update requires at least one of documents, embeddings or metadatas")]
    EmptyUpdate,

    #[error("query requires exactly one of query_texts or query_embeddings")]
    AmbiguousQuery,

    #[error("n_results must be at least 1")]
    ZeroResults,

    #[error("invalid filter: {0}")]
    Filter(String),

    #[error("invalid email address: {0}")]
    Email(String),

    #[error("invalid cluster name: {0}")]
    ClusterName(String),
}

/// Column-oriented batch accepted by add/upsert.
///
/// Every optional column that is present must be parallel to `ids`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentBatch {
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<Vec<f32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadatas: Option<Vec<Metadata>>,
}

impl DocumentBatch {
    pub fn new(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_documents(mut self, documents: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.documents = Some(documents.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_embeddings(mut self, embeddings: impl IntoIterator<Item = Vec<f32>>) -> Self {
        self.embeddings = Some(embeddings.into_iter().collect());
        self
    }

    pub fn with_metadatas(mut self, metadatas: impl IntoIterator<Item = Metadata>) -> Self {
        self.metadatas = Some(metadatas.into_iter().collect());
        self
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_ids(&self.ids)?;
        check_column("documents", self.documents.as_deref(), self.ids.len())?;
        check_column("embeddings", self.embeddings.as_deref(), self.ids.len())?;
        check_column("metadatas", self.metadatas.as_deref(), self.ids.len())?;

        if self.documents.is_none() && self.embeddings.is_none() {
            return Err(ValidationError::MissingContent);
        }
        Ok(())
    }
}

/// Partial update addressed by id: only the supplied columns change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBatch {
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<Vec<f32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadatas: Option<Vec<Metadata>>,
}

impl UpdateBatch {
    pub fn new(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_documents(mut self, documents: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.documents = Some(documents.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_embeddings(mut self, embeddings: impl IntoIterator<Item = Vec<f32>>) -> Self {
        self.embeddings = Some(embeddings.into_iter().collect());
        self
    }

    pub fn with_metadatas(mut self, metadatas: impl IntoIterator<Item = Metadata>) -> Self {
        self.metadatas = Some(metadatas.into_iter().collect());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_ids(&self.ids)?;
        check_column("documents", self.documents.as_deref(), self.ids.len())?;
        check_column("embeddings", self.embeddings.as_deref(), self.ids.len())?;
        check_column("metadatas", self.metadatas.as_deref(), self.ids.len())?;

        if self.documents.is_none() && self.embeddings.is_none() && self.metadatas.is_none() {
            return Err(ValidationError::EmptyUpdate);
        }
        Ok(())
    }
}

fn validate_ids(ids: &[String]) -> Result<(), ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(ValidationError::DuplicateId(id.clone()));
        }
    }
    Ok(())
}

fn check_column<T>(
    column: &'static str,
    values: Option<&[T]>,
    expected: usize,
) -> Result<(), ValidationError> {
    match values {
        Some(values) if values.len() != expected => Err(ValidationError::LengthMismatch {
            column,
            expected,
            got: values.len(),
        }),
        _ => Ok(()),
    }
}

/// Cluster metadata as reported by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size_mb: f64,
    #[serde(default)]
    pub document_count: i64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Column-oriented result of get/peek
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetResult {
    pub ids: Vec<String>,
    #[serde(default)]
    pub documents: Vec<Option<String>>,
    #[serde(default)]
    pub metadatas: Vec<Option<Metadata>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<Vec<f32>>>,
}

impl GetResult {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Result of a similarity query, one inner column set per query input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub ids: Vec<Vec<String>>,
    #[serde(default)]
    pub documents: Vec<Vec<Option<String>>>,
    #[serde(default)]
    pub metadatas: Vec<Vec<Option<Metadata>>>,
    #[serde(default)]
    pub distances: Vec<Vec<f32>>,
}

/// One match of a similarity query, row-oriented for display
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub id: String,
    pub document: Option<String>,
    pub metadata: Option<Metadata>,
    pub distance: f32,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.ids.iter().all(|ids| ids.is_empty())
    }

    /// Rows for the first query input; single-query calls read results here
    pub fn flatten_first(&self) -> Vec<QueryMatch> {
        let Some(ids) = self.ids.first() else {
            return Vec::new();
        };

        ids.iter()
            .enumerate()
            .map(|(row, id)| QueryMatch {
                id: id.clone(),
                document: self
                    .documents
                    .first()
                    .and_then(|docs| docs.get(row))
                    .cloned()
                    .flatten(),
                metadata: self
                    .metadatas
                    .first()
                    .and_then(|metas| metas.get(row))
                    .cloned()
                    .flatten(),
                distance: self
                    .distances
                    .first()
                    .and_then(|distances| distances.get(row))
                    .copied()
                    .unwrap_or(0.0),
            })
            .collect()
    }
}

/// Service version report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
}

/// Response to an image ingestion call.
///
/// The embeddings column is filled once the service has embedded the image;
/// unrecognized response fields are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAddResponse {
    pub id: String,
    #[serde(default)]
    pub embeddings: Option<Vec<f32>>,
    #[serde(flatten)]
    pub extra: Metadata,
}
