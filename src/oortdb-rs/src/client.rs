use std::path::Path;
use std::sync::Arc;

use oortdb_core::models::ValidationError;
use oortdb_core::{
    ApiImpl, ClusterInfo, DocumentBatch, GetResult, ImageAddResponse, QueryResult, Settings,
    UpdateBatch, VersionInfo,
};

use crate::api::{Api, FindOptions};
use crate::rest::RestApi;
use crate::Result;

/// Handle to a remote OortDb deployment.
///
/// Created once at startup and shared for the process lifetime; no
/// network call is made until the first operation.
pub struct Client {
    api: Arc<dyn Api>,
}

impl Client {
    pub fn new(settings: Settings) -> Result<Self> {
        let api: Arc<dyn Api> = match settings.api_impl {
            ApiImpl::Rest => Arc::new(RestApi::new(&settings)?),
        };
        Ok(Self { api })
    }

    /// Run the client over an injected backend (test doubles, embedded setups)
    pub fn with_api(api: Arc<dyn Api>) -> Self {
        Self { api }
    }

    pub async fn ping(&self) -> Result<String> {
        self.api.ping().await
    }

    pub async fn version(&self) -> Result<VersionInfo> {
        self.api.version().await
    }

    pub async fn join_waitlist(&self, email: &str) -> Result<String> {
        validate_email(email)?;
        self.api.join_waitlist(email).await
    }

    /// Create a new cluster; fails with `Conflict` if the name is taken
    pub async fn create_cluster(&self, name: &str) -> Result<Cluster> {
        validate_cluster_name(name)?;
        let info = self.api.create_cluster(name, false).await?;
        Ok(Cluster::new(Arc::clone(&self.api), info))
    }

    /// Fetch a cluster by name, creating it first if it does not exist
    pub async fn get_or_create_cluster(&self, name: &str) -> Result<Cluster> {
        validate_cluster_name(name)?;
        let info = self.api.create_cluster(name, true).await?;
        Ok(Cluster::new(Arc::clone(&self.api), info))
    }

    pub async fn get_cluster(&self, name: &str) -> Result<Cluster> {
        let info = self.api.get_cluster(name).await?;
        Ok(Cluster::new(Arc::clone(&self.api), info))
    }

    /// Delete a cluster by name; deleting an absent cluster succeeds
    pub async fn delete_cluster(&self, name: &str) -> Result<()> {
        self.api.delete_cluster(name).await
    }
}

/// Handle to one cluster, carrying the metadata snapshot taken when the
/// handle was obtained
#[derive(Clone)]
pub struct Cluster {
    api: Arc<dyn Api>,
    info: ClusterInfo,
}

impl Cluster {
    fn new(api: Arc<dyn Api>, info: ClusterInfo) -> Self {
        Self { api, info }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn size_mb(&self) -> f64 {
        self.info.size_mb
    }

    pub fn document_count(&self) -> i64 {
        self.info.document_count
    }

    pub fn info(&self) -> &ClusterInfo {
        &self.info
    }

    /// Insert new records; an id that already exists is a `Conflict`
    pub async fn add(&self, batch: DocumentBatch) -> Result<()> {
        batch.validate()?;
        self.api.add(self.id(), &batch).await
    }

    /// Insert records, replacing any whose id already exists
    pub async fn upsert(&self, batch: DocumentBatch) -> Result<()> {
        batch.validate()?;
        self.api.upsert(self.id(), &batch).await
    }

    /// Change only the supplied columns of the addressed records
    pub async fn update(&self, batch: UpdateBatch) -> Result<()> {
        batch.validate()?;
        self.api.update(self.id(), &batch).await
    }

    /// Fetch records by id; ids that do not exist are simply absent from
    /// the result
    pub async fn get(&self, ids: &[String]) -> Result<GetResult> {
        self.api.get(self.id(), ids).await
    }

    /// Fetch the first `limit` records, embeddings included
    pub async fn peek(&self, limit: usize) -> Result<GetResult> {
        self.api.peek(self.id(), limit).await
    }

    pub async fn count(&self) -> Result<u64> {
        self.api.count(self.id()).await
    }

    /// Similarity search over the cluster
    pub async fn find(&self, options: FindOptions) -> Result<QueryResult> {
        options.validate()?;
        self.api.query(self.id(), &options).await
    }

    /// Submit an image file for server-side embedding
    pub async fn add_image(&self, path: impl AsRef<Path>) -> Result<ImageAddResponse> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();
        self.api.add_image(self.id(), &file_name, bytes).await
    }

    /// Rename the cluster; on success the handle tracks the new name
    pub async fn modify(&mut self, new_name: &str) -> Result<()> {
        validate_cluster_name(new_name)?;
        let id = self.info.id.clone();
        let info = self.api.rename_cluster(&id, new_name).await?;
        self.info = info;
        Ok(())
    }
}

fn validate_cluster_name(name: &str) -> std::result::Result<(), ValidationError> {
    let well_formed = !name.is_empty()
        && name.len() <= 128
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !well_formed {
        return Err(ValidationError::ClusterName(name.to_string()));
    }
    Ok(())
}

fn validate_email(email: &str) -> std::result::Result<(), ValidationError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::Email(email.to_string()));
    };
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok {
        return Err(ValidationError::Email(email.to_string()));
    }
    Ok(())
}
