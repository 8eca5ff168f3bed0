use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as HttpClient, Response};
use serde::{Deserialize, Serialize};

use oortdb_core::{
    ClusterInfo, DocumentBatch, GetResult, ImageAddResponse, QueryResult, Settings, UpdateBatch,
    VersionInfo,
};

use crate::api::{Api, FindOptions};
use crate::{ClientError, Result};

/// REST backend for the OortDb API
pub struct RestApi {
    base_url: String,
    client: HttpClient,
}

#[derive(Serialize)]
struct WaitlistRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct CreateClusterRequest<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Serialize)]
struct RenameClusterRequest<'a> {
    new_name: &'a str,
}

#[derive(Serialize)]
struct GetRequest<'a> {
    ids: &'a [String],
}

#[derive(Deserialize)]
struct PingResponse {
    ping: String,
}

#[derive(Deserialize)]
struct AckResponse {
    message: String,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

/// Error body the service attaches to non-success responses
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    message: Option<String>,
    /// Name of the entity the error refers to, when the service knows it
    #[serde(default)]
    name: Option<String>,
}

impl RestApi {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = HttpClient::builder().build()?;
        Ok(Self {
            base_url: format!("{}/api/v1", settings.base_url()),
            client,
        })
    }

    fn route(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Map a non-success response onto the error taxonomy.
    ///
    /// `kind` names the entity the route operates on; the service's own
    /// `name` field wins over `subject` when present.
    async fn check(response: Response, kind: &'static str, subject: &str) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();

        let text = response.text().await.unwrap_or_default();
        let (message, name) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (body.message.unwrap_or(body.error), body.name),
            Err(_) => (text, None),
        };
        let name = name.unwrap_or_else(|| subject.to_string());

        tracing::warn!(status, kind, name = %name, "request rejected: {}", message);
        Err(match status {
            404 => ClientError::NotFound { kind, name },
            409 => ClientError::Conflict { kind, name },
            400 | 422 => ClientError::Validation(message),
            status => ClientError::Server { status, message },
        })
    }
}

#[async_trait]
impl Api for RestApi {
    async fn ping(&self) -> Result<String> {
        let response = self.client.get(self.route("ping")).send().await?;
        let body: PingResponse = Self::check(response, "endpoint", "ping").await?.json().await?;
        Ok(body.ping)
    }

    async fn version(&self) -> Result<VersionInfo> {
        let response = self.client.get(self.route("version")).send().await?;
        let info = Self::check(response, "endpoint", "version")
            .await?
            .json()
            .await?;
        Ok(info)
    }

    async fn join_waitlist(&self, email: &str) -> Result<String> {
        tracing::debug!(email = %email, "joining waitlist");
        let response = self
            .client
            .post(self.route("waitlist"))
            .json(&WaitlistRequest { email })
            .send()
            .await?;
        let body: AckResponse = Self::check(response, "waitlist", email).await?.json().await?;
        Ok(body.message)
    }

    async fn create_cluster(&self, name: &str, get_or_create: bool) -> Result<ClusterInfo> {
        tracing::debug!(cluster = %name, get_or_create, "creating cluster");
        let response = self
            .client
            .post(self.route("clusters"))
            .json(&CreateClusterRequest {
                name,
                get_or_create,
            })
            .send()
            .await?;
        let info = Self::check(response, "cluster", name).await?.json().await?;
        Ok(info)
    }

    async fn get_cluster(&self, name: &str) -> Result<ClusterInfo> {
        let response = self
            .client
            .get(self.route(&format!("clusters/{}", name)))
            .send()
            .await?;
        let info = Self::check(response, "cluster", name).await?.json().await?;
        Ok(info)
    }

    async fn delete_cluster(&self, name: &str) -> Result<()> {
        tracing::debug!(cluster = %name, "deleting cluster");
        let response = self
            .client
            .delete(self.route(&format!("clusters/{}", name)))
            .send()
            .await?;

        // Removal is idempotent: a cluster that is already gone is fine
        if response.status().as_u16() == 404 {
            tracing::debug!(cluster = %name, "cluster already absent");
            return Ok(());
        }

        Self::check(response, "cluster", name).await?;
        Ok(())
    }

    async fn rename_cluster(&self, cluster_id: &str, new_name: &str) -> Result<ClusterInfo> {
        tracing::debug!(cluster = %cluster_id, new_name = %new_name, "renaming cluster");
        let response = self
            .client
            .put(self.route(&format!("clusters/{}", cluster_id)))
            .json(&RenameClusterRequest { new_name })
            .send()
            .await?;
        let info = Self::check(response, "cluster", new_name).await?.json().await?;
        Ok(info)
    }

    async fn add(&self, cluster_id: &str, batch: &DocumentBatch) -> Result<()> {
        tracing::debug!(cluster = %cluster_id, "adding {} documents", batch.len());
        let response = self
            .client
            .post(self.route(&format!("clusters/{}/add", cluster_id)))
            .json(batch)
            .send()
            .await?;
        Self::check(response, "document", cluster_id).await?;
        Ok(())
    }

    async fn upsert(&self, cluster_id: &str, batch: &DocumentBatch) -> Result<()> {
        tracing::debug!(cluster = %cluster_id, "upserting {} documents", batch.len());
        let response = self
            .client
            .post(self.route(&format!("clusters/{}/upsert", cluster_id)))
            .json(batch)
            .send()
            .await?;
        Self::check(response, "document", cluster_id).await?;
        Ok(())
    }

    async fn update(&self, cluster_id: &str, batch: &UpdateBatch) -> Result<()> {
        tracing::debug!(cluster = %cluster_id, "updating {} documents", batch.ids.len());
        let response = self
            .client
            .post(self.route(&format!("clusters/{}/update", cluster_id)))
            .json(batch)
            .send()
            .await?;
        Self::check(response, "document", cluster_id).await?;
        Ok(())
    }

    async fn get(&self, cluster_id: &str, ids: &[String]) -> Result<GetResult> {
        let response = self
            .client
            .post(self.route(&format!("clusters/{}/get", cluster_id)))
            .json(&GetRequest { ids })
            .send()
            .await?;
        let result = Self::check(response, "document", cluster_id)
            .await?
            .json()
            .await?;
        Ok(result)
    }

    async fn peek(&self, cluster_id: &str, limit: usize) -> Result<GetResult> {
        let response = self
            .client
            .get(self.route(&format!("clusters/{}/peek", cluster_id)))
            .query(&[("limit", limit)])
            .send()
            .await?;
        let result = Self::check(response, "cluster", cluster_id)
            .await?
            .json()
            .await?;
        Ok(result)
    }

    async fn count(&self, cluster_id: &str) -> Result<u64> {
        let response = self
            .client
            .get(self.route(&format!("clusters/{}/count", cluster_id)))
            .send()
            .await?;
        let body: CountResponse = Self::check(response, "cluster", cluster_id)
            .await?
            .json()
            .await?;
        Ok(body.count)
    }

    async fn query(&self, cluster_id: &str, options: &FindOptions) -> Result<QueryResult> {
        tracing::debug!(cluster = %cluster_id, n_results = options.n_results, "running similarity query");
        let response = self
            .client
            .post(self.route(&format!("clusters/{}/query", cluster_id)))
            .json(options)
            .send()
            .await?;
        let result = Self::check(response, "cluster", cluster_id)
            .await?
            .json()
            .await?;
        Ok(result)
    }

    async fn add_image(
        &self,
        cluster_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ImageAddResponse> {
        tracing::debug!(cluster = %cluster_id, file = %file_name, "uploading image");
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.route(&format!("clusters/{}/images", cluster_id)))
            .multipart(form)
            .send()
            .await?;
        let result = Self::check(response, "cluster", cluster_id)
            .await?
            .json()
            .await?;
        Ok(result)
    }
}
