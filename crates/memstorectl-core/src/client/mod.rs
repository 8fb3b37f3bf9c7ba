//! HTTP client for the managed cluster API
//!
//! [`ClusterApi`] is the seam the workflows and the readiness waiter are
//! written against; [`ClusterClient`] implements it over reqwest.

mod error;

pub use error::ApiError;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use crate::cluster::{Cluster, ClusterCreateRequest, ListClustersResponse};
use crate::config::ConfigError;
use crate::error::Result;

/// Default API endpoint
pub const DEFAULT_API_URL: &str = "https://api.scaleway.com";

/// User agent string for memstorectl HTTP requests
pub const USER_AGENT: &str = concat!("memstorectl/", env!("CARGO_PKG_VERSION"));

const AUTH_HEADER: &str = "X-Auth-Token";
const PAGE_SIZE: u32 = 100;

/// Operations on clusters that the CLI needs from the remote API
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Submit a create; the returned cluster is usually still provisioning
    async fn create_cluster(&self, request: &ClusterCreateRequest) -> Result<Cluster>;

    /// Fetch the current state; a missing cluster yields a not-found error
    async fn get_cluster(&self, zone: &str, cluster_id: &str) -> Result<Cluster>;

    async fn list_clusters(&self, zone: &str) -> Result<Vec<Cluster>>;

    /// Submit a delete; the returned cluster is usually in `deleting`
    async fn delete_cluster(&self, zone: &str, cluster_id: &str) -> Result<Cluster>;
}

/// reqwest-backed [`ClusterApi`]
#[derive(Clone, Debug)]
pub struct ClusterClient {
    http: reqwest::Client,
    base_url: Url,
    secret_key: String,
}

/// Builder for [`ClusterClient`]
#[derive(Debug, Clone)]
pub struct ClusterClientBuilder {
    api_url: String,
    secret_key: String,
    timeout: Duration,
    user_agent: String,
}

impl Default for ClusterClientBuilder {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            secret_key: String::new(),
            timeout: Duration::from_secs(30),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ClusterClientBuilder {
    #[must_use]
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    #[must_use]
    pub fn secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = key.into();
        self
    }

    /// Per-request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<ClusterClient> {
        let base_url = Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidApiUrl {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidApiUrl {
                url: self.api_url,
                reason: "not a base URL".to_string(),
            }
            .into());
        }

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()
            .map_err(ApiError::from)?;

        Ok(ClusterClient {
            http,
            base_url,
            secret_key: self.secret_key,
        })
    }
}

impl ClusterClient {
    pub fn builder() -> ClusterClientBuilder {
        ClusterClientBuilder::default()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn clusters_url(&self, zone: &str) -> Url {
        self.url(&["redis", "v1", "zones", zone, "clusters"])
    }

    fn cluster_url(&self, zone: &str, cluster_id: &str) -> Url {
        self.url(&["redis", "v1", "zones", zone, "clusters", cluster_id])
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url);
        self.http
            .request(method, url)
            .header(AUTH_HEADER, &self.secret_key)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(ApiError::from)?;
        handle_response(response).await
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    trace!("Response status: {}", status);

    if status.is_success() {
        let body = response.text().await.map_err(ApiError::from)?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", e, body)).into())
    } else {
        let body = response.text().await.unwrap_or_default();
        debug!("API returned {}: {}", status, body);
        Err(ApiError::from_status(status.as_u16(), &body).into())
    }
}

#[async_trait]
impl ClusterApi for ClusterClient {
    async fn create_cluster(&self, request: &ClusterCreateRequest) -> Result<Cluster> {
        let url = self.clusters_url(&request.zone);
        self.send(self.request(Method::POST, url).json(request))
            .await
    }

    async fn get_cluster(&self, zone: &str, cluster_id: &str) -> Result<Cluster> {
        let url = self.cluster_url(zone, cluster_id);
        self.send(self.request(Method::GET, url)).await
    }

    async fn list_clusters(&self, zone: &str) -> Result<Vec<Cluster>> {
        let mut clusters = Vec::new();
        let mut page = 1u32;

        loop {
            let mut url = self.clusters_url(zone);
            url.query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("page_size", &PAGE_SIZE.to_string());

            let response: ListClustersResponse =
                self.send(self.request(Method::GET, url)).await?;
            let fetched = response.clusters.len();
            clusters.extend(response.clusters);

            if fetched == 0 || clusters.len() >= response.total_count as usize {
                break;
            }
            page += 1;
        }

        Ok(clusters)
    }

    async fn delete_cluster(&self, zone: &str, cluster_id: &str) -> Result<Cluster> {
        let url = self.cluster_url(zone, cluster_id);
        self.send(self.request(Method::DELETE, url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_url_encodes_segments() {
        let client = ClusterClient::builder()
            .api_url("https://api.example.com/")
            .secret_key("secret")
            .build()
            .unwrap();

        assert_eq!(
            client.cluster_url("fr-par-1", "abc/def").as_str(),
            "https://api.example.com/redis/v1/zones/fr-par-1/clusters/abc%2Fdef"
        );
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let client = ClusterClient::builder()
            .api_url("http://localhost:8080/proxy")
            .build()
            .unwrap();

        assert_eq!(
            client.clusters_url("nl-ams-1").as_str(),
            "http://localhost:8080/proxy/redis/v1/zones/nl-ams-1/clusters"
        );
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let err = ClusterClient::builder()
            .api_url("not a url")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not a url"));

        assert!(ClusterClient::builder().api_url("mailto:a@b.c").build().is_err());
    }
}
