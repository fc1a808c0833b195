use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use modelref_types::{
    CategoryAuditResponse, LegacyModelRecord, ModelCategory, ModelRecord,
};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::api::ReferenceApi;
use crate::error::ClientError;
use crate::query::AuditQuery;

/// Header carrying the API key on write requests.
pub const API_KEY_HEADER: &str = "apikey";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builder for [`ReferenceClient`].
///
/// # Example
/// ```rust,no_run
/// # async fn run() -> Result<(), modelref_client::ClientError> {
/// use modelref_client::{ReferenceApi, ReferenceClient};
/// use modelref_types::ModelCategory;
///
/// let client = ReferenceClient::builder("https://models.example.net/api")
///     .api_key("0000000000")
///     .build()?;
/// let models = client.list_models(ModelCategory::ImageGeneration).await?;
/// # Ok(()) }
/// ```
pub struct ReferenceClientBuilder {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ReferenceClientBuilder {
    /// API key sent with create, update and delete requests.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    /// Per-request timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ReferenceClient, ClientError> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(self.base_url));
        }

        let http = Client::builder()
            .user_agent(concat!("modelref-client/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .build()?;

        Ok(ReferenceClient {
            http,
            base_url,
            api_key: self.api_key,
        })
    }
}

/// HTTP client for the model reference service.
#[derive(Debug, Clone)]
pub struct ReferenceClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl ReferenceClient {
    pub fn builder(base_url: impl Into<String>) -> ReferenceClientBuilder {
        ReferenceClientBuilder {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `<base>/<segments...>`; each segment is percent-encoded, so model
    /// names containing `/` stay a single segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(
        &self,
        method: Method,
        url: Url,
        api_key: Option<&str>,
    ) -> Result<RequestBuilder, ClientError> {
        let key = api_key
            .filter(|k| !k.is_empty())
            .or(self.api_key.as_deref())
            .ok_or(ClientError::MissingApiKey)?;
        Ok(self.http.request(method, url).header(API_KEY_HEADER, key))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        decode(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = check_status(response).await?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl ReferenceApi for ReferenceClient {
    async fn list_categories(&self) -> Result<Vec<String>, ClientError> {
        let url = self.endpoint(&["model_references", "v2", "model_categories"])?;
        self.get_json(url).await
    }

    async fn list_models(&self, category: ModelCategory) -> Result<Vec<ModelRecord>, ClientError> {
        let url = self.endpoint(&["model_references", "v2", category.as_ref()])?;
        let records: BTreeMap<String, ModelRecord> = self.get_json(url).await?;
        Ok(records
            .into_iter()
            .map(|(key, mut record)| {
                if record.name.is_empty() {
                    record.name = key;
                }
                record
            })
            .collect())
    }

    async fn list_legacy_models(
        &self,
        category: ModelCategory,
    ) -> Result<Vec<ModelRecord>, ClientError> {
        let url = self.endpoint(&["model_references", "v1", category.as_ref()])?;
        let records: BTreeMap<String, LegacyModelRecord> = self.get_json(url).await?;
        Ok(records
            .into_values()
            .map(|legacy| legacy.into_record(category))
            .collect())
    }

    async fn category_audit(
        &self,
        category: ModelCategory,
        query: AuditQuery,
    ) -> Result<CategoryAuditResponse, ClientError> {
        let mut url = self.endpoint(&[
            "model_references",
            "statistics",
            category.as_ref(),
            "audit",
        ])?;
        query.apply(&mut url);
        self.get_json(url).await
    }

    async fn create_model(
        &self,
        category: ModelCategory,
        record: &ModelRecord,
        api_key: Option<&str>,
    ) -> Result<ModelRecord, ClientError> {
        record.check()?;
        let url = self.endpoint(&["model_references", "v2", category.as_ref()])?;
        debug!(%url, name = %record.name, "POST");
        let response = self
            .authorized(Method::POST, url, api_key)?
            .json(record)
            .send()
            .await?;
        decode(response).await
    }

    async fn update_model(
        &self,
        category: ModelCategory,
        name: &str,
        record: &ModelRecord,
        api_key: Option<&str>,
    ) -> Result<ModelRecord, ClientError> {
        record.check()?;
        let url = self.endpoint(&["model_references", "v2", category.as_ref(), name])?;
        debug!(%url, "PUT");
        let response = self
            .authorized(Method::PUT, url, api_key)?
            .json(record)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete_model(
        &self,
        category: ModelCategory,
        name: &str,
        api_key: Option<&str>,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&["model_references", "v2", category.as_ref(), name])?;
        debug!(%url, "DELETE");
        let response = self
            .authorized(Method::DELETE, url, api_key)?
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn openapi_schema(&self) -> Result<serde_json::Value, ClientError> {
        let url = self.endpoint(&["openapi.json"])?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let client = ReferenceClient::builder("http://localhost:8000/api")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/api");
        assert!(client.api_key.is_none());
    }

    #[test]
    fn empty_api_key_is_ignored() {
        let client = ReferenceClient::builder("http://localhost")
            .api_key("")
            .build()
            .unwrap();
        assert!(client.api_key.is_none());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ReferenceClient::builder("not a url").build().unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));

        let err = ReferenceClient::builder("mailto:admin@example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn endpoint_encodes_names_as_single_segments() {
        let client = ReferenceClient::builder("http://localhost/api/")
            .build()
            .unwrap();
        let url = client
            .endpoint(&["model_references", "v2", "text_generation", "koboldcpp/Llama-3"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost/api/model_references/v2/text_generation/koboldcpp%2FLlama-3"
        );
    }

    #[test]
    fn writes_require_a_key() {
        let client = ReferenceClient::builder("http://localhost").build().unwrap();
        let url = client.endpoint(&["x"]).unwrap();
        assert!(matches!(
            client.authorized(Method::DELETE, url.clone(), None),
            Err(ClientError::MissingApiKey)
        ));
        assert!(client.authorized(Method::DELETE, url, Some("key")).is_ok());
    }
}
