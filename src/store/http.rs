use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};

use super::RecordStore;
use crate::error::TransportError;

/// Document store reached over its REST endpoint: `POST {base_url}/{collection}`.
pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRecordStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn headers(&self) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Bugdesk"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| TransportError::InvalidResponse(format!("bad api key: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    async fn add_document(
        &self,
        collection: &str,
        data: &serde_json::Value,
    ) -> Result<String, TransportError> {
        let url = format!("{}/{collection}", self.base_url);
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        document_reference(&body).ok_or_else(|| {
            TransportError::InvalidResponse(format!("no document reference in {body}"))
        })
    }
}

/// Reads `id`, or the last segment of a `name` like
/// `projects/p/databases/(default)/documents/bugs/abc123`.
fn document_reference(body: &serde_json::Value) -> Option<String> {
    if let Some(id) = body["id"].as_str().filter(|s| !s.is_empty()) {
        return Some(id.to_string());
    }
    body["name"]
        .as_str()
        .and_then(|name| name.rsplit('/').next())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
