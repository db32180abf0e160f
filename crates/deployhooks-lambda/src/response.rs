// Delivery of the custom-resource callback to the pre-signed S3 URL

use async_trait::async_trait;
use deployhooks_core::{CustomResourceResponse, ResponseSender, Result, ServiceError};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::info;

const SERVICE: &str = "response";
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct HttpResponseSender {
    client: reqwest::Client,
}

impl HttpResponseSender {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResponseSender for HttpResponseSender {
    async fn send(&self, url: &str, response: &CustomResourceResponse) -> Result<()> {
        let body = serde_json::to_vec(response)
            .map_err(|e| ServiceError::api(SERVICE, format!("Failed to encode response: {}", e)))?;

        // The URL is signed without a content type
        let reply = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "")
            .body(body)
            .send()
            .await
            .map_err(|e| ServiceError::api(SERVICE, format!("PUT failed: {}", e)))?;

        let status = reply.status();
        if !status.is_success() {
            let text = reply.text().await.unwrap_or_default();
            return Err(ServiceError::api(
                SERVICE,
                format!("PUT returned {}: {}", status, text),
            ));
        }

        info!(status = status.as_u16(), "Custom resource response delivered");
        Ok(())
    }
}
