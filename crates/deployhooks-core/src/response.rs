//! Outcome callback sent to the pre-signed response URL.

use crate::error::Result;
use crate::event::LifecycleEvent;
use crate::services::ResponseSender;
use serde::{Deserialize, Serialize};
use tracing::info;

/// CloudFormation caps the whole response body at 4 KiB
const MAX_REASON_CHARS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Body PUT to the response URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// The not-yet-sent callback for one event.
///
/// `send` consumes it, so an event can be answered at most once.
#[derive(Debug)]
#[must_use = "every lifecycle event needs exactly one callback"]
pub struct PendingResponse {
    url: String,
    stack_id: String,
    request_id: String,
    logical_resource_id: String,
    physical_resource_id: String,
    log_stream_name: String,
}

impl PendingResponse {
    /// The physical id echoes the event's so `Update`/`Delete` never look
    /// like a replacement; `Create` falls back to the log stream name.
    pub fn for_event(event: &LifecycleEvent, log_stream_name: &str) -> Self {
        let physical_resource_id = event
            .physical_resource_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| log_stream_name.to_string());

        Self {
            url: event.response_url.clone(),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            physical_resource_id,
            log_stream_name: log_stream_name.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn physical_resource_id(&self) -> &str {
        &self.physical_resource_id
    }

    /// Build the response body for `status`.
    pub fn body(&self, status: ResponseStatus, reason: Option<&str>) -> CustomResourceResponse {
        let reason = match reason {
            Some(reason) if !reason.is_empty() => truncate(reason, MAX_REASON_CHARS),
            _ => format!(
                "See the details in CloudWatch Log Stream: {}",
                self.log_stream_name
            ),
        };

        CustomResourceResponse {
            status,
            reason,
            physical_resource_id: self.physical_resource_id.clone(),
            stack_id: self.stack_id.clone(),
            request_id: self.request_id.clone(),
            logical_resource_id: self.logical_resource_id.clone(),
            no_echo: false,
            data: serde_json::Map::new(),
        }
    }

    pub async fn send(
        self,
        sender: &dyn ResponseSender,
        status: ResponseStatus,
        reason: Option<&str>,
    ) -> Result<CustomResourceResponse> {
        let body = self.body(status, reason);
        info!(
            status = ?body.status,
            reason = %body.reason,
            physical_resource_id = %body.physical_resource_id,
            "Sending custom resource response"
        );
        sender.send(&self.url, &body).await?;
        Ok(body)
    }
}

fn truncate(reason: &str, max_chars: usize) -> String {
    match reason.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &reason[..idx]),
        None => reason.to_string(),
    }
}
