// Lifecycle event dispatch
//
// Routes an event to the handler by request type and answers it with exactly
// one callback, whatever the handler did (including panicking).

use crate::Outcome;
use async_trait::async_trait;
use deployhooks_core::{
    CustomResourceResponse, LifecycleEvent, PendingResponse, PollSettings, Poller, RequestType,
    ResponseSender, ServiceError,
};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// One event being processed, with the poller bounded for this invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub event: LifecycleEvent,
    pub poller: Poller,
}

/// Per-handler behaviour for each request type
#[async_trait]
pub trait LifecycleHandler: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn create(&self, invocation: &Invocation) -> Outcome;

    async fn delete(&self, invocation: &Invocation) -> Outcome;

    /// No handler implements differential updates.
    async fn update(&self, invocation: &Invocation) -> Outcome {
        Outcome::Ignored {
            request_type: invocation.event.request_type.to_string(),
        }
    }
}

pub struct Dispatcher {
    handler: Arc<dyn LifecycleHandler>,
    sender: Arc<dyn ResponseSender>,
    poll: PollSettings,
    log_stream_name: String,
}

impl Dispatcher {
    pub fn new(
        handler: Arc<dyn LifecycleHandler>,
        sender: Arc<dyn ResponseSender>,
        poll: PollSettings,
        log_stream_name: impl Into<String>,
    ) -> Self {
        Self {
            handler,
            sender,
            poll,
            log_stream_name: log_stream_name.into(),
        }
    }

    /// Process `event` to completion and send its callback.
    ///
    /// `deadline` bounds every wait of this invocation. The returned body is
    /// the one that was delivered; a delivery failure is returned, not retried.
    pub async fn dispatch(
        &self,
        event: LifecycleEvent,
        deadline: Option<Instant>,
    ) -> Result<CustomResourceResponse, ServiceError> {
        let pending = PendingResponse::for_event(&event, &self.log_stream_name);

        info!(
            handler = self.handler.name(),
            request_type = %event.request_type,
            request_id = %event.request_id,
            logical_resource_id = %event.logical_resource_id,
            "Handling lifecycle event"
        );

        let settings = match deadline {
            Some(deadline) => self.poll.with_deadline(deadline),
            None => self.poll,
        };
        let invocation = Invocation {
            event,
            poller: Poller::new(settings),
        };

        let handler = Arc::clone(&self.handler);
        let outcome = match tokio::spawn(async move { route(handler.as_ref(), &invocation).await })
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "Handler task did not complete");
                Outcome::Internal {
                    message: if err.is_panic() {
                        "Handler panicked, see the function logs".to_string()
                    } else {
                        "Handler was cancelled".to_string()
                    },
                }
            }
        };

        if outcome.is_success() {
            info!(outcome = outcome.kind(), "Lifecycle event finished");
        } else {
            warn!(
                outcome = outcome.kind(),
                reason = %outcome.reason().unwrap_or_default(),
                "Lifecycle event failed"
            );
        }

        let reason = outcome.reason();
        match pending
            .send(self.sender.as_ref(), outcome.status(), reason.as_deref())
            .await
        {
            Ok(body) => Ok(body),
            Err(err) => {
                error!(error = %err, "Failed to deliver custom resource response");
                Err(err)
            }
        }
    }
}

async fn route(handler: &dyn LifecycleHandler, invocation: &Invocation) -> Outcome {
    match &invocation.event.request_type {
        RequestType::Create => handler.create(invocation).await,
        RequestType::Delete => handler.delete(invocation).await,
        RequestType::Update => {
            info!("RequestType Update will be ignored.");
            handler.update(invocation).await
        }
        RequestType::Other(request_type) => {
            info!("RequestType {} will be ignored.", request_type);
            Outcome::Ignored {
                request_type: request_type.clone(),
            }
        }
    }
}
