// AWS Lambda runtime adapter
//
// Loads configuration once per cold start, wires the AWS SDK clients, the
// GitHub client and the response sender into a Dispatcher, then serves
// custom-resource events until the runtime shuts down.

use anyhow::Context as _;
use deployhooks_config::{HandlerKind, RuntimeConfig};
use deployhooks_core::{LifecycleEvent, SourceControl};
use deployhooks_handlers::{build_handler, poll_settings, Dispatcher, Services};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub mod aws;
pub mod github;
mod init;
pub mod response;

pub use github::GitHubClient;
pub use init::init_tracing;
pub use response::HttpResponseSender;

/// Lambda handler for custom-resource events
///
/// Always returns `Ok`: the callback is the outcome, and a runtime error would
/// make Lambda retry the event and start the builds again.
async fn handle_event(
    event: LambdaEvent<LifecycleEvent>,
    dispatcher: Arc<Dispatcher>,
    deadline_margin: Duration,
) -> Result<(), Error> {
    let (event, context) = event.into_parts();

    let remaining = remaining_time(
        context.deadline,
        chrono::Utc::now().timestamp_millis(),
        deadline_margin,
    );
    info!(
        aws_request_id = %context.request_id,
        budget_secs = remaining.as_secs(),
        "Received custom resource event"
    );
    let deadline = tokio::time::Instant::now() + remaining;

    if let Err(err) = dispatcher.dispatch(event, Some(deadline)).await {
        error!(error = %err, "Custom resource response was not delivered");
    }
    Ok(())
}

/// Time left for polling before the invocation deadline (epoch millis), minus `margin`.
pub fn remaining_time(deadline_ms: u64, now_ms: i64, margin: Duration) -> Duration {
    let now_ms = u64::try_from(now_ms).unwrap_or(0);
    Duration::from_millis(deadline_ms.saturating_sub(now_ms)).saturating_sub(margin)
}

/// Build the dispatcher for `config` on top of the given AWS SDK configuration.
pub fn build_dispatcher(
    config: &RuntimeConfig,
    sdk_config: &aws_config::SdkConfig,
) -> anyhow::Result<Dispatcher> {
    let adapters = aws::AwsAdapters::from_config(sdk_config);

    let source: Option<Arc<dyn SourceControl>> = match config.handler_kind()? {
        HandlerKind::AmplifyGit => {
            let git = config
                .git
                .as_ref()
                .context("amplify-git handler requires 'git' configuration")?;
            Some(Arc::new(GitHubClient::new(git)?))
        }
        _ => None,
    };

    let services = Services {
        builds: Arc::new(adapters.codebuild),
        stacks: Arc::new(adapters.cloudformation),
        amplify: Arc::new(adapters.amplify),
        objects: Arc::new(adapters.s3),
        source,
    };

    let handler = build_handler(config, services)?;
    let sender = Arc::new(HttpResponseSender::new()?);

    Ok(Dispatcher::new(
        handler,
        sender,
        poll_settings(config),
        config.log_stream_name.clone(),
    ))
}

/// Lambda runtime entry point
pub async fn run() -> Result<(), Error> {
    let config = RuntimeConfig::load()
        .map_err(|e| Error::from(format!("Failed to load configuration: {:#}", e)))?;
    init_tracing(&config.log);

    let kind = config.handler_kind().map_err(|e| Error::from(e.to_string()))?;
    info!(
        handler = %kind,
        interval_secs = config.poll.interval_secs,
        max_wait_secs = config.poll.max_wait_secs,
        "Starting deployhooks Lambda"
    );

    let sdk_config = aws_config::load_from_env().await;
    let dispatcher = Arc::new(
        build_dispatcher(&config, &sdk_config)
            .map_err(|e| Error::from(format!("Failed to initialize handler: {:#}", e)))?,
    );
    let deadline_margin = config.poll.deadline_margin();

    lambda_runtime::run(service_fn(move |event: LambdaEvent<LifecycleEvent>| {
        let dispatcher = dispatcher.clone();
        async move { handle_event(event, dispatcher, deadline_margin).await }
    }))
    .await
}
