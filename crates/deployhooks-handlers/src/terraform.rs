// Terraform stack applied and destroyed by two CodeBuild projects

use crate::codebuild::{run_build, wait_for_build};
use crate::dispatch::{Invocation, LifecycleHandler};
use crate::Outcome;
use async_trait::async_trait;
use deployhooks_core::{BuildRunner, DEFAULT_PRECHECK_DELAY};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub struct TerraformHandler {
    builds: Arc<dyn BuildRunner>,
    deploy_project: String,
    destroy_project: String,
    precheck_delay: Duration,
}

impl TerraformHandler {
    pub fn new(
        builds: Arc<dyn BuildRunner>,
        deploy_project: impl Into<String>,
        destroy_project: impl Into<String>,
    ) -> Self {
        Self {
            builds,
            deploy_project: deploy_project.into(),
            destroy_project: destroy_project.into(),
            precheck_delay: DEFAULT_PRECHECK_DELAY,
        }
    }

    pub fn with_precheck_delay(mut self, delay: Duration) -> Self {
        self.precheck_delay = delay;
        self
    }

    /// A destroy must not race a deploy that is still running.
    async fn wait_for_running_deploy(&self, invocation: &Invocation) -> Option<Outcome> {
        info!(
            project = %self.deploy_project,
            "Checking if CodeBuild 'deploy' project has already finished before we start to destroy it."
        );
        if !invocation.poller.pause(self.precheck_delay).await {
            return Some(Outcome::timed_out::<String>(
                "deploy pre-check",
                Duration::ZERO,
                None,
            ));
        }

        let latest = match self.builds.latest_build(&self.deploy_project).await {
            Ok(latest) => latest,
            Err(err) => {
                error!(error = %err, "Error when listing CodeBuild 'deploy' builds");
                return Some(Outcome::query_failed("list deploy builds", err.to_string()));
            }
        };

        let Some(build_id) = latest else {
            return None;
        };
        match wait_for_build(self.builds.as_ref(), &invocation.poller, &build_id, "deploy").await {
            // The deploy's own result does not matter, only that it has finished
            outcome @ (Outcome::Succeeded | Outcome::TerminalFailure { .. }) => {
                info!(
                    build_id = %build_id,
                    previous = outcome.kind(),
                    "Previous deploy build finished"
                );
                None
            }
            outcome => {
                error!(
                    build_id = %build_id,
                    outcome = outcome.kind(),
                    "Could not confirm the previous deploy build finished"
                );
                Some(outcome)
            }
        }
    }
}

#[async_trait]
impl LifecycleHandler for TerraformHandler {
    fn name(&self) -> &'static str {
        "terraform"
    }

    async fn create(&self, invocation: &Invocation) -> Outcome {
        run_build(
            self.builds.as_ref(),
            &invocation.poller,
            &self.deploy_project,
            "deploy",
        )
        .await
    }

    async fn delete(&self, invocation: &Invocation) -> Outcome {
        if let Some(outcome) = self.wait_for_running_deploy(invocation).await {
            return outcome;
        }

        run_build(
            self.builds.as_ref(),
            &invocation.poller,
            &self.destroy_project,
            "destroy",
        )
        .await
    }
}
