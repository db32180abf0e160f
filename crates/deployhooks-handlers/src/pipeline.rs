// Amplify app deployed by pushing a commit to its source branch
//
// Create pushes an empty commit (same tree, parent = branch head) and waits
// for the Amplify job building that commit.

use crate::dispatch::{Invocation, LifecycleHandler};
use crate::teardown::BackendTeardown;
use crate::Outcome;
use async_trait::async_trait;
use deployhooks_core::{
    AmplifyBackend, JobStatus, PollOutcome, ProviderStatus, ServiceError, SourceControl,
};
use std::sync::Arc;
use tracing::{error, info};

const WEBHOOK_EVENTS: &[&str] = &["push"];

pub struct AmplifyGitHandler {
    amplify: Arc<dyn AmplifyBackend>,
    source: Arc<dyn SourceControl>,
    app_id: String,
    amplify_branch: String,
    repository_branch: String,
    commit_message: String,
    register_webhook: bool,
    teardown: BackendTeardown,
}

/// Where the handler pushes and what it watches
#[derive(Debug, Clone)]
pub struct GitTarget {
    pub app_id: String,
    pub amplify_branch: String,
    pub repository_branch: String,
    pub commit_message: String,
    pub register_webhook: bool,
}

impl AmplifyGitHandler {
    pub fn new(
        amplify: Arc<dyn AmplifyBackend>,
        source: Arc<dyn SourceControl>,
        target: GitTarget,
        teardown: BackendTeardown,
    ) -> Self {
        Self {
            amplify,
            source,
            app_id: target.app_id,
            amplify_branch: target.amplify_branch,
            repository_branch: target.repository_branch,
            commit_message: target.commit_message,
            register_webhook: target.register_webhook,
            teardown,
        }
    }

    /// Route repository pushes to an Amplify incoming webhook.
    async fn install_webhook(&self) -> Result<(), Outcome> {
        let description = format!("deployhooks trigger for {}", self.amplify_branch);
        let url = self
            .amplify
            .create_webhook(&self.app_id, &self.amplify_branch, &description)
            .await
            .map_err(|err| {
                error!(error = %err, "Error when trying to create Amplify webhook");
                Outcome::trigger_failed("create Amplify webhook", &err)
            })?;

        self.source
            .create_webhook(&url, WEBHOOK_EVENTS)
            .await
            .map_err(|err| {
                error!(error = %err, "Error when trying to register repository webhook");
                Outcome::trigger_failed("register repository webhook", &err)
            })?;

        info!(branch = %self.amplify_branch, "Repository webhook registered");
        Ok(())
    }

    async fn push_trigger_commit(&self) -> Result<String, Outcome> {
        let head = self
            .source
            .latest_commit(&self.repository_branch)
            .await
            .map_err(|err| {
                error!(
                    branch = %self.repository_branch,
                    error = %err,
                    "Error when reading branch head"
                );
                Outcome::trigger_failed("read branch head", &err)
            })?;

        let sha = self
            .source
            .create_commit(&self.repository_branch, &head, &self.commit_message)
            .await
            .map_err(|err| {
                error!(
                    branch = %self.repository_branch,
                    error = %err,
                    "Error when creating trigger commit"
                );
                Outcome::trigger_failed("create trigger commit", &err)
            })?;

        info!(
            branch = %self.repository_branch,
            parent = %head.sha,
            commit = %sha,
            "Trigger commit pushed"
        );
        Ok(sha)
    }
}

#[async_trait]
impl LifecycleHandler for AmplifyGitHandler {
    fn name(&self) -> &'static str {
        "amplify-git"
    }

    async fn create(&self, invocation: &Invocation) -> Outcome {
        if self.register_webhook {
            if let Err(outcome) = self.install_webhook().await {
                return outcome;
            }
        }

        let commit = match self.push_trigger_commit().await {
            Ok(sha) => sha,
            Err(outcome) => return outcome,
        };

        let operation = "Amplify deployment job";
        let amplify = self.amplify.as_ref();
        let app_id = self.app_id.as_str();
        let branch = self.amplify_branch.as_str();
        let commit_id = commit.as_str();

        // A job Amplify has not created yet counts as pending
        let result = invocation
            .poller
            .poll(commit_id, JobStatus::IN_PROGRESS, move || async move {
                let job = amplify.find_job(app_id, branch, commit_id).await?;
                Ok::<_, ServiceError>(job.map_or(JobStatus::Pending, |job| job.status))
            })
            .await;

        let outcome = match result {
            Ok(PollOutcome::Terminal(status)) => Outcome::from_status(operation, &status),
            Ok(PollOutcome::Absent) => {
                Outcome::query_failed(operation, format!("Amplify app {} not found", app_id))
            }
            Ok(PollOutcome::TimedOut { last, waited }) => {
                Outcome::timed_out(operation, waited, last.as_ref())
            }
            Err(err) => Outcome::query_failed(operation, err.to_string()),
        };

        if outcome.is_success() {
            info!(commit = %commit, "Amplify deployment successfully finished.");
        } else {
            error!(commit = %commit, outcome = outcome.kind(), "Amplify deployment failed");
        }
        outcome
    }

    async fn delete(&self, invocation: &Invocation) -> Outcome {
        self.teardown.run(&invocation.poller).await
    }
}
