// Amplify backend teardown
//
// Deletes the backend environment's CloudFormation stack under the deletion
// role, waits for it to disappear, then removes the deployment artifacts
// bucket on a best-effort basis.

use crate::Outcome;
use deployhooks_core::{
    AmplifyBackend, BackendEnvironment, ObjectStore, PollOutcome, Poller, ProviderStatus,
    StackManager, StackStatus,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Stack output Amplify uses for the deployment bucket
const DEPLOYMENT_BUCKET_OUTPUT: &str = "DeploymentBucketName";

const OPERATION: &str = "Amplify backend stack deletion";

pub struct BackendTeardown {
    amplify: Arc<dyn AmplifyBackend>,
    stacks: Arc<dyn StackManager>,
    /// `None` disables artifact cleanup
    objects: Option<Arc<dyn ObjectStore>>,
    app_id: String,
    environment: String,
    delete_role_arn: String,
}

impl BackendTeardown {
    pub fn new(
        amplify: Arc<dyn AmplifyBackend>,
        stacks: Arc<dyn StackManager>,
        objects: Option<Arc<dyn ObjectStore>>,
        app_id: impl Into<String>,
        environment: impl Into<String>,
        delete_role_arn: impl Into<String>,
    ) -> Self {
        Self {
            amplify,
            stacks,
            objects,
            app_id: app_id.into(),
            environment: environment.into(),
            delete_role_arn: delete_role_arn.into(),
        }
    }

    pub async fn run(&self, poller: &Poller) -> Outcome {
        let backend = match self
            .amplify
            .backend_environment(&self.app_id, &self.environment)
            .await
        {
            Ok(backend) => backend,
            Err(err) if err.is_not_found() => {
                info!(error = %err, "Could not find any Amplify backend stacks, skipping deletion");
                return Outcome::Succeeded;
            }
            Err(err) => {
                error!(error = %err, "Error when trying to look up Amplify backend environment");
                return Outcome::query_failed(
                    "look up Amplify backend environment",
                    err.to_string(),
                );
            }
        };

        let Some(stack_name) = backend.stack_name.clone() else {
            info!(
                environment = %backend.environment_name,
                "Amplify backend environment has no stack, skipping deletion"
            );
            return Outcome::Succeeded;
        };

        // Outputs are unreadable once the stack is gone
        let artifacts = self.artifacts_bucket(&backend, &stack_name).await;

        match self
            .stacks
            .delete_stack(&stack_name, &self.delete_role_arn)
            .await
        {
            Ok(()) => info!(
                stack_name = %stack_name,
                "Amplify backend stack deletion successfully started."
            ),
            Err(err) if err.is_not_found() => {
                info!(stack_name = %stack_name, "Amplify backend stack already deleted");
                return Outcome::Succeeded;
            }
            Err(err) => {
                error!(
                    stack_name = %stack_name,
                    error = %err,
                    "Error when trying to delete Amplify backend stack"
                );
                return Outcome::trigger_failed("delete Amplify backend stack", &err);
            }
        }

        let stacks = self.stacks.as_ref();
        let name = stack_name.as_str();
        let outcome = match poller
            .poll(name, StackStatus::IN_PROGRESS, move || stacks.stack_status(name))
            .await
        {
            Ok(PollOutcome::Terminal(status)) => Outcome::from_status(OPERATION, &status),
            Ok(PollOutcome::Absent) => {
                Outcome::from_status(OPERATION, &StackStatus::DeleteComplete)
            }
            Ok(PollOutcome::TimedOut { last, waited }) => {
                Outcome::timed_out(OPERATION, waited, last.as_ref())
            }
            Err(err) => Outcome::query_failed(OPERATION, err.to_string()),
        };

        if !outcome.is_success() {
            error!(
                stack_name = %stack_name,
                outcome = outcome.kind(),
                "Amplify backend stack failed deletion"
            );
            return outcome;
        }
        info!(stack_name = %stack_name, "Amplify backend stack successfully deleted.");

        if let Some(bucket) = artifacts {
            self.cleanup_bucket(&bucket).await;
        }
        outcome
    }

    async fn artifacts_bucket(
        &self,
        backend: &BackendEnvironment,
        stack_name: &str,
    ) -> Option<String> {
        self.objects.as_ref()?;

        if let Some(bucket) = backend.deployment_artifacts.clone() {
            return Some(bucket);
        }

        match self.stacks.stack_outputs(stack_name).await {
            Ok(outputs) => outputs.get(DEPLOYMENT_BUCKET_OUTPUT).cloned(),
            Err(err) => {
                warn!(stack_name, error = %err, "Could not read backend stack outputs");
                None
            }
        }
    }

    /// Failures are logged for manual follow-up and never change the outcome.
    async fn cleanup_bucket(&self, bucket: &str) {
        let Some(objects) = self.objects.as_ref() else {
            return;
        };

        match objects.delete_bucket(bucket).await {
            Ok(()) => info!(bucket, "Deleted Amplify deployment artifacts bucket"),
            Err(err) if err.is_not_found() => {
                info!(bucket, "Amplify deployment artifacts bucket already deleted")
            }
            Err(err) => warn!(
                bucket,
                error = %err,
                "Failed to delete Amplify deployment artifacts bucket, delete it manually"
            ),
        }
    }
}
