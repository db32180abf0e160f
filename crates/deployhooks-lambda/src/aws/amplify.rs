// Amplify: backend environments, deployment jobs, incoming webhooks

use super::api_error;
use async_trait::async_trait;
use aws_sdk_amplify::Client;
use deployhooks_core::{
    AmplifyBackend, BackendEnvironment, JobStatus, JobSummary, Result, ServiceError,
};

const SERVICE: &str = "amplify";

/// Jobs are listed newest first; the trigger commit is always among the latest few
const JOB_PAGE_SIZE: i32 = 20;

#[derive(Clone)]
pub struct AmplifyAdapter {
    client: Client,
}

impl AmplifyAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AmplifyBackend for AmplifyAdapter {
    async fn backend_environment(
        &self,
        app_id: &str,
        environment: &str,
    ) -> Result<BackendEnvironment> {
        let output = self
            .client
            .get_backend_environment()
            .app_id(app_id)
            .environment_name(environment)
            .send()
            .await
            .map_err(|err| {
                let missing = err
                    .as_service_error()
                    .is_some_and(|e| e.is_not_found_exception());
                if missing {
                    ServiceError::not_found(SERVICE, format!("{}/{}", app_id, environment))
                } else {
                    api_error(SERVICE, &err)
                }
            })?;

        let backend = output.backend_environment().ok_or_else(|| {
            ServiceError::not_found(SERVICE, format!("{}/{}", app_id, environment))
        })?;

        Ok(BackendEnvironment {
            environment_name: environment.to_string(),
            stack_name: backend.stack_name().map(str::to_string),
            deployment_artifacts: backend.deployment_artifacts().map(str::to_string),
        })
    }

    async fn find_job(
        &self,
        app_id: &str,
        branch: &str,
        commit_id: &str,
    ) -> Result<Option<JobSummary>> {
        let output = self
            .client
            .list_jobs()
            .app_id(app_id)
            .branch_name(branch)
            .max_results(JOB_PAGE_SIZE)
            .send()
            .await
            .map_err(|e| api_error(SERVICE, &e))?;

        Ok(output
            .job_summaries()
            .iter()
            .find(|job| job.commit_id() == commit_id)
            .map(|job| JobSummary {
                job_id: job.job_id().to_string(),
                commit_id: job.commit_id().to_string(),
                status: JobStatus::from(job.status().as_str()),
            }))
    }

    async fn create_webhook(
        &self,
        app_id: &str,
        branch: &str,
        description: &str,
    ) -> Result<String> {
        let output = self
            .client
            .create_webhook()
            .app_id(app_id)
            .branch_name(branch)
            .description(description)
            .send()
            .await
            .map_err(|e| api_error(SERVICE, &e))?;

        output
            .webhook()
            .map(|webhook| webhook.webhook_url().to_string())
            .ok_or_else(|| ServiceError::api(SERVICE, "CreateWebhook returned no webhook"))
    }
}
