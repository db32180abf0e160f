// CodeBuild: start builds, read their status, find the latest one

use super::api_error;
use async_trait::async_trait;
use aws_sdk_codebuild::types::SortOrderType;
use aws_sdk_codebuild::Client;
use deployhooks_core::{BuildRunner, BuildStatus, Result, ServiceError};
use tracing::debug;

const SERVICE: &str = "codebuild";

#[derive(Clone)]
pub struct CodeBuildAdapter {
    client: Client,
}

impl CodeBuildAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BuildRunner for CodeBuildAdapter {
    async fn start_build(&self, project: &str) -> Result<String> {
        let output = self
            .client
            .start_build()
            .project_name(project)
            .send()
            .await
            .map_err(|e| api_error(SERVICE, &e))?;

        output
            .build_value()
            .and_then(|build| build.id())
            .map(str::to_string)
            .ok_or_else(|| {
                ServiceError::api(
                    SERVICE,
                    format!("StartBuild for {} returned no build id", project),
                )
            })
    }

    async fn build_status(&self, build_id: &str) -> Result<BuildStatus> {
        let output = self
            .client
            .batch_get_builds()
            .ids(build_id)
            .send()
            .await
            .map_err(|e| api_error(SERVICE, &e))?;

        let build = output
            .builds()
            .first()
            .ok_or_else(|| ServiceError::not_found(SERVICE, build_id))?;

        let status = build
            .build_status()
            .map(|s| BuildStatus::from(s.as_str()))
            .unwrap_or(BuildStatus::InProgress);
        debug!(build_id, phase = ?build.current_phase(), %status, "CodeBuild build status");
        Ok(status)
    }

    async fn latest_build(&self, project: &str) -> Result<Option<String>> {
        let output = self
            .client
            .list_builds_for_project()
            .project_name(project)
            .sort_order(SortOrderType::Descending)
            .send()
            .await
            .map_err(|e| api_error(SERVICE, &e))?;

        Ok(output.ids().first().cloned())
    }
}
