//! Seams to the external systems the handlers drive.
//!
//! The Lambda crate implements these over the AWS SDK, GitHub and the
//! pre-signed response URL; tests implement them with in-memory fakes.

use crate::error::Result;
use crate::response::CustomResourceResponse;
use crate::status::{BuildStatus, JobStatus, StackStatus};
use async_trait::async_trait;
use std::collections::HashMap;

/// Build service (CodeBuild)
#[async_trait]
pub trait BuildRunner: Send + Sync {
    /// Start a build of `project` and return its id.
    async fn start_build(&self, project: &str) -> Result<String>;

    async fn build_status(&self, build_id: &str) -> Result<BuildStatus>;

    /// Id of the most recent build of `project`, if any.
    async fn latest_build(&self, project: &str) -> Result<Option<String>>;
}

/// Stack management (CloudFormation)
#[async_trait]
pub trait StackManager: Send + Sync {
    /// Request deletion of `stack_name`, performed under `role_arn`.
    async fn delete_stack(&self, stack_name: &str, role_arn: &str) -> Result<()>;

    /// `NotFound` once the stack is gone.
    async fn stack_status(&self, stack_name: &str) -> Result<StackStatus>;

    async fn stack_outputs(&self, stack_name: &str) -> Result<HashMap<String, String>>;
}

/// Amplify backend environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEnvironment {
    pub environment_name: String,
    pub stack_name: Option<String>,
    /// Bucket holding the backend's deployment artifacts
    pub deployment_artifacts: Option<String>,
}

/// Amplify deployment job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub job_id: String,
    pub commit_id: String,
    pub status: JobStatus,
}

/// Application hosting (Amplify)
#[async_trait]
pub trait AmplifyBackend: Send + Sync {
    /// `NotFound` when the app has no such environment.
    async fn backend_environment(
        &self,
        app_id: &str,
        environment: &str,
    ) -> Result<BackendEnvironment>;

    /// The job building `commit_id` on `branch`, if Amplify has started one.
    async fn find_job(
        &self,
        app_id: &str,
        branch: &str,
        commit_id: &str,
    ) -> Result<Option<JobSummary>>;

    /// Create an incoming webhook for `branch` and return its URL.
    async fn create_webhook(&self, app_id: &str, branch: &str, description: &str)
        -> Result<String>;
}

/// Object storage (S3)
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Delete every object in `bucket`, then the bucket. `NotFound` if it is already gone.
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;
}

/// Head of a branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    pub sha: String,
    pub tree: String,
}

/// Source control (GitHub)
#[async_trait]
pub trait SourceControl: Send + Sync {
    async fn latest_commit(&self, branch: &str) -> Result<CommitRef>;

    /// Create a commit with `parent`'s tree on top of `parent` and move `branch` to it.
    async fn create_commit(&self, branch: &str, parent: &CommitRef, message: &str)
        -> Result<String>;

    /// Register a repository webhook delivering `events` to `url`.
    async fn create_webhook(&self, url: &str, events: &[&str]) -> Result<()>;
}

/// Delivery of the outcome callback
#[async_trait]
pub trait ResponseSender: Send + Sync {
    async fn send(&self, url: &str, response: &CustomResourceResponse) -> Result<()>;
}
