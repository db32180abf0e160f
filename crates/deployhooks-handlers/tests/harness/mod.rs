//! In-memory fakes for handler tests
//!
//! Each fake replays a script of results and records every call it receives,
//! so tests can assert both the callback and the side effects (or lack of them).

#![allow(dead_code)]

use async_trait::async_trait;
use deployhooks_core::{
    AmplifyBackend, BackendEnvironment, BuildRunner, BuildStatus, CommitRef,
    CustomResourceResponse, JobStatus, JobSummary, LifecycleEvent, ObjectStore, RequestType,
    ResponseSender, Result, ServiceError, SourceControl, StackManager, StackStatus,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

pub const LOG_STREAM: &str = "2024/01/01/[$LATEST]abcdef";
pub const RESPONSE_URL: &str = "https://cfn-response.example.com/signed";

pub fn event(request_type: RequestType) -> LifecycleEvent {
    let physical_resource_id = match request_type {
        RequestType::Create => None,
        _ => Some("existing-physical-id".to_string()),
    };
    LifecycleEvent {
        request_type,
        response_url: RESPONSE_URL.to_string(),
        stack_id: "arn:aws:cloudformation:us-east-1:123456789012:stack/dce/guid".to_string(),
        request_id: "req-1".to_string(),
        resource_type: "Custom::Deployment".to_string(),
        logical_resource_id: "Deployment".to_string(),
        physical_resource_id,
        resource_properties: serde_json::json!({}),
        old_resource_properties: None,
    }
}

fn next<T: Clone>(script: &Mutex<VecDeque<Result<T>>>, fallback: Result<T>) -> Result<T> {
    let mut script = script.lock().unwrap();
    match script.len() {
        0 => fallback,
        // The last entry repeats forever
        1 => script.front().cloned().unwrap(),
        _ => script.pop_front().unwrap(),
    }
}

#[derive(Default)]
pub struct FakeBuilds {
    pub start_error: Mutex<Option<ServiceError>>,
    pub statuses: Mutex<VecDeque<Result<BuildStatus>>>,
    pub latest: Mutex<Option<Result<Option<String>>>>,
    pub started: Mutex<Vec<String>>,
    pub queried: Mutex<Vec<(String, Instant)>>,
    pub latest_calls: Mutex<Vec<String>>,
}

impl FakeBuilds {
    pub fn with_statuses(statuses: impl IntoIterator<Item = BuildStatus>) -> Arc<Self> {
        let fake = Self::default();
        *fake.statuses.lock().unwrap() = statuses.into_iter().map(Ok).collect();
        Arc::new(fake)
    }

    pub fn with_results(results: impl IntoIterator<Item = Result<BuildStatus>>) -> Arc<Self> {
        let fake = Self::default();
        *fake.statuses.lock().unwrap() = results.into_iter().collect();
        Arc::new(fake)
    }

    pub fn failing_start(err: ServiceError) -> Arc<Self> {
        let fake = Self::default();
        *fake.start_error.lock().unwrap() = Some(err);
        Arc::new(fake)
    }

    pub fn set_latest(&self, latest: Result<Option<String>>) {
        *self.latest.lock().unwrap() = Some(latest);
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn queried(&self) -> Vec<(String, Instant)> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildRunner for FakeBuilds {
    async fn start_build(&self, project: &str) -> Result<String> {
        if let Some(err) = self.start_error.lock().unwrap().clone() {
            return Err(err);
        }
        let mut started = self.started.lock().unwrap();
        started.push(project.to_string());
        Ok(format!("{}:B{}", project, started.len()))
    }

    async fn build_status(&self, build_id: &str) -> Result<BuildStatus> {
        self.queried
            .lock()
            .unwrap()
            .push((build_id.to_string(), Instant::now()));
        next(&self.statuses, Ok(BuildStatus::Succeeded))
    }

    async fn latest_build(&self, project: &str) -> Result<Option<String>> {
        self.latest_calls.lock().unwrap().push(project.to_string());
        self.latest.lock().unwrap().clone().unwrap_or(Ok(None))
    }
}

#[derive(Default)]
pub struct FakeStacks {
    pub delete_error: Mutex<Option<ServiceError>>,
    pub statuses: Mutex<VecDeque<Result<StackStatus>>>,
    pub outputs: Mutex<HashMap<String, String>>,
    pub deleted: Mutex<Vec<(String, String)>>,
    pub status_calls: Mutex<u32>,
}

impl FakeStacks {
    pub fn with_statuses(statuses: impl IntoIterator<Item = Result<StackStatus>>) -> Arc<Self> {
        let fake = Self::default();
        *fake.statuses.lock().unwrap() = statuses.into_iter().collect();
        Arc::new(fake)
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> u32 {
        *self.status_calls.lock().unwrap()
    }
}

#[async_trait]
impl StackManager for FakeStacks {
    async fn delete_stack(&self, stack_name: &str, role_arn: &str) -> Result<()> {
        if let Some(err) = self.delete_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.deleted
            .lock()
            .unwrap()
            .push((stack_name.to_string(), role_arn.to_string()));
        Ok(())
    }

    async fn stack_status(&self, stack_name: &str) -> Result<StackStatus> {
        *self.status_calls.lock().unwrap() += 1;
        next(
            &self.statuses,
            Err(ServiceError::not_found("cloudformation", stack_name)),
        )
    }

    async fn stack_outputs(&self, _stack_name: &str) -> Result<HashMap<String, String>> {
        Ok(self.outputs.lock().unwrap().clone())
    }
}

pub struct FakeAmplify {
    pub backend: Mutex<Result<BackendEnvironment>>,
    pub jobs: Mutex<VecDeque<Result<Option<JobStatus>>>>,
    pub webhook_error: Mutex<Option<ServiceError>>,
    pub backend_calls: Mutex<u32>,
    pub job_lookups: Mutex<Vec<String>>,
    pub webhooks: Mutex<Vec<String>>,
}

impl FakeAmplify {
    pub fn with_backend(backend: Result<BackendEnvironment>) -> Arc<Self> {
        Arc::new(Self {
            backend: Mutex::new(backend),
            jobs: Mutex::new(VecDeque::new()),
            webhook_error: Mutex::new(None),
            backend_calls: Mutex::new(0),
            job_lookups: Mutex::new(Vec::new()),
            webhooks: Mutex::new(Vec::new()),
        })
    }

    /// Backend `dev` with stack `amplify-app-dev`
    pub fn with_stack() -> Arc<Self> {
        Self::with_backend(Ok(BackendEnvironment {
            environment_name: "dev".to_string(),
            stack_name: Some("amplify-app-dev".to_string()),
            deployment_artifacts: Some("amplify-app-dev-deployment".to_string()),
        }))
    }

    pub fn missing() -> Arc<Self> {
        Self::with_backend(Err(ServiceError::not_found("amplify", "app/dev")))
    }

    pub fn set_jobs(&self, jobs: impl IntoIterator<Item = Result<Option<JobStatus>>>) {
        *self.jobs.lock().unwrap() = jobs.into_iter().collect();
    }

    pub fn backend_calls(&self) -> u32 {
        *self.backend_calls.lock().unwrap()
    }

    pub fn job_lookups(&self) -> Vec<String> {
        self.job_lookups.lock().unwrap().clone()
    }

    pub fn webhooks(&self) -> Vec<String> {
        self.webhooks.lock().unwrap().clone()
    }
}

#[async_trait]
impl AmplifyBackend for FakeAmplify {
    async fn backend_environment(
        &self,
        _app_id: &str,
        _environment: &str,
    ) -> Result<BackendEnvironment> {
        *self.backend_calls.lock().unwrap() += 1;
        self.backend.lock().unwrap().clone()
    }

    async fn find_job(
        &self,
        _app_id: &str,
        _branch: &str,
        commit_id: &str,
    ) -> Result<Option<JobSummary>> {
        self.job_lookups.lock().unwrap().push(commit_id.to_string());
        let status = next(&self.jobs, Ok(Some(JobStatus::Succeed)))?;
        Ok(status.map(|status| JobSummary {
            job_id: "1".to_string(),
            commit_id: commit_id.to_string(),
            status,
        }))
    }

    async fn create_webhook(
        &self,
        app_id: &str,
        branch: &str,
        _description: &str,
    ) -> Result<String> {
        if let Some(err) = self.webhook_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.webhooks.lock().unwrap().push(branch.to_string());
        Ok(format!("https://webhooks.amplify.example.com/{}/{}", app_id, branch))
    }
}

#[derive(Default)]
pub struct FakeObjects {
    pub error: Mutex<Option<ServiceError>>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeObjects {
    pub fn failing(err: ServiceError) -> Arc<Self> {
        let fake = Self::default();
        *fake.error.lock().unwrap() = Some(err);
        Arc::new(fake)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FakeObjects {
    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(bucket.to_string());
        match self.error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct FakeSource {
    pub head_error: Mutex<Option<ServiceError>>,
    pub commits: Mutex<Vec<(String, CommitRef, String)>>,
    pub webhooks: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeSource {
    pub fn commits(&self) -> Vec<(String, CommitRef, String)> {
        self.commits.lock().unwrap().clone()
    }

    pub fn webhooks(&self) -> Vec<(String, Vec<String>)> {
        self.webhooks.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceControl for FakeSource {
    async fn latest_commit(&self, branch: &str) -> Result<CommitRef> {
        if let Some(err) = self.head_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(CommitRef {
            sha: format!("{}-head", branch),
            tree: "tree-1".to_string(),
        })
    }

    async fn create_commit(
        &self,
        branch: &str,
        parent: &CommitRef,
        message: &str,
    ) -> Result<String> {
        let mut commits = self.commits.lock().unwrap();
        commits.push((branch.to_string(), parent.clone(), message.to_string()));
        Ok(format!("commit-{}", commits.len()))
    }

    async fn create_webhook(&self, url: &str, events: &[&str]) -> Result<()> {
        self.webhooks.lock().unwrap().push((
            url.to_string(),
            events.iter().map(|e| e.to_string()).collect(),
        ));
        Ok(())
    }
}

/// Captures every callback instead of sending it
#[derive(Default)]
pub struct RecordingSender {
    pub fail: bool,
    pub sent: Mutex<Vec<(String, CustomResourceResponse)>>,
}

impl RecordingSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<(String, CustomResourceResponse)> {
        self.sent.lock().unwrap().clone()
    }

    /// The single callback; panics unless exactly one was sent.
    pub fn only(&self) -> CustomResourceResponse {
        let sent = self.sent();
        assert_eq!(sent.len(), 1, "expected exactly one callback, got {:?}", sent);
        sent[0].1.clone()
    }
}

#[async_trait]
impl ResponseSender for RecordingSender {
    async fn send(&self, url: &str, response: &CustomResourceResponse) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), response.clone()));
        if self.fail {
            return Err(ServiceError::api("response", "connection reset"));
        }
        Ok(())
    }
}
