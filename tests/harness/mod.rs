//! Fakes for end-to-end tests
//!
//! AWS collaborators are faked in memory; the response URL is a real HTTP
//! endpoint served by wiremock.

#![allow(dead_code)]

use async_trait::async_trait;
use deployhooks::core::{
    AmplifyBackend, BackendEnvironment, BuildRunner, BuildStatus, JobSummary, LifecycleEvent,
    ObjectStore, Result, ServiceError, StackManager, StackStatus,
};
use deployhooks::Services;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// CodeBuild replaying a fixed status sequence
pub struct ScriptedBuilds {
    statuses: Mutex<VecDeque<BuildStatus>>,
    pub started: Mutex<Vec<String>>,
}

impl ScriptedBuilds {
    pub fn new(statuses: impl IntoIterator<Item = BuildStatus>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.into_iter().collect()),
            started: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl BuildRunner for ScriptedBuilds {
    async fn start_build(&self, project: &str) -> Result<String> {
        self.started.lock().unwrap().push(project.to_string());
        Ok(format!("{}:B1", project))
    }

    async fn build_status(&self, _build_id: &str) -> Result<BuildStatus> {
        let mut statuses = self.statuses.lock().unwrap();
        Ok(if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().cloned().unwrap_or(BuildStatus::Succeeded)
        })
    }

    async fn latest_build(&self, _project: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Amplify app without a backend environment
pub struct NoBackend;

#[async_trait]
impl AmplifyBackend for NoBackend {
    async fn backend_environment(
        &self,
        app_id: &str,
        environment: &str,
    ) -> Result<BackendEnvironment> {
        Err(ServiceError::not_found(
            "amplify",
            format!("{}/{}", app_id, environment),
        ))
    }

    async fn find_job(&self, _: &str, _: &str, _: &str) -> Result<Option<JobSummary>> {
        Ok(None)
    }

    async fn create_webhook(&self, _: &str, _: &str, _: &str) -> Result<String> {
        Err(ServiceError::api("amplify", "not supported"))
    }
}

/// Stacks and buckets that are already gone
pub struct Gone;

#[async_trait]
impl StackManager for Gone {
    async fn delete_stack(&self, stack_name: &str, _role_arn: &str) -> Result<()> {
        Err(ServiceError::not_found("cloudformation", stack_name))
    }

    async fn stack_status(&self, stack_name: &str) -> Result<StackStatus> {
        Err(ServiceError::not_found("cloudformation", stack_name))
    }

    async fn stack_outputs(&self, _stack_name: &str) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }
}

#[async_trait]
impl ObjectStore for Gone {
    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        Err(ServiceError::not_found("s3", bucket))
    }
}

pub fn services(builds: Arc<ScriptedBuilds>) -> Services {
    Services {
        builds,
        stacks: Arc::new(Gone),
        amplify: Arc::new(NoBackend),
        objects: Arc::new(Gone),
        source: None,
    }
}

/// Lifecycle event as CloudFormation delivers it
pub fn event(request_type: &str, response_url: &str) -> LifecycleEvent {
    let mut event = serde_json::json!({
        "RequestType": request_type,
        "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:deployhooks",
        "ResponseURL": response_url,
        "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/dce/guid",
        "RequestId": "5d478078-13e9-baf0-464a-7ef285ecc786",
        "LogicalResourceId": "Deployment",
        "ResourceType": "Custom::Deployment",
        "ResourceProperties": {
            "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:deployhooks"
        }
    });
    if request_type != "Create" {
        event["PhysicalResourceId"] = serde_json::json!("2024/01/01/[$LATEST]first");
    }
    serde_json::from_value(event).unwrap()
}
