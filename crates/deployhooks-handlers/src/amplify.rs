// Amplify app deployed by a CodeBuild project

use crate::codebuild::run_build;
use crate::dispatch::{Invocation, LifecycleHandler};
use crate::teardown::BackendTeardown;
use crate::Outcome;
use async_trait::async_trait;
use deployhooks_core::BuildRunner;
use std::sync::Arc;

pub struct AmplifyHandler {
    builds: Arc<dyn BuildRunner>,
    deploy_project: String,
    teardown: BackendTeardown,
}

impl AmplifyHandler {
    pub fn new(
        builds: Arc<dyn BuildRunner>,
        deploy_project: impl Into<String>,
        teardown: BackendTeardown,
    ) -> Self {
        Self {
            builds,
            deploy_project: deploy_project.into(),
            teardown,
        }
    }
}

#[async_trait]
impl LifecycleHandler for AmplifyHandler {
    fn name(&self) -> &'static str {
        "amplify"
    }

    async fn create(&self, invocation: &Invocation) -> Outcome {
        run_build(
            self.builds.as_ref(),
            &invocation.poller,
            &self.deploy_project,
            "Amplify deploy",
        )
        .await
    }

    async fn delete(&self, invocation: &Invocation) -> Outcome {
        self.teardown.run(&invocation.poller).await
    }
}
