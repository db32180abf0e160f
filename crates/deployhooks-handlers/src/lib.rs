// deployhooks-handlers - Custom-resource handlers
//
// Each handler turns Create/Delete into a triggered external operation plus a
// poll loop, and returns an Outcome; the Dispatcher turns that Outcome into
// exactly one callback.

use anyhow::{Context, Result};
use deployhooks_config::{HandlerKind, RuntimeConfig};
use deployhooks_core::{
    AmplifyBackend, BuildRunner, ObjectStore, PollSettings, SourceControl, StackManager,
};
use std::sync::Arc;

mod amplify;
mod codebuild;
mod dispatch;
mod outcome;
mod pipeline;
mod teardown;
mod terraform;

pub use amplify::AmplifyHandler;
pub use dispatch::{Dispatcher, Invocation, LifecycleHandler};
pub use outcome::Outcome;
pub use pipeline::{AmplifyGitHandler, GitTarget};
pub use teardown::BackendTeardown;
pub use terraform::TerraformHandler;

/// External collaborators available to the handlers
#[derive(Clone)]
pub struct Services {
    pub builds: Arc<dyn BuildRunner>,
    pub stacks: Arc<dyn StackManager>,
    pub amplify: Arc<dyn AmplifyBackend>,
    pub objects: Arc<dyn ObjectStore>,
    /// Only needed by the amplify-git handler
    pub source: Option<Arc<dyn SourceControl>>,
}

/// Poll settings from the configuration (without the per-invocation deadline).
pub fn poll_settings(config: &RuntimeConfig) -> PollSettings {
    PollSettings::new(config.poll.interval()).with_max_wait(config.poll.max_wait())
}

/// Build the handler selected by `config`.
pub fn build_handler(
    config: &RuntimeConfig,
    services: Services,
) -> Result<Arc<dyn LifecycleHandler>> {
    let handler: Arc<dyn LifecycleHandler> = match config.handler_kind()? {
        HandlerKind::Terraform => {
            let terraform = config
                .terraform
                .as_ref()
                .context("terraform handler requires 'terraform' configuration")?;
            Arc::new(
                TerraformHandler::new(
                    services.builds,
                    &terraform.deploy_project,
                    &terraform.destroy_project,
                )
                .with_precheck_delay(config.poll.precheck_delay()),
            )
        }
        HandlerKind::Amplify => {
            let teardown = backend_teardown(config, &services)?;
            let deploy_project = config
                .amplify
                .as_ref()
                .and_then(|a| a.deploy_project.clone())
                .context("amplify handler requires an Amplify deploy project")?;
            Arc::new(AmplifyHandler::new(services.builds, deploy_project, teardown))
        }
        HandlerKind::AmplifyGit => {
            let teardown = backend_teardown(config, &services)?;
            let amplify = config
                .amplify
                .as_ref()
                .context("amplify-git handler requires 'amplify' configuration")?;
            let git = config
                .git
                .as_ref()
                .context("amplify-git handler requires 'git' configuration")?;
            let source = services
                .source
                .clone()
                .context("amplify-git handler requires a source control client")?;

            let target = GitTarget {
                app_id: amplify.app_id.clone(),
                amplify_branch: amplify.branch.clone(),
                repository_branch: if git.branch.is_empty() {
                    amplify.branch.clone()
                } else {
                    git.branch.clone()
                },
                commit_message: git.commit_message.clone(),
                register_webhook: git.register_webhook,
            };
            Arc::new(AmplifyGitHandler::new(services.amplify, source, target, teardown))
        }
    };

    Ok(handler)
}

fn backend_teardown(config: &RuntimeConfig, services: &Services) -> Result<BackendTeardown> {
    let amplify = config
        .amplify
        .as_ref()
        .context("Amplify handlers require 'amplify' configuration")?;

    let objects = amplify
        .cleanup_artifacts
        .then(|| Arc::clone(&services.objects));

    Ok(BackendTeardown::new(
        Arc::clone(&services.amplify),
        Arc::clone(&services.stacks),
        objects,
        &amplify.app_id,
        &amplify.environment,
        &amplify.delete_role_arn,
    ))
}
