// Configuration validation
//
// Validates that the selected handler has everything it needs and that
// poll timing values are sensible

use super::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_poll_config(&config.poll)?;

    match config.handler_kind()? {
        HandlerKind::Terraform => {
            let terraform = config.terraform.as_ref().ok_or_else(|| {
                anyhow::anyhow!("terraform handler requires 'terraform' configuration")
            })?;
            validate_terraform_config(terraform)?;
        }
        HandlerKind::Amplify => {
            let amplify = require_amplify(config, "amplify")?;
            validate_amplify_config(amplify)?;
            if amplify.deploy_project.as_deref().unwrap_or_default().is_empty() {
                bail!(missing("Amplify deploy project", "AMPLIFY_DEPLOY_PROJECT=amplify-deploy"));
            }
        }
        HandlerKind::AmplifyGit => {
            validate_amplify_config(require_amplify(config, "amplify-git")?)?;
            let git = config.git.as_ref().ok_or_else(|| {
                anyhow::anyhow!("amplify-git handler requires 'git' configuration")
            })?;
            validate_git_config(git)?;
        }
    }

    Ok(())
}

fn require_amplify<'a>(config: &'a RuntimeConfig, handler: &str) -> Result<&'a AmplifyConfig> {
    config
        .amplify
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("{} handler requires 'amplify' configuration", handler))
}

/// Lambda invocations cap out at 15 minutes
const MAX_INVOCATION_SECS: u64 = 900;

fn validate_poll_config(config: &PollConfig) -> Result<()> {
    if config.interval_secs == 0 {
        bail!("poll.interval_secs must be greater than 0");
    }

    for (name, value) in [
        ("interval_secs", config.interval_secs),
        ("precheck_delay_secs", config.precheck_delay_secs),
        ("max_wait_secs", config.max_wait_secs),
        ("deadline_margin_secs", config.deadline_margin_secs),
    ] {
        if value > MAX_INVOCATION_SECS {
            bail!(
                "poll.{} ({}) exceeds the {}s Lambda invocation limit",
                name,
                value,
                MAX_INVOCATION_SECS
            );
        }
    }

    if config.max_wait_secs > 0 && config.max_wait_secs < config.interval_secs {
        bail!(
            "poll.max_wait_secs ({}) must be at least poll.interval_secs ({})",
            config.max_wait_secs,
            config.interval_secs
        );
    }

    if config.interval_secs > 300 {
        warn!(
            interval_secs = config.interval_secs,
            "poll.interval_secs is very large; few status checks fit in one invocation"
        );
    }

    Ok(())
}

fn validate_terraform_config(config: &TerraformConfig) -> Result<()> {
    if config.deploy_project.is_empty() {
        bail!(missing("Terraform deploy project", "DEPLOY_PROJECT=tf-deploy"));
    }
    if config.destroy_project.is_empty() {
        bail!(missing("Terraform destroy project", "DESTROY_PROJECT=tf-destroy"));
    }
    Ok(())
}

fn validate_amplify_config(config: &AmplifyConfig) -> Result<()> {
    if config.app_id.is_empty() {
        bail!(missing("Amplify app id", "AMPLIFY_APP_ID=d1a2b3c4"));
    }
    if config.branch.is_empty() {
        bail!(missing("Amplify branch", "AMPLIFY_BRANCH=main"));
    }
    if config.environment.is_empty() {
        bail!(missing("Amplify backend environment", "AMPLIFY_ENV=prod"));
    }
    if !config.delete_role_arn.starts_with("arn:") {
        bail!(missing(
            "Deletion role ARN",
            "DELETE_ROLE_ARN=arn:aws:iam::123456789012:role/amplify-delete"
        ));
    }
    Ok(())
}

fn validate_git_config(config: &GitConfig) -> Result<()> {
    if config.owner.is_empty() {
        bail!(missing("Repository owner", "REPOSITORY_OWNER=acme"));
    }
    if config.repository.is_empty() {
        bail!(missing("Repository name", "REPOSITORY_NAME=webapp"));
    }
    if config.token.is_empty() {
        bail!(missing("Repository access token", "GITHUB_TOKEN=<token>"));
    }
    if !config.api_url.starts_with("http://") && !config.api_url.starts_with("https://") {
        bail!("git.api_url must be an http(s) URL, got '{}'", config.api_url);
    }
    Ok(())
}

fn missing(what: &str, example: &str) -> String {
    format!(
        "{} is required\n\n\
        How to fix:\n\
          • Environment: export {}",
        what, example
    )
}
