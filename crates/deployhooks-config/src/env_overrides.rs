use super::{
    AmplifyConfig, GitConfig, HandlerKind, LogFormat, RuntimeConfig, TerraformConfig,
};
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;

pub const ENV_PREFIX: &str = "DEPLOYHOOKS_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the DEPLOYHOOKS_ prefix.
    /// Used for the variables the stack templates set directly (DEPLOY_PROJECT, etc.)
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// In-memory `EnvSource`
#[derive(Debug, Clone, Default)]
pub struct MapEnvSource {
    vars: HashMap<String, String>,
}

impl MapEnvSource {
    /// Add a prefixed variable (`key` without the DEPLOYHOOKS_ prefix).
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.vars
            .insert(format!("{}{}", ENV_PREFIX, key), value.to_string());
        self
    }

    pub fn with_raw(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }
}

impl EnvSource for MapEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(&format!("{}{}", ENV_PREFIX, key)).cloned()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    if let Some(handler) = get_env_string(env, "HANDLER") {
        config.handler = Some(
            handler
                .parse::<HandlerKind>()
                .context("Invalid DEPLOYHOOKS_HANDLER value")?,
        );
    }

    // Poll timing
    if let Some(val) = get_env_u64(env, "POLL_INTERVAL_SECS")? {
        config.poll.interval_secs = val;
    }
    if let Some(val) = get_env_u64(env, "PRECHECK_DELAY_SECS")? {
        config.poll.precheck_delay_secs = val;
    }
    if let Some(val) = get_env_u64(env, "MAX_WAIT_SECS")? {
        config.poll.max_wait_secs = val;
    }
    if let Some(val) = get_env_u64(env, "DEADLINE_MARGIN_SECS")? {
        config.poll.deadline_margin_secs = val;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.log.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.log.format = match format.to_lowercase().as_str() {
            "text" => LogFormat::Text,
            _ => LogFormat::Json,
        };
    }

    // Terraform CodeBuild projects
    if let Some(project) = get_raw_env_string(env, "DEPLOY_PROJECT") {
        ensure_terraform(config).deploy_project = project;
    }
    if let Some(project) = get_raw_env_string(env, "DESTROY_PROJECT") {
        ensure_terraform(config).destroy_project = project;
    }

    // Amplify application
    if let Some(project) = get_raw_env_string(env, "AMPLIFY_DEPLOY_PROJECT") {
        ensure_amplify(config).deploy_project = Some(project);
    }
    if let Some(app_id) = get_raw_env_string(env, "AMPLIFY_APP_ID") {
        ensure_amplify(config).app_id = app_id;
    }
    if let Some(branch) = get_raw_env_string(env, "AMPLIFY_BRANCH") {
        ensure_amplify(config).branch = branch;
    }
    if let Some(environment) = get_raw_env_string(env, "AMPLIFY_ENV") {
        ensure_amplify(config).environment = environment;
    }
    if let Some(role_arn) = get_raw_env_string(env, "DELETE_ROLE_ARN") {
        ensure_amplify(config).delete_role_arn = role_arn;
    }
    if let Some(val) = get_env_bool(env, "CLEANUP_ARTIFACTS")? {
        ensure_amplify(config).cleanup_artifacts = val;
    }

    // Source repository
    if let Some(owner) = get_raw_env_string(env, "REPOSITORY_OWNER") {
        ensure_git(config).owner = owner;
    }
    if let Some(repository) = get_raw_env_string(env, "REPOSITORY_NAME") {
        ensure_git(config).repository = repository;
    }
    if let Some(branch) = get_raw_env_string(env, "REPOSITORY_BRANCH") {
        ensure_git(config).branch = branch;
    }
    if let Some(api_url) = get_raw_env_string(env, "GITHUB_API_URL") {
        ensure_git(config).api_url = api_url.trim_end_matches('/').to_string();
    }
    if let Some(message) = get_raw_env_string(env, "COMMIT_MESSAGE") {
        ensure_git(config).commit_message = message;
    }
    if let Some(val) = get_raw_env_bool(env, "REGISTER_WEBHOOK")? {
        ensure_git(config).register_webhook = val;
    }
    // The token alone does not select the git handler
    if let Some(token) = get_raw_env_string(env, "GITHUB_TOKEN") {
        if let Some(git) = config.git.as_mut() {
            git.token = token;
        }
    }

    if let Some(stream) = get_raw_env_string(env, "AWS_LAMBDA_LOG_STREAM_NAME") {
        config.log_stream_name = stream;
    }

    Ok(())
}

fn ensure_terraform(config: &mut RuntimeConfig) -> &mut TerraformConfig {
    config.terraform.get_or_insert_with(TerraformConfig::default)
}

fn ensure_amplify(config: &mut RuntimeConfig) -> &mut AmplifyConfig {
    config.amplify.get_or_insert_with(|| AmplifyConfig {
        cleanup_artifacts: true,
        ..AmplifyConfig::default()
    })
}

fn ensure_git(config: &mut RuntimeConfig) -> &mut GitConfig {
    config.git.get_or_insert_with(|| GitConfig {
        api_url: "https://api.github.com".to_string(),
        commit_message: "Trigger Amplify deployment".to_string(),
        ..GitConfig::default()
    })
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key).filter(|v| !v.is_empty())
}

fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get_raw(key).filter(|v| !v.is_empty())
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .parse::<u64>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    match get_env_string(env, key) {
        Some(val) => parse_bool(&val).map(Some).ok_or_else(|| {
            anyhow!("Failed to parse {}{} (expected bool): {}", ENV_PREFIX, key, val)
        }),
        None => Ok(None),
    }
}

fn get_raw_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    match get_raw_env_string(env, key) {
        Some(val) => parse_bool(&val)
            .map(Some)
            .ok_or_else(|| anyhow!("Failed to parse {} (expected bool): {}", key, val)),
        None => Ok(None),
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
