// deployhooks-config - Configuration for the custom-resource handlers
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from DEPLOYHOOKS_CONFIG env var
// 3. Config file contents from DEPLOYHOOKS_CONFIG_CONTENT env var
// 4. Built-in defaults (lowest priority)
//
// Loaded once at cold start and passed by reference afterwards.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod env_overrides;
mod handler;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, MapEnvSource, ENV_PREFIX};
pub use handler::HandlerKind;

/// Main runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Explicit handler selection; inferred from the populated sections when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<HandlerKind>,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terraform: Option<TerraformConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplify: Option<AmplifyConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitConfig>,

    /// CloudWatch log stream of this function, used in default callback reasons
    #[serde(default)]
    pub log_stream_name: String,
}

/// Poll loop timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    pub precheck_delay_secs: u64,
    /// Upper bound on a single poll loop; `0` means bounded only by the invocation deadline
    pub max_wait_secs: u64,
    /// Time reserved before the invocation deadline for sending the callback
    pub deadline_margin_secs: u64,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn precheck_delay(&self) -> Duration {
        Duration::from_secs(self.precheck_delay_secs)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        (self.max_wait_secs > 0).then(|| Duration::from_secs(self.max_wait_secs))
    }

    pub fn deadline_margin(&self) -> Duration {
        Duration::from_secs(self.deadline_margin_secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            precheck_delay_secs: 10,
            max_wait_secs: 0,
            deadline_margin_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// CodeBuild projects that apply and destroy a Terraform stack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerraformConfig {
    pub deploy_project: String,
    pub destroy_project: String,
}

/// Amplify application whose backend environment is torn down on delete
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmplifyConfig {
    /// CodeBuild project that performs the Amplify deployment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_project: Option<String>,
    pub app_id: String,
    pub branch: String,
    pub environment: String,
    pub delete_role_arn: String,
    /// Delete the backend's deployment artifacts bucket after teardown
    #[serde(default = "default_cleanup_artifacts")]
    pub cleanup_artifacts: bool,
}

fn default_cleanup_artifacts() -> bool {
    true
}

/// Source repository that feeds the Amplify pipeline
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    pub owner: String,
    pub repository: String,
    /// Defaults to the Amplify branch when empty
    #[serde(default)]
    pub branch: String,
    #[serde(default, skip_serializing)]
    pub token: String,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    #[serde(default)]
    pub register_webhook: bool,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_commit_message() -> String {
    "Trigger Amplify deployment".to_string()
}

impl std::fmt::Debug for GitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitConfig")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repository", &self.repository)
            .field("branch", &self.branch)
            .field("token", &"<redacted>")
            .field("commit_message", &self.commit_message)
            .field("register_webhook", &self.register_webhook)
            .finish()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            handler: None,
            poll: PollConfig::default(),
            log: LogConfig::default(),
            terraform: None,
            amplify: None,
            git: None,
            log_stream_name: String::new(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration from a specific file path, then apply env overrides.
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Build a configuration from optional inline TOML plus overrides supplied
    /// by an `EnvSource`. Used by tests and by callers that manage their own env.
    pub fn load_with_env<E: EnvSource>(inline_config: Option<&str>, env: &E) -> Result<Self> {
        let mut config = RuntimeConfig::default();

        if let Some(inline) = inline_config {
            let file_config: RuntimeConfig = toml::from_str(inline)
                .map_err(|e| anyhow::anyhow!("Failed to parse inline config content: {}", e))?;
            config.merge(file_config);
        }

        config.apply_env_overrides_from(env)?;
        config.finalize()?;
        Ok(config)
    }

    /// Merge another config into this one (used for TOML layering).
    pub fn merge(&mut self, other: RuntimeConfig) {
        self.poll = other.poll;
        self.log = other.log;

        if other.handler.is_some() {
            self.handler = other.handler;
        }
        if other.terraform.is_some() {
            self.terraform = other.terraform;
        }
        if other.amplify.is_some() {
            self.amplify = other.amplify;
        }
        if other.git.is_some() {
            self.git = other.git;
        }
        if !other.log_stream_name.is_empty() {
            self.log_stream_name = other.log_stream_name;
        }
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// The handler this process runs; only valid after `finalize`.
    pub fn handler_kind(&self) -> Result<HandlerKind> {
        self.handler
            .or_else(|| HandlerKind::infer(self))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unable to determine which handler to run\n\n\
                    How to fix:\n\
                      • Environment: export {}HANDLER=terraform|amplify|amplify-git\n\
                      • Or set DESTROY_PROJECT, AMPLIFY_DEPLOY_PROJECT or REPOSITORY_NAME",
                    ENV_PREFIX
                )
            })
    }

    /// Resolve the handler kind, fill derived defaults and validate.
    pub fn finalize(&mut self) -> Result<()> {
        let kind = self.handler_kind()?;
        self.handler = Some(kind);

        if let (Some(git), Some(amplify)) = (self.git.as_mut(), self.amplify.as_ref()) {
            if git.branch.is_empty() {
                git.branch = amplify.branch.clone();
            }
        }

        self.validate()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
