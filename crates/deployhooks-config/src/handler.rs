use super::RuntimeConfig;
use serde::{Deserialize, Serialize};

/// Which custom-resource handler this function runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandlerKind {
    /// Terraform apply/destroy through CodeBuild
    Terraform,
    /// Amplify deployment through CodeBuild
    Amplify,
    /// Amplify deployment triggered by a commit to the source repository
    AmplifyGit,
}

impl HandlerKind {
    /// Infer the handler from the configuration sections that are populated.
    pub fn infer(config: &RuntimeConfig) -> Option<Self> {
        if config.terraform.is_some() {
            Some(HandlerKind::Terraform)
        } else if config.git.is_some() {
            Some(HandlerKind::AmplifyGit)
        } else if config.amplify.is_some() {
            Some(HandlerKind::Amplify)
        } else {
            None
        }
    }
}

impl std::fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerKind::Terraform => write!(f, "terraform"),
            HandlerKind::Amplify => write!(f, "amplify"),
            HandlerKind::AmplifyGit => write!(f, "amplify-git"),
        }
    }
}

impl std::str::FromStr for HandlerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "terraform" | "tf" => Ok(HandlerKind::Terraform),
            "amplify" | "amplify-codebuild" => Ok(HandlerKind::Amplify),
            "amplify-git" | "git" => Ok(HandlerKind::AmplifyGit),
            _ => anyhow::bail!(
                "Unsupported handler: {}. Supported: terraform, amplify, amplify-git",
                s
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AmplifyConfig, GitConfig, TerraformConfig};

    #[test]
    fn test_handler_from_str() {
        assert_eq!(
            "terraform".parse::<HandlerKind>().unwrap(),
            HandlerKind::Terraform
        );
        assert_eq!("TF".parse::<HandlerKind>().unwrap(), HandlerKind::Terraform);
        assert_eq!(
            "amplify".parse::<HandlerKind>().unwrap(),
            HandlerKind::Amplify
        );
        assert_eq!(
            "amplify-git".parse::<HandlerKind>().unwrap(),
            HandlerKind::AmplifyGit
        );
        assert!("lambda".parse::<HandlerKind>().is_err());
    }

    #[test]
    fn test_infer_prefers_terraform_then_git() {
        let mut config = RuntimeConfig::default();
        assert_eq!(HandlerKind::infer(&config), None);

        config.amplify = Some(AmplifyConfig::default());
        assert_eq!(HandlerKind::infer(&config), Some(HandlerKind::Amplify));

        config.git = Some(GitConfig::default());
        assert_eq!(HandlerKind::infer(&config), Some(HandlerKind::AmplifyGit));

        config.terraform = Some(TerraformConfig::default());
        assert_eq!(HandlerKind::infer(&config), Some(HandlerKind::Terraform));
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for kind in [
            HandlerKind::Terraform,
            HandlerKind::Amplify,
            HandlerKind::AmplifyGit,
        ] {
            assert_eq!(kind.to_string().parse::<HandlerKind>().unwrap(), kind);
        }
    }
}
