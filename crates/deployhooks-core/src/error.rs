//! Error type shared by every external service adapter.

use thiserror::Error;

/// Failure of a call to an external collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The queried resource does not exist (or no longer exists)
    #[error("{service}: {resource} not found")]
    NotFound {
        service: &'static str,
        resource: String,
    },

    /// Any other API failure
    #[error("{service}: {message}")]
    Api {
        service: &'static str,
        message: String,
    },
}

impl ServiceError {
    pub fn not_found(service: &'static str, resource: impl Into<String>) -> Self {
        Self::NotFound {
            service,
            resource: resource.into(),
        }
    }

    pub fn api(service: &'static str, message: impl Into<String>) -> Self {
        Self::Api {
            service,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn service(&self) -> &'static str {
        match self {
            Self::NotFound { service, .. } | Self::Api { service, .. } => service,
        }
    }
}

/// Result type alias for ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ServiceError::not_found("cloudformation", "stack amplify-app-prod");
        assert_eq!(
            err.to_string(),
            "cloudformation: stack amplify-app-prod not found"
        );
        assert!(err.is_not_found());

        let err = ServiceError::api("codebuild", "AccessDeniedException");
        assert_eq!(err.to_string(), "codebuild: AccessDeniedException");
        assert!(!err.is_not_found());
        assert_eq!(err.service(), "codebuild");
    }
}
