use deployhooks_core::{ProviderStatus, ResponseStatus, ServiceError, StatusClass};
use std::time::Duration;

/// Classification of how a lifecycle event ended.
///
/// Every handler branch ends in exactly one variant, and every variant maps
/// to exactly one callback status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,

    /// Request types with no work attached (`Update`, unknown)
    Ignored { request_type: String },

    // FAILED callbacks
    /// The polled operation ended in a failure status
    TerminalFailure { operation: String, status: String },
    /// The initiating call (start build, commit, webhook, delete stack) failed
    TriggerFailed { operation: String, message: String },
    /// A lookup or status query failed
    QueryFailed { operation: String, message: String },
    /// The wait budget ran out before a terminal status
    TimedOut {
        operation: String,
        waited: Duration,
        last_status: Option<String>,
    },
    /// The handler itself crashed
    Internal { message: String },
}

impl Outcome {
    /// Outcome of an operation that reached `status`.
    pub fn from_status<S: ProviderStatus>(operation: &str, status: &S) -> Self {
        match status.class() {
            StatusClass::Succeeded => Outcome::Succeeded,
            _ => Outcome::TerminalFailure {
                operation: operation.to_string(),
                status: status.to_string(),
            },
        }
    }

    pub fn trigger_failed(operation: &str, err: &ServiceError) -> Self {
        Outcome::TriggerFailed {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }

    pub fn query_failed(operation: &str, message: impl Into<String>) -> Self {
        Outcome::QueryFailed {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn timed_out<S: std::fmt::Display>(
        operation: &str,
        waited: Duration,
        last: Option<&S>,
    ) -> Self {
        Outcome::TimedOut {
            operation: operation.to_string(),
            waited,
            last_status: last.map(|s| s.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == ResponseStatus::Success
    }

    /// Callback status for this outcome
    pub fn status(&self) -> ResponseStatus {
        match self {
            Self::Succeeded | Self::Ignored { .. } => ResponseStatus::Success,
            Self::TerminalFailure { .. }
            | Self::TriggerFailed { .. }
            | Self::QueryFailed { .. }
            | Self::TimedOut { .. }
            | Self::Internal { .. } => ResponseStatus::Failed,
        }
    }

    /// Diagnostic reason for the callback; `None` keeps the default log-stream pointer.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Succeeded | Self::Ignored { .. } => None,
            Self::TerminalFailure { status, .. } => Some(status.clone()),
            Self::TriggerFailed { message, .. } | Self::QueryFailed { message, .. } => {
                Some(message.clone())
            }
            Self::TimedOut {
                operation,
                waited,
                last_status,
            } => Some(match last_status {
                Some(status) => format!(
                    "Timed out after {}s waiting for {} (last status {})",
                    waited.as_secs(),
                    operation,
                    status
                ),
                None => format!(
                    "Timed out after {}s waiting for {}",
                    waited.as_secs(),
                    operation
                ),
            }),
            Self::Internal { message } => Some(message.clone()),
        }
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Succeeded => "Succeeded",
            Self::Ignored { .. } => "Ignored",
            Self::TerminalFailure { .. } => "TerminalFailure",
            Self::TriggerFailed { .. } => "TriggerFailed",
            Self::QueryFailed { .. } => "QueryFailed",
            Self::TimedOut { .. } => "TimedOut",
            Self::Internal { .. } => "Internal",
        }
    }
}
