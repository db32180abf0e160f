//! Status vocabularies of the polled providers.
//!
//! Every provider status parses from its wire string (unknown strings are
//! preserved) and partitions into in-progress, success and failure.

use std::fmt;

/// Coarse classification of a provider status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    InProgress,
    Succeeded,
    Failed,
}

/// A status reported by an external system
pub trait ProviderStatus:
    'static + Clone + PartialEq + fmt::Debug + fmt::Display + Send + Sync
{
    /// Statuses after which polling continues
    const IN_PROGRESS: &'static [Self];

    fn is_success(&self) -> bool;

    fn class(&self) -> StatusClass {
        if Self::IN_PROGRESS.contains(self) {
            StatusClass::InProgress
        } else if self.is_success() {
            StatusClass::Succeeded
        } else {
            StatusClass::Failed
        }
    }
}

/// CodeBuild build status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    InProgress,
    Succeeded,
    Failed,
    Fault,
    TimedOut,
    Stopped,
    Other(String),
}

impl BuildStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Fault => "FAULT",
            Self::TimedOut => "TIMED_OUT",
            Self::Stopped => "STOPPED",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for BuildStatus {
    fn from(s: &str) -> Self {
        match s {
            "IN_PROGRESS" => Self::InProgress,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "FAULT" => Self::Fault,
            "TIMED_OUT" => Self::TimedOut,
            "STOPPED" => Self::Stopped,
            other => Self::Other(other.to_string()),
        }
    }
}

impl ProviderStatus for BuildStatus {
    const IN_PROGRESS: &'static [Self] = &[BuildStatus::InProgress];

    fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// CloudFormation stack status, as seen while waiting for a deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackStatus {
    CreateComplete,
    UpdateComplete,
    DeleteInProgress,
    DeleteComplete,
    DeleteFailed,
    Other(String),
}

impl StackStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateComplete => "CREATE_COMPLETE",
            Self::UpdateComplete => "UPDATE_COMPLETE",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteComplete => "DELETE_COMPLETE",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for StackStatus {
    fn from(s: &str) -> Self {
        match s {
            "CREATE_COMPLETE" => Self::CreateComplete,
            "UPDATE_COMPLETE" => Self::UpdateComplete,
            "DELETE_IN_PROGRESS" => Self::DeleteInProgress,
            "DELETE_COMPLETE" => Self::DeleteComplete,
            "DELETE_FAILED" => Self::DeleteFailed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl ProviderStatus for StackStatus {
    // A stack that still reports *_COMPLETE right after DeleteStack has not
    // transitioned yet.
    const IN_PROGRESS: &'static [Self] = &[
        StackStatus::DeleteInProgress,
        StackStatus::CreateComplete,
        StackStatus::UpdateComplete,
    ];

    fn is_success(&self) -> bool {
        matches!(self, Self::DeleteComplete)
    }
}

/// Amplify job status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Provisioning,
    Running,
    Succeed,
    Failed,
    Cancelling,
    Cancelled,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Provisioning => "PROVISIONING",
            Self::Running => "RUNNING",
            Self::Succeed => "SUCCEED",
            Self::Failed => "FAILED",
            Self::Cancelling => "CANCELLING",
            Self::Cancelled => "CANCELLED",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "PENDING" => Self::Pending,
            "PROVISIONING" => Self::Provisioning,
            "RUNNING" => Self::Running,
            "SUCCEED" => Self::Succeed,
            "FAILED" => Self::Failed,
            "CANCELLING" => Self::Cancelling,
            "CANCELLED" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }
}

impl ProviderStatus for JobStatus {
    const IN_PROGRESS: &'static [Self] = &[
        JobStatus::Pending,
        JobStatus::Provisioning,
        JobStatus::Running,
        JobStatus::Cancelling,
    ];

    fn is_success(&self) -> bool {
        matches!(self, Self::Succeed)
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

impl_display!(BuildStatus, StackStatus, JobStatus);
