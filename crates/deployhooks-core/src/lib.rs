// deployhooks-core - Building blocks shared by the custom-resource handlers
//
// - poll: fixed-interval poll-until-terminal loop with an optional wait budget
// - status: provider status vocabularies (CodeBuild, CloudFormation, Amplify)
// - event/response: CloudFormation custom-resource request and callback
// - services: traits at every external seam

pub mod error;
pub mod event;
pub mod poll;
pub mod response;
pub mod services;
pub mod status;

pub use error::{Result, ServiceError};
pub use event::{LifecycleEvent, RequestType};
pub use poll::{PollOutcome, PollSettings, Poller, DEFAULT_INTERVAL, DEFAULT_PRECHECK_DELAY};
pub use response::{CustomResourceResponse, PendingResponse, ResponseStatus};
pub use services::{
    AmplifyBackend, BackendEnvironment, BuildRunner, CommitRef, JobSummary, ObjectStore,
    ResponseSender, SourceControl, StackManager,
};
pub use status::{BuildStatus, JobStatus, ProviderStatus, StackStatus, StatusClass};
