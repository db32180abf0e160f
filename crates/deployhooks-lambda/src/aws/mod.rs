// AWS SDK adapters for the service traits
//
// Each adapter wraps one SDK client and maps "resource is gone" errors to
// ServiceError::NotFound; everything else becomes ServiceError::Api with the
// full error chain.

mod amplify;
mod cloudformation;
mod codebuild;
mod s3;

pub use amplify::AmplifyAdapter;
pub use cloudformation::CloudFormationAdapter;
pub use codebuild::CodeBuildAdapter;
pub use s3::S3Adapter;

use aws_config::SdkConfig;
use aws_sdk_codebuild::error::DisplayErrorContext;
use deployhooks_core::ServiceError;

/// Every AWS adapter, built from one shared SDK configuration
pub struct AwsAdapters {
    pub codebuild: CodeBuildAdapter,
    pub cloudformation: CloudFormationAdapter,
    pub amplify: AmplifyAdapter,
    pub s3: S3Adapter,
}

impl AwsAdapters {
    pub fn from_config(config: &SdkConfig) -> Self {
        Self {
            codebuild: CodeBuildAdapter::new(aws_sdk_codebuild::Client::new(config)),
            cloudformation: CloudFormationAdapter::new(aws_sdk_cloudformation::Client::new(config)),
            amplify: AmplifyAdapter::new(aws_sdk_amplify::Client::new(config)),
            s3: S3Adapter::new(aws_sdk_s3::Client::new(config)),
        }
    }
}

/// Wrap an SDK error, keeping its source chain in the message.
pub(crate) fn api_error<E>(service: &'static str, err: &E) -> ServiceError
where
    E: std::error::Error,
{
    ServiceError::api(service, DisplayErrorContext(err).to_string())
}
