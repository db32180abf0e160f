// CloudFormation: delete the backend stack and watch it go

use super::api_error;
use async_trait::async_trait;
use aws_sdk_cloudformation::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_cloudformation::operation::describe_stacks::{DescribeStacksError, DescribeStacksOutput};
use aws_sdk_cloudformation::Client;
use deployhooks_core::{Result, ServiceError, StackManager, StackStatus};
use std::collections::HashMap;

const SERVICE: &str = "cloudformation";

#[derive(Clone)]
pub struct CloudFormationAdapter {
    client: Client,
}

impl CloudFormationAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn describe(&self, stack_name: &str) -> Result<DescribeStacksOutput> {
        self.client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|err| describe_error(stack_name, err))
    }
}

#[async_trait]
impl StackManager for CloudFormationAdapter {
    async fn delete_stack(&self, stack_name: &str, role_arn: &str) -> Result<()> {
        self.client
            .delete_stack()
            .stack_name(stack_name)
            .role_arn(role_arn)
            .send()
            .await
            .map_err(|e| api_error(SERVICE, &e))?;
        Ok(())
    }

    async fn stack_status(&self, stack_name: &str) -> Result<StackStatus> {
        let output = self.describe(stack_name).await?;
        let stack = output
            .stacks()
            .first()
            .ok_or_else(|| ServiceError::not_found(SERVICE, stack_name))?;

        Ok(stack
            .stack_status()
            .map(|s| StackStatus::from(s.as_str()))
            .unwrap_or(StackStatus::DeleteInProgress))
    }

    async fn stack_outputs(&self, stack_name: &str) -> Result<HashMap<String, String>> {
        let output = self.describe(stack_name).await?;
        let stack = output
            .stacks()
            .first()
            .ok_or_else(|| ServiceError::not_found(SERVICE, stack_name))?;

        let mut outputs = HashMap::new();
        for output in stack.outputs() {
            if let (Some(key), Some(value)) = (output.output_key(), output.output_value()) {
                outputs.insert(key.to_string(), value.to_string());
            }
        }
        Ok(outputs)
    }
}

fn describe_error(stack_name: &str, err: SdkError<DescribeStacksError>) -> ServiceError {
    if is_missing_stack(err.code(), err.message()) {
        ServiceError::not_found(SERVICE, stack_name)
    } else {
        api_error(SERVICE, &err)
    }
}

/// DescribeStacks reports an unknown stack as a generic validation error.
pub(crate) fn is_missing_stack(code: Option<&str>, message: Option<&str>) -> bool {
    code == Some("ValidationError") && message.is_some_and(|m| m.contains("does not exist"))
}
