// S3: empty and delete the backend's deployment artifacts bucket

use super::api_error;
use async_trait::async_trait;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::operation::list_object_versions::ListObjectVersionsOutput;
use aws_sdk_s3::types::{Delete, Error as DeleteError, ObjectIdentifier};
use aws_sdk_s3::Client;
use deployhooks_core::{ObjectStore, Result, ServiceError};
use tracing::{info, warn};

const SERVICE: &str = "s3";

#[derive(Clone)]
pub struct S3Adapter {
    client: Client,
}

impl S3Adapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Delete every object version and delete marker in `bucket`, one listing page at a time.
    async fn empty_bucket(&self, bucket: &str) -> Result<usize> {
        let mut deleted = 0;
        let mut key_marker: Option<String> = None;
        let mut version_marker: Option<String> = None;

        loop {
            let response = self
                .client
                .list_object_versions()
                .bucket(bucket)
                .set_key_marker(key_marker.take())
                .set_version_id_marker(version_marker.take())
                .send()
                .await
                .map_err(|err| {
                    if is_missing_bucket(err.code()) {
                        ServiceError::not_found(SERVICE, bucket)
                    } else {
                        api_error(SERVICE, &err)
                    }
                })?;

            let objects = object_identifiers(&response)?;
            if !objects.is_empty() {
                deleted += self.delete_batch(bucket, objects).await?;
            }

            if response.is_truncated() == Some(true) {
                key_marker = response.next_key_marker().map(str::to_string);
                version_marker = response.next_version_id_marker().map(str::to_string);
            } else {
                break;
            }
        }

        Ok(deleted)
    }

    /// Delete one page of objects, returning how many were removed.
    async fn delete_batch(&self, bucket: &str, objects: Vec<ObjectIdentifier>) -> Result<usize> {
        let requested = objects.len();
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| ServiceError::api(SERVICE, e.to_string()))?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| api_error(SERVICE, &e))?;

        // Quiet mode only reports the keys that failed
        let failures = log_failures(bucket, output.errors());
        Ok(requested.saturating_sub(failures))
    }
}

#[async_trait]
impl ObjectStore for S3Adapter {
    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let objects = self.empty_bucket(bucket).await?;
        info!(bucket, objects, "Emptied bucket");

        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| {
                if is_missing_bucket(err.code()) {
                    ServiceError::not_found(SERVICE, bucket)
                } else {
                    api_error(SERVICE, &err)
                }
            })?;
        Ok(())
    }
}

/// Identifiers for every version and delete marker on one listing page.
fn object_identifiers(page: &ListObjectVersionsOutput) -> Result<Vec<ObjectIdentifier>> {
    let versions = page.versions().iter().map(|v| (v.key(), v.version_id()));
    let markers = page
        .delete_markers()
        .iter()
        .map(|m| (m.key(), m.version_id()));

    versions
        .chain(markers)
        .filter_map(|(key, version)| key.map(|key| (key, version)))
        .map(|(key, version)| {
            ObjectIdentifier::builder()
                .key(key)
                .set_version_id(version.map(str::to_string))
                .build()
                .map_err(|e| ServiceError::api(SERVICE, e.to_string()))
        })
        .collect()
}

fn log_failures(bucket: &str, failures: &[DeleteError]) -> usize {
    for failure in failures {
        warn!(
            bucket,
            key = failure.key().unwrap_or_default(),
            version_id = failure.version_id().unwrap_or_default(),
            code = failure.code().unwrap_or_default(),
            message = failure.message().unwrap_or_default(),
            "Failed to delete object"
        );
    }
    failures.len()
}

pub(crate) fn is_missing_bucket(code: Option<&str>) -> bool {
    code == Some("NoSuchBucket")
}
