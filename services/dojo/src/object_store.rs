use crate::config::ObjectStoreConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client as S3Client;
use aws_types::region::Region;
use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Logical buckets the service writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Videos,
    Thumbnails,
    Avatars,
}

/// Path and URL of a stored object
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoredObject {
    pub path: String,
    pub url: String,
}

/// Object store operations used by the orchestrators
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `data` at `path`. Without `upsert`, an existing object is an error.
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        data: Bytes,
        content_type: &str,
        upsert: bool,
    ) -> Result<String>;

    /// Public URL of an object
    fn public_url(&self, bucket: Bucket, path: &str) -> String;

    /// Time-limited URL granting read access to an object
    async fn signed_url(&self, bucket: Bucket, path: &str, expires_in: Duration) -> Result<String>;

    /// Remove objects
    async fn delete(&self, bucket: Bucket, paths: &[String]) -> Result<()>;
}

/// S3-backed object store
pub struct S3ObjectStore {
    client: S3Client,
    config: ObjectStoreConfig,
}

impl S3ObjectStore {
    /// Create a new S3 object store client
    pub async fn new(config: &ObjectStoreConfig) -> Result<Self> {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        // Configure custom endpoint for MinIO/LocalStack
        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        // Force path-style access for MinIO compatibility
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = S3Client::from_conf(s3_config_builder.build());

        info!(
            videos = %config.videos_bucket,
            region = %config.region,
            "S3 object store initialized"
        );

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Physical bucket name for a logical bucket
    pub fn bucket_name(&self, bucket: Bucket) -> &str {
        bucket_name(&self.config, bucket)
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false)
                {
                    Ok(false)
                } else {
                    Err(s3_error("Failed to check object existence", e))
                }
            }
        }
    }

    /// Simple single-part upload for small files
    async fn simple_upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control("max-age=3600")
            .send()
            .await
            .map_err(|e| s3_error("Failed to upload object", e))?;

        Ok(())
    }

    /// Multipart upload for large files
    async fn multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<()> {
        let create_response = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .cache_control("max-age=3600")
            .send()
            .await
            .map_err(|e| s3_error("Failed to create multipart upload", e))?;

        let upload_id = create_response
            .upload_id()
            .ok_or_else(|| Error::ObjectStore("No upload ID in response".to_string()))?;

        if let Err(e) = self.upload_parts(bucket, key, upload_id, data).await {
            // uploaded parts persist until the upload is aborted
            if let Err(abort) = self
                .client
                .abort_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .send()
                .await
            {
                warn!(
                    key = %key,
                    upload_id = %upload_id,
                    error = %DisplayErrorContext(abort),
                    "Failed to abort multipart upload"
                );
            }
            return Err(e);
        }

        Ok(())
    }

    /// Uploads every part of `data` and completes the upload
    async fn upload_parts(&self, bucket: &str, key: &str, upload_id: &str, data: Bytes) -> Result<()> {
        let mut completed_parts = Vec::new();
        let part_size = self.config.part_size_bytes;
        let mut offset = 0;
        let mut part_number = 1;

        while offset < data.len() {
            let end = (offset + part_size).min(data.len());
            let body = ByteStream::from(data.slice(offset..end));

            let upload_part_response = self
                .client
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(body)
                .send()
                .await
                .map_err(|e| s3_error("Failed to upload part", e))?;

            completed_parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .e_tag(upload_part_response.e_tag().unwrap_or_default())
                    .build(),
            );

            offset = end;
            part_number += 1;
        }

        let completed_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed_upload)
            .send()
            .await
            .map_err(|e| s3_error("Failed to complete multipart upload", e))?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self, data), fields(size_bytes = data.len()))]
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        data: Bytes,
        content_type: &str,
        upsert: bool,
    ) -> Result<String> {
        let bucket_name = self.bucket_name(bucket).to_string();

        if !upsert && self.exists(&bucket_name, path).await? {
            return Err(Error::ObjectStore(format!(
                "Object {} already exists in {}",
                path, bucket_name
            )));
        }

        if data.len() > self.config.multipart_threshold_bytes {
            self.multipart_upload(&bucket_name, path, data, content_type)
                .await?;
        } else {
            self.simple_upload(&bucket_name, path, data, content_type)
                .await?;
        }

        debug!(bucket = %bucket_name, path = %path, "Object uploaded");
        Ok(path.to_string())
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        public_object_url(&self.config, bucket, path)
    }

    #[instrument(skip(self))]
    async fn signed_url(&self, bucket: Bucket, path: &str, expires_in: Duration) -> Result<String> {
        let presigning_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| Error::ObjectStore(format!("Invalid presigning config: {}", e)))?;

        let presigned = self
            .client
            .get_object()
            .bucket(self.bucket_name(bucket))
            .key(path)
            .presigned(presigning_config)
            .await
            .map_err(|e| s3_error("Failed to generate video access URL", e))?;

        Ok(presigned.uri().to_string())
    }

    #[instrument(skip(self))]
    async fn delete(&self, bucket: Bucket, paths: &[String]) -> Result<()> {
        let bucket_name = self.bucket_name(bucket);

        for path in paths {
            self.client
                .delete_object()
                .bucket(bucket_name)
                .key(path)
                .send()
                .await
                .map_err(|e| s3_error("Failed to delete object", e))?;

            debug!(bucket = %bucket_name, path = %path, "Object deleted");
        }

        Ok(())
    }
}

fn s3_error<E>(context: &str, err: E) -> Error
where
    E: std::error::Error,
{
    Error::ObjectStore(format!("{}: {}", context, DisplayErrorContext(err)))
}

fn bucket_name(config: &ObjectStoreConfig, bucket: Bucket) -> &str {
    match bucket {
        Bucket::Videos => &config.videos_bucket,
        Bucket::Thumbnails => &config.thumbnails_bucket,
        Bucket::Avatars => &config.avatars_bucket,
    }
}

/// Public URL for an object: `{public_base_url}/{bucket}/{path}` when a base
/// is configured, otherwise the bucket's S3 (or custom endpoint) URL.
fn public_object_url(config: &ObjectStoreConfig, bucket: Bucket, path: &str) -> String {
    let bucket = bucket_name(config, bucket);

    if let Some(ref base) = config.public_base_url {
        return format!("{}/{}/{}", base.trim_end_matches('/'), bucket, path);
    }

    match config.endpoint_url {
        Some(ref endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, path),
        None => format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            bucket, config.region, path
        ),
    }
}

/// Content type for an upload, falling back to a generic binary type
pub fn content_type_or_default(content_type: &str) -> &str {
    if content_type.trim().is_empty() {
        "application/octet-stream"
    } else {
        content_type
    }
}
